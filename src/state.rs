use serde::Deserialize;

pub const MIN_INTERVAL_SECS: u32 = 1;
pub const MAX_INTERVAL_SECS: u32 = 30;
pub const DEFAULT_INTERVAL_SECS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Orthogonal rotation applied to the displayed image, clockwise.
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Normalizes any multiple of 90 (including negatives) into a rotation.
    /// Angles that are not a multiple of 90 are rounded down to one.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Rotation::Quarter,
            2 => Rotation::Half,
            3 => Rotation::ThreeQuarter,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    /// Next rotation after turning a further 90° clockwise.
    pub fn clockwise(self) -> Self {
        Self::from_degrees(self.degrees() + 90)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// The single active rotate/flip transform for the displayed image.
pub struct EditState {
    pub rotation: Rotation,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl EditState {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// On-screen placement of the displayed image.
pub struct ViewState {
    pub zoom: f32,
    pub pan: (f32, f32),
    pub opacity: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: (0.0, 0.0),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Effect played when the displayed image changes.
pub enum TransitionKind {
    #[default]
    Fade,
    SlideLeft,
    SlideRight,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 3] = [
        TransitionKind::Fade,
        TransitionKind::SlideLeft,
        TransitionKind::SlideRight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransitionKind::Fade => "Fade",
            TransitionKind::SlideLeft => "Slide Left",
            TransitionKind::SlideRight => "Slide Right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideshowState {
    pub playing: bool,
    pub interval_seconds: u32,
    pub transition: TransitionKind,
}

impl Default for SlideshowState {
    fn default() -> Self {
        Self {
            playing: false,
            interval_seconds: DEFAULT_INTERVAL_SECS,
            transition: TransitionKind::Fade,
        }
    }
}

pub fn clamp_interval(seconds: u32) -> u32 {
    seconds.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_after_four_quarter_turns() {
        let mut r = Rotation::None;
        for expected in [90, 180, 270, 0] {
            r = r.clockwise();
            assert_eq!(r.degrees(), expected);
        }
    }

    #[test]
    fn rotation_normalizes_negative_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Rotation::ThreeQuarter);
        assert_eq!(Rotation::from_degrees(450), Rotation::Quarter);
    }

    #[test]
    fn interval_is_clamped_to_slider_range() {
        assert_eq!(clamp_interval(0), 1);
        assert_eq!(clamp_interval(45), 30);
        assert_eq!(clamp_interval(10), 10);
    }
}
