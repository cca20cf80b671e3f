use crate::state::ViewState;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;
const BUTTON_ZOOM_STEP: f32 = 1.2;
const WHEEL_ZOOM_STEP: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Where and how to paint the displayed raster inside the viewport.
pub struct DrawCommand {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub alpha: f32,
}

/// Centre a `raster_size` image scaled by `view.zoom` in `viewport`, shifted
/// by the pan offset.
pub fn draw_geometry(
    raster_size: (u32, u32),
    viewport: (f32, f32),
    view: &ViewState,
) -> DrawCommand {
    let width = raster_size.0 as f32 * view.zoom;
    let height = raster_size.1 as f32 * view.zoom;
    DrawCommand {
        x: (viewport.0 - width) / 2.0 + view.pan.0,
        y: (viewport.1 - height) / 2.0 + view.pan.1,
        width,
        height,
        alpha: view.opacity.clamp(0.0, 1.0),
    }
}

impl ViewState {
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * BUTTON_ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / BUTTON_ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Mouse wheel zoom. Positive `notches` scroll away from the user and zoom in.
    pub fn wheel_zoom(&mut self, notches: f32) {
        if notches > 0.0 {
            self.zoom = (self.zoom * WHEEL_ZOOM_STEP).min(MAX_ZOOM);
        } else if notches < 0.0 {
            self.zoom = (self.zoom / WHEEL_ZOOM_STEP).max(MIN_ZOOM);
        }
    }

    /// Zoom slider value, 10-500 %.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn set_zoom_percent(&mut self, percent: u32) {
        self.zoom = (percent as f32 / 100.0).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pan = (0.0, 0.0);
    }
}

#[derive(Debug, Default)]
/// Tracks a drag-to-pan gesture between pointer events.
pub struct PanGesture {
    last: Option<(f32, f32)>,
}

impl PanGesture {
    pub fn begin(&mut self, pos: (f32, f32)) {
        self.last = Some(pos);
    }

    /// Move the pan offset by the distance travelled since the previous event.
    pub fn drag_to(&mut self, pos: (f32, f32), view: &mut ViewState) {
        let Some(last) = self.last else { return };
        view.pan.0 += pos.0 - last.0;
        view.pan.1 += pos.1 - last.1;
        self.last = Some(pos);
    }

    pub fn end(&mut self) {
        self.last = None;
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn geometry_centres_image_in_viewport() {
        let cmd = draw_geometry((200, 100), (800.0, 600.0), &ViewState::default());
        assert_eq!(
            cmd,
            DrawCommand {
                x: 300.0,
                y: 250.0,
                width: 200.0,
                height: 100.0,
                alpha: 1.0
            }
        );
    }

    #[test]
    fn geometry_applies_zoom_pan_and_opacity() {
        let view = ViewState {
            zoom: 2.0,
            pan: (15.0, -20.0),
            opacity: 0.3,
        };
        let cmd = draw_geometry((200, 100), (800.0, 600.0), &view);
        assert_eq!(cmd.width, 400.0);
        assert_eq!(cmd.height, 200.0);
        assert_eq!(cmd.x, 215.0);
        assert_eq!(cmd.y, 180.0);
        assert_eq!(cmd.alpha, 0.3);
    }

    #[test]
    fn oversized_image_gets_negative_origin() {
        let cmd = draw_geometry((1000, 1000), (500.0, 500.0), &ViewState::default());
        assert_eq!((cmd.x, cmd.y), (-250.0, -250.0));
    }

    #[test]
    fn zoom_in_clamps_at_maximum() {
        let mut view = ViewState {
            zoom: 4.9,
            ..ViewState::default()
        };
        view.zoom_in();
        assert_eq!(view.zoom, MAX_ZOOM);
    }

    #[test]
    fn zoom_out_clamps_at_minimum() {
        let mut view = ViewState {
            zoom: 0.11,
            ..ViewState::default()
        };
        view.zoom_out();
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn button_and_wheel_steps_differ() {
        let mut view = ViewState::default();
        view.zoom_in();
        assert!(approx(view.zoom, 1.2));

        let mut view = ViewState::default();
        view.wheel_zoom(1.0);
        assert!(approx(view.zoom, 1.1));
        view.wheel_zoom(-1.0);
        assert!(approx(view.zoom, 1.0));
        view.wheel_zoom(0.0);
        assert!(approx(view.zoom, 1.0));
    }

    #[test]
    fn zoom_slider_percent_round_trips_and_clamps() {
        let mut view = ViewState::default();
        view.set_zoom_percent(250);
        assert_eq!(view.zoom_percent(), 250);
        view.set_zoom_percent(900);
        assert_eq!(view.zoom, MAX_ZOOM);
        view.set_zoom_percent(0);
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn reset_zoom_also_clears_pan() {
        let mut view = ViewState {
            zoom: 3.0,
            pan: (40.0, 12.0),
            opacity: 0.5,
        };
        view.reset_zoom();
        assert_eq!(view.zoom, 1.0);
        assert_eq!(view.pan, (0.0, 0.0));
        assert_eq!(view.opacity, 0.5);
    }

    #[test]
    fn pan_gesture_accumulates_successive_deltas() {
        let mut view = ViewState::default();
        let mut gesture = PanGesture::default();

        gesture.drag_to((50.0, 50.0), &mut view);
        assert_eq!(view.pan, (0.0, 0.0), "no movement before the gesture starts");

        gesture.begin((10.0, 10.0));
        gesture.drag_to((15.0, 7.0), &mut view);
        gesture.drag_to((25.0, 9.0), &mut view);
        assert_eq!(view.pan, (15.0, -1.0));

        gesture.end();
        assert!(!gesture.is_active());
        gesture.drag_to((100.0, 100.0), &mut view);
        assert_eq!(view.pan, (15.0, -1.0));
    }
}
