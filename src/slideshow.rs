use std::time::{Duration, Instant};

use crate::state::{SlideshowState, TransitionKind, ViewState, clamp_interval};

pub const FADE_TICK: Duration = Duration::from_millis(20);
const FADE_STEPS: u32 = 10;

/// Periodic slideshow timer. Polled from the UI thread once per frame.
pub struct Sequencer {
    state: SlideshowState,
    next_tick: Option<Instant>,
}

impl Sequencer {
    pub fn new(interval_seconds: u32, transition: TransitionKind) -> Self {
        Self {
            state: SlideshowState {
                playing: false,
                interval_seconds: clamp_interval(interval_seconds),
                transition,
            },
            next_tick: None,
        }
    }

    pub fn state(&self) -> &SlideshowState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.state.interval_seconds as u64)
    }

    /// Start or stop playback. Starting needs at least one image.
    pub fn toggle(&mut self, now: Instant, catalog_len: usize) {
        if self.state.playing {
            self.stop();
        } else if catalog_len > 0 {
            self.state.playing = true;
            self.next_tick = Some(now + self.interval());
        }
    }

    pub fn stop(&mut self) {
        self.state.playing = false;
        self.next_tick = None;
    }

    /// Takes effect immediately: while playing, the timer restarts with the
    /// new period.
    pub fn set_interval(&mut self, seconds: u32, now: Instant) {
        self.state.interval_seconds = clamp_interval(seconds);
        if self.state.playing {
            self.next_tick = Some(now + self.interval());
        }
    }

    pub fn set_transition(&mut self, transition: TransitionKind) {
        self.state.transition = transition;
    }

    /// Returns `true` when the slideshow should advance. Missed ticks are
    /// coalesced into one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(due) if self.state.playing && now >= due => {
                self.next_tick = Some(now + self.interval());
                true
            }
            _ => false,
        }
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }
}

#[derive(Debug, Clone, Copy)]
/// Opacity ramp played after the displayed image changes.
pub struct Fade {
    started: Instant,
}

impl Fade {
    /// Begin the transition for `kind`. Slides snap into place immediately and
    /// return `None`; a fade starts fully transparent and must be polled.
    pub fn start(kind: TransitionKind, now: Instant, view: &mut ViewState) -> Option<Fade> {
        match kind {
            TransitionKind::Fade => {
                view.opacity = 0.0;
                Some(Fade { started: now })
            }
            TransitionKind::SlideLeft | TransitionKind::SlideRight => {
                view.pan = (0.0, 0.0);
                view.opacity = 1.0;
                None
            }
        }
    }

    /// Steps opacity up by 0.1 per elapsed 20 ms tick. Returns `true` once
    /// opacity has reached 1.0.
    pub fn poll(&self, now: Instant, view: &mut ViewState) -> bool {
        let elapsed = now.saturating_duration_since(self.started);
        let steps = (elapsed.as_millis() / FADE_TICK.as_millis()).min(FADE_STEPS as u128) as u32;
        view.opacity = (steps as f32 / FADE_STEPS as f32).min(1.0);
        steps >= FADE_STEPS
    }

    /// When the next opacity step is due.
    pub fn next_step(&self, now: Instant) -> Instant {
        let elapsed = now.saturating_duration_since(self.started);
        let done = (elapsed.as_millis() / FADE_TICK.as_millis()) as u32;
        self.started + FADE_TICK * (done + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn toggle_needs_images() {
        let now = Instant::now();
        let mut seq = Sequencer::new(3, TransitionKind::Fade);
        seq.toggle(now, 0);
        assert!(!seq.is_playing());
        assert_eq!(seq.next_tick(), None);

        seq.toggle(now, 2);
        assert!(seq.is_playing());
        assert_eq!(seq.next_tick(), Some(now + secs(3)));
    }

    #[test]
    fn ticks_on_interval_and_rearms() {
        let t0 = Instant::now();
        let mut seq = Sequencer::new(3, TransitionKind::Fade);
        seq.toggle(t0, 5);

        assert!(!seq.poll(t0 + Duration::from_millis(2999)));
        assert!(seq.poll(t0 + secs(3)));
        assert!(!seq.poll(t0 + secs(4)));
        assert!(seq.poll(t0 + secs(6)));
    }

    #[test]
    fn late_poll_fires_once() {
        let t0 = Instant::now();
        let mut seq = Sequencer::new(1, TransitionKind::Fade);
        seq.toggle(t0, 5);
        assert!(seq.poll(t0 + secs(10)));
        assert!(!seq.poll(t0 + secs(10)));
        assert_eq!(seq.next_tick(), Some(t0 + secs(11)));
    }

    #[test]
    fn interval_change_while_playing_restarts_timer() {
        let t0 = Instant::now();
        let mut seq = Sequencer::new(3, TransitionKind::Fade);
        seq.toggle(t0, 3);

        let changed_at = t0 + secs(2);
        seq.set_interval(10, changed_at);
        assert!(seq.is_playing());
        assert_eq!(seq.state().interval_seconds, 10);

        assert!(!seq.poll(t0 + secs(3)), "old 3s deadline must not fire");
        assert!(!seq.poll(changed_at + Duration::from_millis(9999)));
        assert!(seq.poll(changed_at + secs(10)));
    }

    #[test]
    fn interval_change_while_stopped_does_not_arm_timer() {
        let t0 = Instant::now();
        let mut seq = Sequencer::new(3, TransitionKind::Fade);
        seq.set_interval(50, t0);
        assert_eq!(seq.state().interval_seconds, 30);
        assert_eq!(seq.next_tick(), None);
        assert!(!seq.poll(t0 + secs(100)));
    }

    #[test]
    fn stopping_cancels_pending_tick() {
        let t0 = Instant::now();
        let mut seq = Sequencer::new(3, TransitionKind::Fade);
        seq.toggle(t0, 3);
        seq.toggle(t0 + secs(1), 3);
        assert!(!seq.is_playing());
        assert!(!seq.poll(t0 + secs(5)));
    }

    #[test]
    fn fade_ramps_in_tenths_every_twenty_millis() {
        let t0 = Instant::now();
        let mut view = ViewState::default();
        let fade = Fade::start(TransitionKind::Fade, t0, &mut view).expect("fade animates");
        assert_eq!(view.opacity, 0.0);

        assert!(!fade.poll(t0 + Duration::from_millis(19), &mut view));
        assert_eq!(view.opacity, 0.0);
        assert!(!fade.poll(t0 + Duration::from_millis(60), &mut view));
        assert!((view.opacity - 0.3).abs() < 1e-6);
        assert_eq!(fade.next_step(t0 + Duration::from_millis(60)), t0 + Duration::from_millis(80));

        assert!(fade.poll(t0 + Duration::from_millis(200), &mut view));
        assert_eq!(view.opacity, 1.0);
        assert!(fade.poll(t0 + secs(5), &mut view));
        assert_eq!(view.opacity, 1.0);
    }

    #[test]
    fn slide_transitions_snap_without_animation() {
        let t0 = Instant::now();
        for kind in [TransitionKind::SlideLeft, TransitionKind::SlideRight] {
            let mut view = ViewState {
                zoom: 2.0,
                pan: (30.0, 40.0),
                opacity: 0.2,
            };
            assert!(Fade::start(kind, t0, &mut view).is_none());
            assert_eq!(view.pan, (0.0, 0.0));
            assert_eq!(view.opacity, 1.0);
            assert_eq!(view.zoom, 2.0);
        }
    }
}
