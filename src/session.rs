use std::time::Instant;

use tracing::{debug, info};

use crate::catalog::{CatalogEntry, Raster};
use crate::error::{CropError, LoadError};
use crate::loader::{LoadMode, LoadOutcome};
use crate::slideshow::{Fade, Sequencer};
use crate::state::{EditState, TransitionKind, ViewState};
use crate::transform::{self, CropRect};

/// A discrete user intent. Keys, buttons and sliders all map onto these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Previous,
    Next,
    TogglePlay,
    ToggleFullscreen,
    Quit,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    WheelZoom(f32),
    SetZoomPercent(u32),
    SetInterval(u32),
    SetTransition(TransitionKind),
    Rotate,
    FlipHorizontal,
    FlipVertical,
    Crop(CropRect),
    Reset,
}

/// What the shell has to do after a command, beyond repainting.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Handled,
    ToggleFullscreen,
    Quit,
    Rejected(CropError),
}

/// All mutable viewer state, owned by the UI thread.
pub struct Session {
    catalog: Vec<CatalogEntry>,
    index: usize,
    edit: EditState,
    view: ViewState,
    displayed: Option<Raster>,
    cropped: bool,
    sequencer: Sequencer,
    fade: Option<Fade>,
    /// Bumped whenever `displayed` is replaced.
    revision: u64,
    /// Bumped whenever a different image (or catalog) is shown.
    shown: u64,
}

impl Session {
    pub fn new(interval_seconds: u32, transition: TransitionKind) -> Self {
        Self {
            catalog: Vec::new(),
            index: 0,
            edit: EditState::default(),
            view: ViewState::default(),
            displayed: None,
            cropped: false,
            sequencer: Sequencer::new(interval_seconds, transition),
            fade: None,
            revision: 0,
            shown: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn current(&self) -> Option<&CatalogEntry> {
        self.catalog.get(self.index)
    }

    pub fn edit(&self) -> &EditState {
        &self.edit
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn displayed(&self) -> Option<&Raster> {
        self.displayed.as_ref()
    }

    pub fn is_cropped(&self) -> bool {
        self.cropped
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// Swap in a freshly loaded catalog and show its first image. An empty
    /// catalog leaves the current one in place and returns `false`.
    pub fn replace_catalog(&mut self, entries: Vec<CatalogEntry>, now: Instant) -> bool {
        if entries.is_empty() {
            return false;
        }
        info!(images = entries.len(), "catalog replaced");
        self.catalog = entries;
        self.index = 0;
        self.show_current(now);
        true
    }

    /// Add dropped images after the existing ones and restart from the first
    /// image. An empty drop changes nothing and returns `false`.
    pub fn append_catalog(&mut self, entries: Vec<CatalogEntry>, now: Instant) -> bool {
        if entries.is_empty() {
            return false;
        }
        info!(added = entries.len(), "catalog extended");
        self.catalog.extend(entries);
        self.index = 0;
        self.show_current(now);
        true
    }

    /// Fold a finished background load into the session. On any error the
    /// catalog, index and displayed image are left as they were.
    pub fn apply_load(&mut self, outcome: LoadOutcome, now: Instant) -> Result<(), LoadError> {
        let (request, mode, entries) = match outcome {
            LoadOutcome::Loaded {
                request,
                mode,
                entries,
            } => (request, mode, entries),
            LoadOutcome::Failed(err) => return Err(err),
        };
        let applied = match mode {
            LoadMode::Replace => self.replace_catalog(entries, now),
            LoadMode::Append => self.append_catalog(entries, now),
        };
        if applied {
            Ok(())
        } else {
            Err(LoadError::NoImages { request })
        }
    }

    /// `Image 3 of 12 - beach.jpg`, or a hint when nothing is loaded.
    pub fn status_line(&self) -> String {
        match self.current() {
            Some(entry) => format!(
                "Image {} of {} - {}",
                self.index + 1,
                self.catalog.len(),
                entry.display_name()
            ),
            None => "Ready - Load images to start".to_string(),
        }
    }

    pub fn apply(&mut self, command: Command, now: Instant) -> Outcome {
        match command {
            Command::Previous => self.step(-1, now),
            Command::Next => self.step(1, now),
            Command::TogglePlay => self.sequencer.toggle(now, self.catalog.len()),
            Command::ToggleFullscreen => return Outcome::ToggleFullscreen,
            Command::Quit => return Outcome::Quit,
            Command::ZoomIn => self.view.zoom_in(),
            Command::ZoomOut => self.view.zoom_out(),
            Command::ResetZoom => self.view.reset_zoom(),
            Command::WheelZoom(notches) => self.view.wheel_zoom(notches),
            Command::SetZoomPercent(percent) => self.view.set_zoom_percent(percent),
            Command::SetInterval(seconds) => self.sequencer.set_interval(seconds, now),
            Command::SetTransition(kind) => self.sequencer.set_transition(kind),
            Command::Rotate => {
                self.edit.rotation = self.edit.rotation.clockwise();
                self.rederive();
            }
            Command::FlipHorizontal => {
                self.edit.flip_horizontal = !self.edit.flip_horizontal;
                self.rederive();
            }
            Command::FlipVertical => {
                self.edit.flip_vertical = !self.edit.flip_vertical;
                self.rederive();
            }
            Command::Crop(rect) => {
                if let Err(err) = self.crop(rect) {
                    return Outcome::Rejected(err);
                }
            }
            Command::Reset => {
                self.reset_edits();
                self.rederive();
            }
        }
        Outcome::Handled
    }

    /// Advance timers: slideshow ticks and the fade animation.
    pub fn tick(&mut self, now: Instant) {
        if self.sequencer.poll(now) {
            debug!("slideshow tick");
            self.step(1, now);
        }
        if let Some(fade) = self.fade {
            if fade.poll(now, &mut self.view) {
                self.fade = None;
            }
        }
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        let fade = self.fade.map(|f| f.next_step(now));
        match (fade, self.sequencer.next_tick()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn step(&mut self, delta: isize, now: Instant) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        self.index = (self.index as isize + delta).rem_euclid(len as isize) as usize;
        self.show_current(now);
    }

    fn show_current(&mut self, now: Instant) {
        self.shown += 1;
        self.reset_edits();
        self.rederive();
        self.fade = Fade::start(self.sequencer.state().transition, now, &mut self.view);
    }

    fn reset_edits(&mut self) {
        self.edit = EditState::default();
        let opacity = self.view.opacity;
        self.view = ViewState {
            opacity,
            ..ViewState::default()
        };
    }

    fn rederive(&mut self) {
        self.displayed = self
            .current()
            .map(|entry| transform::apply_edits(&entry.raster, &self.edit));
        self.cropped = false;
        self.revision += 1;
    }

    fn crop(&mut self, rect: CropRect) -> Result<(), CropError> {
        let Some(entry) = self.current() else {
            return Ok(());
        };
        let cropped = transform::crop(&entry.raster, rect)?;
        self.displayed = Some(cropped);
        self.cropped = true;
        self.revision += 1;
        Ok(())
    }
}
