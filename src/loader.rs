use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
#[cfg(test)]
use std::time::Duration;

use tracing::{debug, error, info};

use crate::catalog::{self, CatalogEntry};
use crate::error::LoadError;

#[derive(Debug, Clone)]
pub enum LoadRequest {
    Folder(PathBuf),
    Url(String),
    /// Drag-and-drop: files and folders in drop order.
    Files(Vec<PathBuf>),
}

/// How a finished load combines with the catalog already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Replace,
    Append,
}

impl LoadRequest {
    pub fn mode(&self) -> LoadMode {
        match self {
            LoadRequest::Files(_) => LoadMode::Append,
            LoadRequest::Folder(_) | LoadRequest::Url(_) => LoadMode::Replace,
        }
    }

    fn describe(&self) -> String {
        match self {
            LoadRequest::Folder(path) => path.display().to_string(),
            LoadRequest::Url(url) => url.trim().to_string(),
            LoadRequest::Files(paths) => format!("{} dropped item(s)", paths.len()),
        }
    }
}

pub enum LoadOutcome {
    Loaded {
        request: String,
        mode: LoadMode,
        entries: Vec<CatalogEntry>,
    },
    Failed(LoadError),
}

struct LoadMessage {
    generation: u64,
    outcome: LoadOutcome,
}

/// Cancels a running load. Cancelled loads never reach the session.
#[derive(Clone)]
pub struct LoadHandle {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl LoadHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Runs catalog loads on worker threads; results are drained on the UI thread.
pub struct Loader {
    tx: mpsc::Sender<LoadMessage>,
    rx: mpsc::Receiver<LoadMessage>,
    generation: u64,
    active: Option<LoadHandle>,
}

impl Loader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            generation: 0,
            active: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_cancelled())
    }

    /// Start `request` in the background, superseding any load in flight.
    /// `notify` runs on the worker once the result is queued.
    pub fn start<F>(&mut self, request: LoadRequest, notify: F) -> LoadHandle
    where
        F: Fn() + Send + 'static,
    {
        if let Some(previous) = self.active.take() {
            debug!(generation = previous.generation, "superseding load in flight");
            previous.cancel();
        }
        self.generation += 1;
        let handle = LoadHandle {
            generation: self.generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.active = Some(handle.clone());

        let tx = self.tx.clone();
        let worker_handle = handle.clone();
        std::thread::spawn(move || {
            let outcome = run_guarded(request.describe(), move || run(request));
            if worker_handle.is_cancelled() {
                debug!(generation = worker_handle.generation, "dropping cancelled load");
                return;
            }
            let _ = tx.send(LoadMessage {
                generation: worker_handle.generation,
                outcome,
            });
            notify();
        });
        handle
    }

    /// Return the outcome of the current load if it has finished. Results of
    /// superseded or cancelled loads are discarded.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let mut latest = None;
        while let Ok(msg) = self.rx.try_recv() {
            if let Some(outcome) = self.accept(msg) {
                latest = Some(outcome);
            }
        }
        latest
    }

    fn accept(&mut self, msg: LoadMessage) -> Option<LoadOutcome> {
        let current = self
            .active
            .as_ref()
            .filter(|h| h.generation == msg.generation && !h.is_cancelled());
        if current.is_none() {
            debug!(generation = msg.generation, "discarding stale load result");
            return None;
        }
        self.active = None;
        Some(msg.outcome)
    }

    #[cfg(test)]
    fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        let deadline = std::time::Instant::now() + timeout;
        while let Some(left) = deadline.checked_duration_since(std::time::Instant::now()) {
            match self.rx.recv_timeout(left) {
                Ok(msg) => {
                    if let Some(outcome) = self.accept(msg) {
                        return Some(outcome);
                    }
                }
                Err(_) => return None,
            }
        }
        None
    }
}

/// Turns a panic inside `job` (or its rayon pool) into a failed load, so the
/// UI never waits on a result that will not arrive.
fn run_guarded<F>(description: String, job: F) -> LoadOutcome
where
    F: FnOnce() -> LoadOutcome,
{
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(request = %description, %message, "load worker panicked");
            LoadOutcome::Failed(LoadError::Panicked {
                request: description,
                message,
            })
        }
    }
}

fn run(request: LoadRequest) -> LoadOutcome {
    let description = request.describe();
    let mode = request.mode();
    let result = match request {
        LoadRequest::Folder(root) => Ok(catalog::build_from_folder(&root)),
        LoadRequest::Url(url) => catalog::build_from_url(&url).map(|entry| vec![entry]),
        LoadRequest::Files(paths) => Ok(catalog::build_from_file_list(&paths)),
    };
    match result {
        Ok(entries) => {
            info!(request = %description, images = entries.len(), "load finished");
            LoadOutcome::Loaded {
                request: description,
                mode,
                entries,
            }
        }
        Err(err) => LoadOutcome::Failed(err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use image::{DynamicImage, ImageFormat, RgbaImage};

    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    fn folder_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            DynamicImage::ImageRgba8(RgbaImage::new(2, 2))
                .save_with_format(dir.path().join(name), ImageFormat::Png)
                .unwrap();
        }
        dir
    }

    fn loaded_names(outcome: LoadOutcome) -> Vec<String> {
        match outcome {
            LoadOutcome::Loaded { entries, .. } => entries
                .iter()
                .map(|e| e.display_name().to_string())
                .collect(),
            LoadOutcome::Failed(err) => panic!("load failed: {err}"),
        }
    }

    #[test]
    fn folder_load_completes_and_notifies() {
        let dir = folder_with(&["a.png", "b.png"]);
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();

        let mut loader = Loader::new();
        loader.start(LoadRequest::Folder(dir.path().to_path_buf()), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(loader.is_loading());

        let outcome = loader.wait(WAIT).expect("load should finish");
        assert_eq!(loaded_names(outcome), ["a.png", "b.png"]);
        assert!(!loader.is_loading());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn newer_load_wins_over_older_one() {
        let first = folder_with(&["first.png"]);
        let second = folder_with(&["second.png"]);

        let mut loader = Loader::new();
        let old = loader.start(LoadRequest::Folder(first.path().to_path_buf()), || {});
        let new = loader.start(LoadRequest::Folder(second.path().to_path_buf()), || {});
        assert!(old.is_cancelled());
        assert!(new.generation() > old.generation());

        let outcome = loader.wait(WAIT).expect("newest load should finish");
        assert_eq!(loaded_names(outcome), ["second.png"]);
    }

    #[test]
    fn cancelled_load_is_never_delivered() {
        let dir = folder_with(&["a.png"]);
        let mut loader = Loader::new();
        let handle = loader.start(LoadRequest::Folder(dir.path().to_path_buf()), || {});
        handle.cancel();
        assert!(!loader.is_loading());
        assert!(loader.wait(Duration::from_millis(500)).is_none());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn dropped_files_append_while_folders_replace() {
        let dir = folder_with(&["drop.png"]);
        let mut loader = Loader::new();
        loader.start(LoadRequest::Files(vec![dir.path().join("drop.png")]), || {});
        match loader.wait(WAIT) {
            Some(LoadOutcome::Loaded { mode, entries, .. }) => {
                assert_eq!(mode, LoadMode::Append);
                assert_eq!(entries.len(), 1);
            }
            _ => panic!("expected the dropped file to load"),
        }
        assert_eq!(
            LoadRequest::Folder(dir.path().to_path_buf()).mode(),
            LoadMode::Replace
        );
        assert_eq!(LoadRequest::Url("x".to_string()).mode(), LoadMode::Replace);
    }

    #[test]
    fn panicking_job_becomes_a_failed_load() {
        let outcome = run_guarded("broken.png".to_string(), || panic!("decoder blew up"));
        match outcome {
            LoadOutcome::Failed(LoadError::Panicked { request, message }) => {
                assert_eq!(request, "broken.png");
                assert_eq!(message, "decoder blew up");
            }
            _ => panic!("expected a panicked load"),
        }
    }

    #[test]
    fn url_failure_is_reported() {
        let mut loader = Loader::new();
        loader.start(LoadRequest::Url("  ".to_string()), || {});
        match loader.wait(WAIT) {
            Some(LoadOutcome::Failed(LoadError::EmptyUrl)) => {}
            _ => panic!("expected an empty URL failure"),
        }
    }
}
