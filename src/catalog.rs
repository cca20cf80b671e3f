use std::io::Read;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::LoadError;

/// Decoded bitmap held in memory.
pub type Raster = DynamicImage;

static IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// A loaded image and where it came from (filesystem path or URL).
pub struct CatalogEntry {
    pub source: String,
    pub raster: Raster,
}

impl CatalogEntry {
    /// Last path segment of the source, for status lines and window titles.
    pub fn display_name(&self) -> &str {
        let trimmed = self.source.trim_end_matches(['/', '\\']);
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(trimmed)
    }

    /// Local file backing this entry, `None` for URL sources.
    pub fn local_path(&self) -> Option<&Path> {
        if is_url(&self.source) {
            None
        } else {
            Some(Path::new(&self.source))
        }
    }
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Returns `true` if the path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    IMAGE_EXTS.iter().any(|known| ext.eq_ignore_ascii_case(known))
}

/// Decode an in-memory image, guessing the format from its content.
pub fn decode(bytes: &[u8], source_name: &str) -> Result<Raster, LoadError> {
    image::load_from_memory(bytes).map_err(|reason| LoadError::Decode {
        source_name: source_name.to_string(),
        reason,
    })
}

fn load_file(path: &Path) -> Result<CatalogEntry, LoadError> {
    let bytes = std::fs::read(path).map_err(|reason| LoadError::Io {
        path: path.to_path_buf(),
        reason,
    })?;
    let source = path.to_string_lossy().into_owned();
    let raster = decode(&bytes, &source)?;
    Ok(CatalogEntry { source, raster })
}

fn sort_case_insensitive(entries: &mut [CatalogEntry]) {
    entries.sort_by_cached_key(|e| e.source.to_lowercase());
}

fn candidate_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        // Links to files count; links to directories are not descended.
        .filter(|e| e.file_type().is_file() || (e.path_is_symlink() && e.path().is_file()))
        .map(|e| e.into_path())
        .filter(|p| is_supported_image(p))
        .collect()
}

/// Recursively load every supported image under `root`, sorted by path
/// ignoring case. Files that fail to decode are logged and left out.
pub fn build_from_folder(root: &Path) -> Vec<CatalogEntry> {
    let candidates = candidate_files(root);
    debug!(root = %root.display(), candidates = candidates.len(), "folder walk complete");

    let mut entries: Vec<CatalogEntry> = candidates
        .par_iter()
        .filter_map(|path| match load_file(path) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping image");
                None
            }
        })
        .collect();
    sort_case_insensitive(&mut entries);

    info!(
        root = %root.display(),
        loaded = entries.len(),
        skipped = candidates.len() - entries.len(),
        "folder loaded"
    );
    entries
}

/// Fetch a single image over HTTP(S).
pub fn build_from_url(url: &str) -> Result<CatalogEntry, LoadError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(LoadError::EmptyUrl);
    }
    let fetch_err = |reason: String| LoadError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = ureq::get(url).call().map_err(|e| fetch_err(e.to_string()))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| fetch_err(e.to_string()))?;

    let raster = decode(&bytes, url)?;
    info!(url, width = raster.width(), height = raster.height(), "url loaded");
    Ok(CatalogEntry {
        source: url.to_string(),
        raster,
    })
}

/// Load a dropped set of paths. Directories are expanded (and sorted
/// internally); loose files keep the order they were given in.
pub fn build_from_file_list(paths: &[PathBuf]) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();
    for path in paths {
        if path.is_dir() {
            entries.extend(build_from_folder(path));
        } else if is_supported_image(path) {
            match load_file(path) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping image"),
            }
        } else {
            debug!(path = %path.display(), "ignoring dropped file with unsupported extension");
        }
    }
    entries
}
