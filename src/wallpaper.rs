use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::info;

use crate::catalog::Raster;
use crate::error::WallpaperError;

#[derive(Debug, PartialEq, Eq)]
pub enum WallpaperOutcome {
    Applied(PathBuf),
    /// No wallpaper backend on this platform; the image was still saved.
    Unsupported { saved_to: PathBuf },
}

/// Write `raster` to a new temporary PNG that outlives the process.
pub fn export_png(raster: &Raster) -> Result<PathBuf, WallpaperError> {
    let file = tempfile::Builder::new()
        .prefix("wallpaper")
        .suffix(".png")
        .tempfile()?;
    raster.save_with_format(file.path(), ImageFormat::Png)?;
    let (_, path) = file.keep().map_err(|e| WallpaperError::Io(e.error))?;
    info!(path = %path.display(), "wallpaper image exported");
    Ok(path)
}

/// Export the displayed image and make it the desktop background.
pub fn set_wallpaper(raster: &Raster) -> Result<WallpaperOutcome, WallpaperError> {
    let path = export_png(raster)?;
    apply(&path)
}

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
fn apply(path: &Path) -> Result<WallpaperOutcome, WallpaperError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| WallpaperError::Platform(format!("non UTF-8 path {}", path.display())))?;
    wallpaper::set_from_path(path_str).map_err(|e| WallpaperError::Platform(e.to_string()))?;
    info!(path = %path.display(), "wallpaper set");
    Ok(WallpaperOutcome::Applied(path.to_path_buf()))
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn apply(path: &Path) -> Result<WallpaperOutcome, WallpaperError> {
    Ok(WallpaperOutcome::Unsupported {
        saved_to: path.to_path_buf(),
    })
}
