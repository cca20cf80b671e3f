use std::path::PathBuf;

use thiserror::Error;

/// Failure while turning a file or URL into a catalog entry.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Bytes were read but are not a supported image.
    #[error("could not decode {source_name}: {reason}")]
    Decode {
        source_name: String,
        #[source]
        reason: image::ImageError,
    },

    #[error("could not read {}: {reason}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        reason: std::io::Error,
    },

    /// Network or URL failure.
    #[error("could not fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no URL given")]
    EmptyUrl,

    #[error("no images found in {request}")]
    NoImages { request: String },

    /// The worker thread panicked before producing a result.
    #[error("loading {request} failed unexpectedly: {message}")]
    Panicked { request: String, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CropError {
    #[error(
        "crop rectangle {x},{y} {width}x{height} lies outside the {image_width}x{image_height} image"
    )]
    InvalidBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },

    #[error("expected crop as x,y,width,height but got {0:?}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum WallpaperError {
    #[error("could not encode wallpaper image: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The platform wallpaper call itself failed.
    #[error("could not set wallpaper: {0}")]
    Platform(String),
}
