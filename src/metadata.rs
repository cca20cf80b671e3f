use std::path::Path;

use crate::catalog::CatalogEntry;

#[derive(Debug, Default, Clone)]
/// Facts shown in the info panel for the current image.
pub struct ImageInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
    pub camera: Option<String>,
    pub date_taken: Option<String>,
}

#[derive(Debug, Default)]
struct Exif {
    make: Option<String>,
    model: Option<String>,
    date_taken: Option<String>,
}

/// Collects info for `entry`. File size and EXIF are only available for
/// local files and are left empty when they cannot be read.
pub fn describe(entry: &CatalogEntry) -> ImageInfo {
    let mut info = ImageInfo {
        name: entry.display_name().to_string(),
        width: entry.raster.width(),
        height: entry.raster.height(),
        ..Default::default()
    };
    let Some(path) = entry.local_path() else {
        return info;
    };
    info.file_size = std::fs::metadata(path).ok().map(|m| m.len());
    if let Ok(exif) = read_exif(path) {
        info.camera = camera_label(exif.make, exif.model);
        info.date_taken = exif.date_taken;
    }
    info
}

fn read_exif(path: &Path) -> anyhow::Result<Exif> {
    let file = std::fs::File::open(path)?;
    let mut bufreader = std::io::BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader)?;

    let field = |tag| {
        exif.get_field(tag, exif::In::PRIMARY)
            .map(|f| f.display_value().to_string().trim_matches('"').trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(Exif {
        make: field(exif::Tag::Make),
        model: field(exif::Tag::Model),
        date_taken: field(exif::Tag::DateTimeOriginal).or_else(|| field(exif::Tag::DateTime)),
    })
}

fn camera_label(make: Option<String>, model: Option<String>) -> Option<String> {
    match (make, model) {
        (Some(make), Some(model)) if model.starts_with(&make) => Some(model),
        (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
        (Some(make), None) => Some(make),
        (None, Some(model)) => Some(model),
        (None, None) => None,
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageFormat};

    use super::*;

    #[test]
    fn file_sizes_use_binary_units() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn camera_label_avoids_repeating_make() {
        let s = |v: &str| Some(v.to_string());
        assert_eq!(camera_label(s("Canon"), s("Canon EOS R5")), s("Canon EOS R5"));
        assert_eq!(camera_label(s("FUJIFILM"), s("X-T5")), s("FUJIFILM X-T5"));
        assert_eq!(camera_label(None, None), None);
    }

    #[test]
    fn local_file_reports_size_without_exif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        let raster = DynamicImage::new_rgba8(7, 5);
        raster.save_with_format(&path, ImageFormat::Png).unwrap();

        let entry = CatalogEntry {
            source: path.to_string_lossy().into_owned(),
            raster,
        };
        let info = describe(&entry);
        assert_eq!(info.name, "plain.png");
        assert_eq!((info.width, info.height), (7, 5));
        assert!(info.file_size.unwrap() > 0);
        assert!(info.camera.is_none());
    }

    #[test]
    fn url_entry_has_no_file_facts() {
        let entry = CatalogEntry {
            source: "https://example.com/pic.jpg".to_string(),
            raster: DynamicImage::new_rgba8(3, 3),
        };
        let info = describe(&entry);
        assert_eq!(info.name, "pic.jpg");
        assert!(info.file_size.is_none());
    }
}
