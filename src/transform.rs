use std::str::FromStr;

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::catalog::Raster;
use crate::error::CropError;
use crate::state::EditState;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Apply the active rotate/flip state to `source`.
/// Order: rotate → flip. `source` is never modified.
pub fn apply_edits(source: &Raster, edit: &EditState) -> Raster {
    let mut out = source.clone();

    let degrees = edit.rotation.degrees();
    if degrees != 0 {
        out = rotate_expanded(&out, degrees as f64);
    }

    if edit.flip_horizontal || edit.flip_vertical {
        out = mirror(out, edit.flip_horizontal, edit.flip_vertical);
    }

    out
}

/// Size of the canvas that holds a `width`x`height` image rotated by
/// `degrees` without clipping.
pub fn rotated_canvas_size(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let theta = degrees.to_radians();
    // Trig noise at quarter turns (cos 90° ≈ 6e-17) must not push the
    // result across an integer boundary.
    let snap = |v: f64| if v.abs() < 1e-9 { 0.0 } else { v.abs() };
    let sin = snap(theta.sin());
    let cos = snap(theta.cos());
    let w = width as f64;
    let h = height as f64;
    let new_w = (w * cos + h * sin + 1e-9).floor();
    let new_h = (h * cos + w * sin + 1e-9).floor();
    (new_w as u32, new_h as u32)
}

/// Rotate clockwise about the image centre onto a canvas large enough for the
/// whole result, with the content centred and the uncovered area transparent.
pub fn rotate_expanded(img: &Raster, degrees: f64) -> Raster {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let (new_w, new_h) = rotated_canvas_size(w, h, degrees);
    if new_w == 0 || new_h == 0 {
        return DynamicImage::ImageRgba8(RgbaImage::new(new_w, new_h));
    }

    // Pixel centres sit on integer coordinates.
    let (cx, cy) = ((w as f32 - 1.0) / 2.0, (h as f32 - 1.0) / 2.0);
    let (ncx, ncy) = ((new_w as f32 - 1.0) / 2.0, (new_h as f32 - 1.0) / 2.0);
    let projection = Projection::translate(ncx, ncy)
        * Projection::rotate((degrees as f32).to_radians())
        * Projection::translate(-cx, -cy);

    // Quarter turns map every output pixel onto a source pixel centre, where
    // bilinear and nearest agree; imageproc's bilinear sampler would also
    // treat the last row and column as out of bounds.
    let interpolation = if degrees.rem_euclid(90.0) == 0.0 {
        Interpolation::Nearest
    } else {
        Interpolation::Bilinear
    };

    let mut out = RgbaImage::from_pixel(new_w, new_h, TRANSPARENT);
    warp_into(&rgba, &projection, interpolation, TRANSPARENT, &mut out);
    DynamicImage::ImageRgba8(out)
}

/// Mirror horizontally and/or vertically in a single pass.
fn mirror(img: Raster, horizontal: bool, vertical: bool) -> Raster {
    match (horizontal, vertical) {
        (true, true) => img.rotate180(),
        (true, false) => img.fliph(),
        (false, true) => img.flipv(),
        (false, false) => img,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A crop rectangle in source pixel coordinates, as typed by the user.
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl FromStr for CropRect {
    type Err = CropError;

    /// Parses `x,y,width,height`, whitespace around each number allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, width, height] = parts.as_slice() else {
            return Err(CropError::Parse(s.to_string()));
        };
        let num = |v: &str| v.parse::<i64>().map_err(|_| CropError::Parse(s.to_string()));
        Ok(Self {
            x: num(x)?,
            y: num(y)?,
            width: num(width)?,
            height: num(height)?,
        })
    }
}

/// Cut `rect` out of `source` into a new raster.
pub fn crop(source: &Raster, rect: CropRect) -> Result<Raster, CropError> {
    let (img_w, img_h) = (source.width() as i64, source.height() as i64);
    let CropRect {
        x,
        y,
        width,
        height,
    } = rect;
    let in_bounds = x >= 0
        && y >= 0
        && width > 0
        && height > 0
        && x + width <= img_w
        && y + height <= img_h;
    if !in_bounds {
        return Err(CropError::InvalidBounds {
            x,
            y,
            width,
            height,
            image_width: source.width(),
            image_height: source.height(),
        });
    }
    Ok(source.crop_imm(x as u32, y as u32, width as u32, height as u32))
}
