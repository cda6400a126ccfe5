//! Brightness of sky-camera stills.
//!
//! Each image is cropped to the bounding box of its non-black pixels (the
//! fisheye circle) and the mean luma of what remains is reported as a
//! percentage.

pub mod error;

use image::{ImageReader, RgbImage, imageops};
use log::{debug, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub use error::AnalyzeError;

/// Channel sum at or below which a pixel counts as background.
pub const DEFAULT_THRESHOLD: u16 = 5;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// Crops `image` to the smallest rectangle containing every pixel whose
/// `R + G + B` exceeds `threshold`. Returns `None` when there is no such pixel.
pub fn crop_to_content(image: &RgbImage, threshold: u16) -> Option<RgbImage> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        if u16::from(r) + u16::from(g) + u16::from(b) <= threshold {
            continue;
        }

        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let (x0, y0, x1, y1) = bounds?;
    Some(imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image())
}

/// Mean 8-bit luma of `image` scaled to 0-100.
///
/// Luma uses the ITU-R 601 weights with rounding to the nearest integer per
/// pixel. An empty image has brightness 0.
pub fn brightness_percent(image: &RgbImage) -> f64 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }

    let total: u64 = image.pixels().map(|p| u64::from(luma(p.0))).sum();
    total as f64 / count as f64 / 255.0 * 100.0
}

fn luma([r, g, b]: [u8; 3]) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471;
    ((weighted + 0x8000) >> 16) as u8
}

/// Decodes `path`, crops it and returns its brightness percentage.
pub fn analyze_file(path: &Path, threshold: u16) -> Result<f64, AnalyzeError> {
    let decoded = ImageReader::open(path)
        .map_err(|source| AnalyzeError::Decode {
            path: path.to_path_buf(),
            source: source.into(),
        })?
        .with_guessed_format()
        .map_err(|source| AnalyzeError::Decode {
            path: path.to_path_buf(),
            source: source.into(),
        })?
        .decode()
        .map_err(|source| AnalyzeError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let rgb = decoded.to_rgb8();
    let cropped = crop_to_content(&rgb, threshold).ok_or_else(|| AnalyzeError::Blank {
        path: path.to_path_buf(),
        threshold,
    })?;

    debug!(
        "{}: cropped {}x{} to {}x{}",
        path.display(),
        rgb.width(),
        rgb.height(),
        cropped.width(),
        cropped.height()
    );

    Ok(brightness_percent(&cropped))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Brightness of every image file directly inside `dir`, sorted by file name.
///
/// Files that fail to decode or are entirely black are logged and left out.
pub fn analyze_directory(dir: &Path, threshold: u16) -> Result<Vec<(PathBuf, f64)>, AnalyzeError> {
    let io_error = |source| AnalyzeError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && is_image(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        match analyze_file(&path, threshold) {
            Ok(brightness) => results.push((path, brightness)),
            Err(e) => warn!("Skipping {e}"),
        }
    }

    Ok(results)
}
