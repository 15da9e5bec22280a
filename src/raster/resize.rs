use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use super::Resolution;

/// How the source aspect ratio is reconciled with the output grid.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeMode {
    /// Scale each axis independently to exactly the target.
    Stretch,
    /// Scale uniformly until the target is covered, then center-crop.
    #[default]
    Fill,
    /// Scale uniformly until the image fits, then letterbox with the background.
    Fit,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown resize mode '{0}', expected stretch, fill or fit")]
pub struct UnknownResizeMode(pub String);

impl FromStr for ResizeMode {
    type Err = UnknownResizeMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stretch" => Ok(ResizeMode::Stretch),
            "fill" => Ok(ResizeMode::Fill),
            "fit" => Ok(ResizeMode::Fit),
            _ => Err(UnknownResizeMode(s.to_string())),
        }
    }
}

/// Resampling used when scaling. Only affects pixel values, never the geometry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Linear,
    /// Box averaging.
    Area,
    #[default]
    Cubic,
    Lanczos,
}

impl Interpolation {
    /// Resamples `img` to `width` x `height`. Same-size requests are a plain copy.
    pub fn resample(&self, img: &RgbImage, width: u32, height: u32) -> RgbImage {
        if img.dimensions() == (width, height) {
            return img.clone();
        }
        let filter = match self {
            Interpolation::Area => return imageops::thumbnail(img, width, height),
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Linear => FilterType::Triangle,
            Interpolation::Cubic => FilterType::CatmullRom,
            Interpolation::Lanczos => FilterType::Lanczos3,
        };
        imageops::resize(img, width, height, filter)
    }
}

/// True when the source is at least as wide (relative to its height) as the target.
fn is_wider(width: u32, height: u32, target: Resolution) -> bool {
    width as u64 * target.rows as u64 >= target.cols as u64 * height as u64
}

/// `a * b / c` in integers, floored, never below 1.
fn scale_axis(a: u32, b: u32, c: u32) -> u32 {
    ((a as u64 * b as u64) / c as u64).clamp(1, u32::MAX as u64) as u32
}

fn letterbox(img: &RgbImage, target: Resolution, background: Rgb<u8>, x: u32, y: u32) -> RgbImage {
    let mut out = RgbImage::from_pixel(target.cols, target.rows, background);
    imageops::replace(&mut out, img, x as i64, y as i64);
    out
}

/// Produces an image of exactly `target` size from `img`.
///
/// Odd leftovers from cropping or padding go to the trailing (right/bottom) side.
/// `img` must not be empty.
pub fn resize_filter(
    img: &RgbImage,
    target: Resolution,
    background: Rgb<u8>,
    mode: ResizeMode,
    interpolation: Interpolation,
) -> RgbImage {
    let (width, height) = img.dimensions();
    debug!(width, height, rows = target.rows, cols = target.cols, ?mode, "Resizing");
    match mode {
        ResizeMode::Stretch => interpolation.resample(img, target.cols, target.rows),
        ResizeMode::Fill => {
            if is_wider(width, height, target) {
                let new_width = scale_axis(target.rows, width, height).max(target.cols);
                let scaled = interpolation.resample(img, new_width, target.rows);
                let x = (new_width - target.cols) / 2;
                imageops::crop_imm(&scaled, x, 0, target.cols, target.rows).to_image()
            } else {
                let new_height = scale_axis(target.cols, height, width).max(target.rows);
                let scaled = interpolation.resample(img, target.cols, new_height);
                let y = (new_height - target.rows) / 2;
                imageops::crop_imm(&scaled, 0, y, target.cols, target.rows).to_image()
            }
        }
        ResizeMode::Fit => {
            if is_wider(width, height, target) {
                let new_height = scale_axis(target.cols, height, width).min(target.rows);
                let scaled = interpolation.resample(img, target.cols, new_height);
                letterbox(&scaled, target, background, 0, (target.rows - new_height) / 2)
            } else {
                let new_width = scale_axis(target.rows, width, height).min(target.cols);
                let scaled = interpolation.resample(img, new_width, target.rows);
                letterbox(&scaled, target, background, (target.cols - new_width) / 2, 0)
            }
        }
    }
}
