use image::imageops;
use image::{Rgb, RgbImage};
use tracing::debug;

use crate::plotter::PenRegistry;

/// Floyd-Steinberg error diffusion as (x offset, y offset, numerator, denominator).
//[ ...  *   7/16
//  3/16 5/16 1/16 ]
pub const FLOYD_STEINBERG: [(i64, i64, i32, i32); 4] =
    [(1, 0, 7, 16), (-1, 1, 3, 16), (0, 1, 5, 16), (1, 1, 1, 16)];

/// Reduces an image to the background colour plus one colour per pen.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantizer {
    /// Candidate colours in tie-break order: background first, then the pens.
    palette: Vec<Rgb<u8>>,
    dithering: bool,
}

fn distance_2(a: &Rgb<u8>, b: &Rgb<u8>) -> i32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&a, &b)| {
            let d = a as i32 - b as i32;
            d * d
        })
        .sum()
}

impl Quantizer {
    pub fn new(background: Rgb<u8>, pens: &PenRegistry) -> Quantizer {
        let mut palette = vec![background];
        palette.extend(pens.iter().map(|pen| pen.palette));
        Quantizer {
            palette,
            dithering: false,
        }
    }

    pub fn with_dithering(self, dithering: bool) -> Self {
        Self { dithering, ..self }
    }

    pub fn background(&self) -> Rgb<u8> {
        self.palette[0]
    }

    /// The palette entry closest to `pixel`. The first of several equally
    /// close entries wins.
    pub fn nearest(&self, pixel: &Rgb<u8>) -> Rgb<u8> {
        let mut best = self.palette[0];
        let mut best_distance = distance_2(&best, pixel);
        for candidate in self.palette.iter().skip(1) {
            let distance = distance_2(candidate, pixel);
            if distance < best_distance {
                best_distance = distance;
                best = *candidate;
            }
        }
        best
    }

    /// Quantizes `img` in raster order. Every pixel of the result is exactly
    /// one palette colour.
    ///
    /// With dithering on, each pixel's quantization error is pushed into its
    /// unvisited neighbours. The working canvas carries a one pixel border of
    /// background on the left, right and bottom so edge pixels have somewhere
    /// to send it; the border is dropped afterwards.
    pub fn quantize(&self, img: &RgbImage) -> RgbImage {
        let (width, height) = img.dimensions();
        debug!(width, height, dithering = self.dithering, "Quantizing");
        let mut canvas = RgbImage::from_pixel(width + 2, height + 1, self.background());
        imageops::replace(&mut canvas, img, 1, 0);

        for y in 0..height {
            for x in 1..=width {
                let original = *canvas.get_pixel(x, y);
                let chosen = self.nearest(&original);
                if self.dithering {
                    diffuse(&mut canvas, x, y, &original, &chosen);
                }
                canvas.put_pixel(x, y, chosen);
            }
        }

        imageops::crop_imm(&canvas, 1, 0, width, height).to_image()
    }
}

/// Spreads `original - chosen` over the forward neighbours of (x, y). Values
/// are truncated toward zero and clamped to the channel range after each add.
fn diffuse(canvas: &mut RgbImage, x: u32, y: u32, original: &Rgb<u8>, chosen: &Rgb<u8>) {
    for (xofs, yofs, num, denom) in FLOYD_STEINBERG {
        let xx = (x as i64 + xofs) as u32;
        let yy = (y as i64 + yofs) as u32;
        let target = canvas.get_pixel_mut(xx, yy);
        for c in 0..3 {
            let q_err = original.0[c] as i32 - chosen.0[c] as i32;
            let value = target.0[c] as i32;
            target.0[c] = ((value * denom + q_err * num) / denom).clamp(0, 255) as u8;
        }
    }
}
