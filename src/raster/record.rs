use image::RgbImage;
use tracing::debug;

use crate::plotter::{grid_point, PenPlan, PenRegistry};

/// Sorts the pixels of a quantized image into one plan per pen.
///
/// Pixels are scanned in raster order and compared for exact equality against
/// each pen's palette colour; the first matching pen claims the pixel. Pixels
/// matching no pen (the background) are dropped. The returned plans are
/// index-aligned with `pens`.
pub fn record(img: &RgbImage, pens: &PenRegistry) -> Vec<PenPlan> {
    let mut plans = vec![PenPlan::new(); pens.len()];
    for (x, y, pixel) in img.enumerate_pixels() {
        if let Some(i) = pens.iter().position(|pen| pen.palette == *pixel) {
            plans[i].pixels.push(grid_point(y, x));
        }
    }
    for (pen, plan) in pens.iter().zip(plans.iter()) {
        debug!(pen = %pen.label, pixels = plan.len(), "Recorded pixels");
    }
    plans
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plotter::Pen;
    use image::Rgb;
    use nalgebra::Vector3;

    fn pen(hex: &str) -> Pen {
        Pen::new(hex, hex, Vector3::zeros(), &Vector3::zeros()).unwrap()
    }

    #[test]
    fn test_record_by_pen_in_raster_order() {
        let pens = PenRegistry::new(vec![pen("#000000"), pen("#FF0000")]);
        let mut img = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        img.put_pixel(2, 0, Rgb([0, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 1, Rgb([255, 0, 0]));
        let plans = record(&img, &pens);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].pixels, vec![grid_point(0, 2), grid_point(1, 0)]);
        assert_eq!(plans[1].pixels, vec![grid_point(1, 1)]);
    }

    #[test]
    fn test_first_matching_pen_wins() {
        let pens = PenRegistry::new(vec![pen("#00FF00"), pen("#00FF00")]);
        let img = RgbImage::from_pixel(2, 2, Rgb([0, 255, 0]));
        let plans = record(&img, &pens);
        assert_eq!(plans[0].len(), 4);
        assert!(plans[1].is_empty());
    }

    #[test]
    fn test_near_misses_are_dropped() {
        let pens = PenRegistry::new(vec![pen("#000000")]);
        let img = RgbImage::from_pixel(2, 2, Rgb([0, 0, 1]));
        assert!(record(&img, &pens)[0].is_empty());
    }
}
