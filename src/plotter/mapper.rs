use nalgebra::{Vector2, Vector3};

use super::{GridPoint, PenPlan};
use crate::raster::Resolution;

/// Turns pixel grid positions into millimetres on the canvas and then into
/// machine coordinates.
///
/// A single pixel pitch is used for both axes: the canvas height over the
/// number of rows. Columns map to machine X, rows to machine Y, and the
/// canvas-relative Z is always zero so the origin's Z becomes the contact height.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapper {
    pixel_size: f64,
    origin: Vector3<f64>,
}

impl CoordinateMapper {
    /// `canvas_size` is (y, x) in millimetres.
    pub fn new(canvas_size: &Vector2<f64>, resolution: Resolution, origin: Vector3<f64>) -> Self {
        CoordinateMapper {
            pixel_size: canvas_size[0] / resolution.rows as f64,
            origin,
        }
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn to_canvas(&self, point: &GridPoint) -> Vector3<f64> {
        Vector3::new(point.x as f64, point.y as f64, 0.) * self.pixel_size
    }

    pub fn to_machine(&self, point: &GridPoint) -> Vector3<f64> {
        self.to_canvas(point) + self.origin
    }

    /// Fills both derived lists of the plan, keeping the pixel order.
    pub fn map(&self, plan: &mut PenPlan) {
        plan.canvas = plan.pixels.iter().map(|p| self.to_canvas(p)).collect();
        plan.machine = plan.canvas.iter().map(|c| c + self.origin).collect();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plotter::grid_point;

    #[test]
    fn test_axes_swap_and_offset() {
        let mapper = CoordinateMapper::new(
            &Vector2::new(100., 100.),
            Resolution::new(50, 50),
            Vector3::new(0., 50., 10.),
        );
        assert_eq!(mapper.pixel_size(), 2.);
        let p = grid_point(3, 7);
        assert_eq!(mapper.to_canvas(&p), Vector3::new(14., 6., 0.));
        assert_eq!(mapper.to_machine(&p), Vector3::new(14., 56., 10.));
    }

    #[test]
    fn test_pitch_follows_first_axis() {
        let mapper = CoordinateMapper::new(
            &Vector2::new(40., 1000.),
            Resolution::new(20, 10),
            Vector3::zeros(),
        );
        assert_eq!(mapper.to_canvas(&grid_point(1, 1)), Vector3::new(2., 2., 0.));
    }

    #[test]
    fn test_map_keeps_order_and_length() {
        let mapper = CoordinateMapper::new(
            &Vector2::new(10., 10.),
            Resolution::new(10, 10),
            Vector3::new(1., 1., 1.),
        );
        let mut plan = PenPlan::new();
        plan.pixels = vec![grid_point(0, 0), grid_point(5, 2), grid_point(1, 9)];
        mapper.map(&mut plan);
        assert_eq!(plan.canvas.len(), 3);
        assert_eq!(plan.machine.len(), 3);
        assert_eq!(plan.machine[1], Vector3::new(3., 6., 1.));
        assert_eq!(plan.machine[2], Vector3::new(10., 2., 1.));
    }
}
