//! Everything a conversion run can be tuned with, in one immutable value.
use std::path::Path;

use anyhow::Result;
use image::Rgb;
use nalgebra::{Vector2, Vector3};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::gcode::DabHeights;
use crate::optimizer::OptimizationStrategy;
use crate::plotter::pen::CssColor;
use crate::raster::{Interpolation, ResizeMode, Resolution};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Paper colour. Pixels quantized to it are never drawn.
    pub background: CssColor,
    /// Added to every pen's relative home to get its pickup position (x, y, z).
    pub pen_offset: Vector3<f64>,
    pub resolution: Resolution,
    /// Physical canvas size in millimetres (y, x).
    pub canvas_size: Vector2<f64>,
    /// Machine position of pixel (0, 0); its Z is the contact height.
    pub canvas_offset: Vector3<f64>,
    pub resize_mode: ResizeMode,
    pub interpolation: Interpolation,
    pub dithering: bool,
    pub lift: f64,
    pub ceiling: f64,
    pub strategy: OptimizationStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            background: CssColor::from_rgba8(255, 255, 255, 255),
            pen_offset: Vector3::new(110., 0., 60.),
            resolution: Resolution::default(),
            canvas_size: Vector2::new(100., 100.),
            canvas_offset: Vector3::new(0., 50., 10.),
            resize_mode: ResizeMode::default(),
            interpolation: Interpolation::default(),
            dithering: true,
            lift: 1.,
            ceiling: 200.,
            strategy: OptimizationStrategy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> PipelineConfig {
        PipelineConfig::default()
    }

    pub fn with_background(self, background: CssColor) -> Self {
        Self { background, ..self }
    }

    pub fn with_resolution(self, resolution: Resolution) -> Self {
        Self { resolution, ..self }
    }

    pub fn with_canvas(self, canvas_size: Vector2<f64>, canvas_offset: Vector3<f64>) -> Self {
        Self {
            canvas_size,
            canvas_offset,
            ..self
        }
    }

    pub fn with_pen_offset(self, pen_offset: Vector3<f64>) -> Self {
        Self { pen_offset, ..self }
    }

    pub fn with_resize(self, resize_mode: ResizeMode, interpolation: Interpolation) -> Self {
        Self {
            resize_mode,
            interpolation,
            ..self
        }
    }

    pub fn with_dithering(self, dithering: bool) -> Self {
        Self { dithering, ..self }
    }

    pub fn with_heights(self, ceiling: f64, lift: f64) -> Self {
        Self {
            ceiling,
            lift,
            ..self
        }
    }

    pub fn with_strategy(self, strategy: OptimizationStrategy) -> Self {
        Self { strategy, ..self }
    }

    /// Background as an image pixel. Alpha is ignored.
    pub fn background_rgb(&self) -> Rgb<u8> {
        let [r, g, b, _] = self.background.to_rgba8();
        Rgb([r, g, b])
    }

    pub fn heights(&self) -> DabHeights {
        DabHeights {
            ceiling: self.ceiling,
            lift: self.lift,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.resolution.is_empty() {
            return Err(PipelineError::Config(format!(
                "resolution must be at least 1x1, got {}x{}",
                self.resolution.rows, self.resolution.cols
            )));
        }
        if !(self.canvas_size[0] > 0. && self.canvas_size[1] > 0.) {
            return Err(PipelineError::Config(format!(
                "canvas size must be positive, got {}x{}",
                self.canvas_size[0], self.canvas_size[1]
            )));
        }
        Ok(())
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let data = ron::ser::to_string_pretty(self, PrettyConfig::default())?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<PipelineConfig> {
        let data = std::fs::read_to_string(path)?;
        let config: PipelineConfig = ron::from_str(data.as_str())?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.background_rgb(), Rgb([255, 255, 255]));
        assert_eq!(config.resolution, Resolution::new(50, 50));
        assert_eq!(config.resize_mode, ResizeMode::Fill);
        assert!(config.dithering);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config = PipelineConfig::new().with_resolution(Resolution::new(0, 10));
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
        let config = PipelineConfig::new().with_canvas(Vector2::new(0., 10.), Vector3::zeros());
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dabber.ron");
        let config = PipelineConfig::new()
            .with_resize(ResizeMode::Fit, Interpolation::Nearest)
            .with_dithering(false)
            .with_heights(150., 2.5)
            .with_strategy(OptimizationStrategy::SpatialIndex);
        config.to_file(&path).unwrap();
        assert_eq!(PipelineConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.ron");
        std::fs::write(&path, "(dithering: false, resize_mode: Stretch)").unwrap();
        let config = PipelineConfig::from_file(&path).unwrap();
        assert!(!config.dithering);
        assert_eq!(config.resize_mode, ResizeMode::Stretch);
        assert_eq!(config.ceiling, 200.);
    }
}
