//! Image in, dab program out.
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use tera::Tera;
use tracing::info;

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::gcode::{post, write_program, DabPostMachines};
use crate::optimizer::Optimizer;
use crate::plotter::{CoordinateMapper, PenPlan, PenRegistry};
use crate::raster::{record, resize_filter, Quantizer};

/// The result of planning one image: the quantized raster and one mapped,
/// ordered plan per pen (index-aligned with the registry it was planned for).
#[derive(Debug, Clone)]
pub struct DabRun {
    pub image: RgbImage,
    pub plans: Vec<PenPlan>,
}

impl DabRun {
    pub fn dab_count(&self) -> usize {
        self.plans.iter().map(|plan| plan.len()).sum()
    }

    /// Renders the run with the built-in fixed width G01 machine.
    pub fn to_gcode(&self, pens: &PenRegistry, config: &PipelineConfig) -> Result<Vec<String>, PipelineError> {
        let post_template = DabPostMachines::get_machine(DabPostMachines::FixedWidthG01)?;
        self.to_gcode_with(pens, config, &post_template)
    }

    pub fn to_gcode_with(
        &self,
        pens: &PenRegistry,
        config: &PipelineConfig,
        post_template: &Tera,
    ) -> Result<Vec<String>, PipelineError> {
        let start = Instant::now();
        let program = post(pens, &self.plans, &config.heights(), post_template)?;
        info!(lines = program.len(), elapsed = ?start.elapsed(), "Posted program");
        Ok(program)
    }

    /// Saves the quantized image, which shows exactly what will be drawn.
    pub fn save_preview(&self, path: &Path) -> Result<(), PipelineError> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Runs every stage up to, but not including, G-code output.
pub fn plan(image: &RgbImage, pens: &PenRegistry, config: &PipelineConfig) -> Result<DabRun, PipelineError> {
    config.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::EmptyImage);
    }
    let background = config.background_rgb();

    let start = Instant::now();
    let resized = resize_filter(
        image,
        config.resolution,
        background,
        config.resize_mode,
        config.interpolation,
    );
    info!(elapsed = ?start.elapsed(), "Resized");

    let start = Instant::now();
    let quantized = Quantizer::new(background, pens)
        .with_dithering(config.dithering)
        .quantize(&resized);
    info!(elapsed = ?start.elapsed(), "Quantized");

    let start = Instant::now();
    let mut plans = record(&quantized, pens);
    let optimizer = Optimizer::new(config.strategy);
    let mapper = CoordinateMapper::new(&config.canvas_size, config.resolution, config.canvas_offset);
    for plan in plans.iter_mut().filter(|plan| !plan.is_empty()) {
        optimizer.optimize_plan(plan);
        mapper.map(plan);
    }
    info!(elapsed = ?start.elapsed(), "Planned paths");

    Ok(DabRun {
        image: quantized,
        plans,
    })
}

/// Plans `image` and renders it with the built-in machine.
pub fn image_to_gcode(
    image: &RgbImage,
    pens: &PenRegistry,
    config: &PipelineConfig,
) -> Result<Vec<String>, PipelineError> {
    plan(image, pens, config)?.to_gcode(pens, config)
}

/// Writes the program to a sibling `.tmp` file and renames it into place. On
/// any failure the temporary file is removed, so `output_path` is either the
/// complete program or untouched.
fn write_output(program: &[String], output_path: &Path) -> Result<(), PipelineError> {
    let mut tmp_name = output_path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    let written = File::create(&tmp_path)
        .map_err(PipelineError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_program(program, &mut writer)?;
            Ok(())
        })
        .and_then(|_| std::fs::rename(&tmp_path, output_path).map_err(PipelineError::from));
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    written
}

/// File to file conversion. The pen list and the image are both loaded before
/// any processing starts, and the output only appears once it is complete.
pub fn convert_file(
    image_path: &Path,
    pen_path: &Path,
    output_path: &Path,
    config: &PipelineConfig,
) -> Result<DabRun, PipelineError> {
    let start = Instant::now();
    let pens = PenRegistry::from_file(pen_path, &config.pen_offset)?;
    let image = image::open(image_path)?.to_rgb8();
    info!(
        image = %image_path.display(),
        width = image.width(),
        height = image.height(),
        pens = pens.len(),
        "Loaded inputs"
    );

    let run = plan(&image, &pens, config)?;
    let program = run.to_gcode(&pens, config)?;

    write_output(&program, output_path)?;
    info!(
        output = %output_path.display(),
        dabs = run.dab_count(),
        elapsed = ?start.elapsed(),
        "Wrote program"
    );
    Ok(run)
}
