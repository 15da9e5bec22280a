use aoer_dabber_rs::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Convert an image into a dabbing program.
#[derive(Parser, Debug)]
struct Args {
    /// Source image (anything the image crate can decode).
    image: PathBuf,
    /// Pen definitions, one `#RRGGBB | x y z | label` per line.
    #[arg(short, long, default_value = "pens.txt")]
    pens: PathBuf,
    /// Output program. Defaults to the image path with `.gcode` appended.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// RON pipeline configuration. Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the resize mode (stretch, fill or fit).
    #[arg(short, long)]
    mode: Option<ResizeMode>,
    /// Turn dithering off.
    #[arg(long)]
    no_dither: bool,
    /// Also save the quantized image here.
    #[arg(long)]
    preview: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.resize_mode = mode;
    }
    if args.no_dither {
        config = config.with_dithering(false);
    }

    let output = args.output.clone().unwrap_or_else(|| {
        let mut name = args.image.clone().into_os_string();
        name.push(".gcode");
        PathBuf::from(name)
    });
    let run = convert_file(&args.image, &args.pens, &output, &config)?;
    if let Some(preview) = &args.preview {
        run.save_preview(preview)?;
    }
    println!("Wrote {} dabs to {}", run.dab_count(), output.display());
    Ok(())
}
