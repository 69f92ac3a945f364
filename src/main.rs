use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use green_on_brown::cli::{self, PipelineArgs};
use green_on_brown::timing::{measure, millis};
use green_on_brown::utils::{close_windows, show_image};
use green_on_brown::Pipeline;
use log::{debug, info};
use opencv::{core::Vector, imgcodecs, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "green_on_brown", about = "Detect vegetation on bare soil in a single image")]
struct Args {
    image: PathBuf,
    /// Write the annotated image here
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write the final binary mask here
    #[arg(long)]
    mask: Option<PathBuf>,
    #[arg(long)]
    display: bool,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn write_image(path: &Path, image: &Mat) -> Result<()> {
    if !imgcodecs::imwrite(&path.to_string_lossy(), image, &Vector::new())? {
        bail!("could not write {}", path.display());
    }
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    cli::init();
    let args = Args::parse();

    let pipeline = Pipeline::new(args.pipeline.to_config())
        .context("invalid pipeline configuration")?;
    debug!("pipeline configuration: {:?}", pipeline.config());
    let image = imgcodecs::imread(&args.image.to_string_lossy(), imgcodecs::IMREAD_COLOR)
        .with_context(|| format!("could not read {}", args.image.display()))?;
    if image.empty() {
        bail!("could not read {}", args.image.display());
    }

    let (output, elapsed) = measure(|| pipeline.run(&image));
    let output = output?;

    for (i, detection) in output.detections.iter().enumerate() {
        let centre = detection.centre();
        println!(
            "{:3} {} x={} y={} w={} h={} area={:.1} centre=({}, {})",
            i,
            detection.label,
            detection.bbox.x,
            detection.bbox.y,
            detection.bbox.width,
            detection.bbox.height,
            detection.area,
            centre.x,
            centre.y
        );
    }
    println!(
        "{}: {} weeds detected in {:.3} ms",
        args.image.display(),
        output.detections.len(),
        millis(elapsed)
    );

    if let Some(path) = &args.output {
        write_image(path, &output.annotated)?;
    }
    if let Some(path) = &args.mask {
        write_image(path, output.mask.as_mat())?;
    }
    if args.display {
        show_image("Detection Result", &output.annotated, 0)?;
        close_windows()?;
    }
    Ok(())
}
