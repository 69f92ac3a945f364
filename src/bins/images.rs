use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use green_on_brown::cli::{self, PipelineArgs};
use green_on_brown::timing::{measure, millis, RunAccumulator};
use green_on_brown::utils::{
    close_windows, is_escape, list_image_files, output_path, show_image,
};
use green_on_brown::Pipeline;
use log::{debug, info, warn};
use opencv::{core::Vector, imgcodecs, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "images", about = "Green-on-brown detection benchmark over a directory of images")]
struct Args {
    #[arg(long, default_value = "datasets/my_dataset", env = "GOB_INPUT_DIR")]
    input_dir: PathBuf,
    #[arg(long, default_value = "datasets/output", env = "GOB_OUTPUT_DIR")]
    output_dir: PathBuf,
    /// Prepended to each source file name when writing annotated output
    #[arg(long, default_value = "output_", env = "GOB_OUTPUT_PREFIX")]
    prefix: String,
    /// Do not write annotated images
    #[arg(long, env = "GOB_NO_SAVE")]
    no_save: bool,
    /// Show each annotated image and wait for a key (ESC stops the run)
    #[arg(long, env = "GOB_DISPLAY")]
    display: bool,
    /// Images run through the pipeline before timing starts
    #[arg(long, default_value_t = 0, env = "GOB_WARMUP")]
    warmup: usize,
    /// Stop after this many timed images (0 = all)
    #[arg(long, default_value_t = 0, env = "GOB_MAX_ITEMS")]
    max_items: usize,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn main() -> Result<()> {
    cli::init();
    let args = Args::parse();

    let pipeline = Pipeline::new(args.pipeline.to_config())
        .context("invalid pipeline configuration")?;
    debug!("pipeline configuration: {:?}", pipeline.config());
    let files = list_image_files(&args.input_dir)
        .with_context(|| format!("cannot read input directory {}", args.input_dir.display()))?;
    info!("found {} images in {}", files.len(), args.input_dir.display());

    let mut save = !args.no_save;
    if save {
        if let Err(err) = fs::create_dir_all(&args.output_dir) {
            warn!(
                "cannot create output directory {}: {}; annotated images will not be saved",
                args.output_dir.display(),
                err
            );
            save = false;
        }
    }

    let mut accumulator = RunAccumulator::new();
    let mut warmup_left = args.warmup;

    for path in &files {
        if args.max_items > 0 && accumulator.count() >= args.max_items {
            break;
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let image = match imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_COLOR) {
            Ok(image) if !image.empty() => image,
            Ok(_) => {
                warn!("could not read {}, skipping", path.display());
                continue;
            }
            Err(err) => {
                warn!("could not read {}: {}, skipping", path.display(), err);
                continue;
            }
        };

        let (output, elapsed) = measure(|| pipeline.run(&image));
        let output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!("pipeline failed on {}: {}, skipping", name, err);
                continue;
            }
        };
        if warmup_left > 0 {
            warmup_left -= 1;
            debug!("warm-up image {}", name);
            continue;
        }
        accumulator.record(elapsed);

        println!(
            "Processed {}: {} weeds detected. Inference time: {:.6} ms",
            name,
            output.detections.len(),
            millis(elapsed)
        );

        if save {
            let out = output_path(&args.output_dir, &args.prefix, path);
            match imgcodecs::imwrite(&out.to_string_lossy(), &output.annotated, &Vector::new()) {
                Ok(true) => debug!("wrote {}", out.display()),
                Ok(false) => warn!("could not write {}", out.display()),
                Err(err) => warn!("could not write {}: {}", out.display(), err),
            }
        }

        if args.display && is_escape(show_image("Detection Result", &output.annotated, 0)?) {
            break;
        }
    }

    if args.display {
        close_windows()?;
    }

    match accumulator.mean_millis() {
        Some(mean) => println!(
            "Average time for all inference is: {:.6} ms over {} images",
            mean,
            accumulator.count()
        ),
        None => {
            warn!("no images were processed");
            println!("Average time for all inference is: no data");
        }
    }
    Ok(())
}
