use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use green_on_brown::cli::{self, PipelineArgs};
use green_on_brown::frame_queue::{Backpressure, CaptureQueue, CaptureStats, Pull};
use green_on_brown::timing::{measure, millis, RunAccumulator};
use green_on_brown::utils::{close_windows, is_escape, show_image};
use green_on_brown::Pipeline;
use log::{debug, info, warn};
use opencv::{
    core::{Mat, Point, Scalar, Size},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_AA},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};

const DEFAULT_FPS: f64 = 30.0;
const MAX_CONSECUTIVE_READ_FAILURES: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "video", about = "Green-on-brown detection benchmark over a video file or camera")]
struct Args {
    /// Camera index or video file path/URL
    #[arg(long, default_value = "datasets/videos/green_on_fallow.mp4", env = "GOB_VIDEO_SOURCE")]
    source: String,
    #[arg(long, default_value = "datasets/videos_output/bench_output.mp4", env = "GOB_OUTPUT_FILE")]
    output: PathBuf,
    /// Do not write the annotated video
    #[arg(long, env = "GOB_NO_SAVE")]
    no_save: bool,
    /// Show annotated frames with a live FPS overlay (ESC stops the run)
    #[arg(long, env = "GOB_DISPLAY")]
    display: bool,
    /// Frames run through the pipeline before timing starts
    #[arg(long, default_value_t = 30, env = "GOB_WARMUP")]
    warmup: usize,
    /// Stop after this many timed frames (0 = until the source ends)
    #[arg(long, default_value_t = 300, env = "GOB_MAX_FRAMES")]
    max_frames: usize,
    /// Frames buffered between capture and the pipeline
    #[arg(long, default_value_t = 4, env = "GOB_QUEUE_DEPTH")]
    queue_depth: usize,
    #[arg(long, value_enum, default_value_t = Backpressure::Block, env = "GOB_BACKPRESSURE")]
    backpressure: Backpressure,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn open_capture(source: &str) -> Result<VideoCapture> {
    let capture = match source.parse::<i32>() {
        Ok(device) => VideoCapture::new(device, videoio::CAP_ANY),
        Err(_) => VideoCapture::from_file(source, videoio::CAP_ANY),
    }
    .with_context(|| format!("could not open video source {}", source))?;
    if !capture.is_opened()? {
        bail!("could not open video source {}", source);
    }
    Ok(capture)
}

/// Any failure here only disables saving.
fn open_writer(path: &Path, fps: f64, size: Size) -> Option<VideoWriter> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!("cannot create {}: {}; output will not be saved", parent.display(), err);
            return None;
        }
    }
    let writer = VideoWriter::fourcc('m', 'p', '4', 'v')
        .and_then(|fourcc| VideoWriter::new(&path.to_string_lossy(), fourcc, fps, size, true));
    match writer {
        Ok(writer) if writer.is_opened().unwrap_or(false) => {
            info!(
                "writing annotated video to {} ({:.1} fps, {}x{})",
                path.display(),
                fps,
                size.width,
                size.height
            );
            Some(writer)
        }
        Ok(_) => {
            warn!("video writer for {} did not open; output will not be saved", path.display());
            None
        }
        Err(err) => {
            warn!(
                "cannot open video writer for {}: {}; output will not be saved",
                path.display(),
                err
            );
            None
        }
    }
}

/// Turns a capture into a frame source for the queue. Empty frames are
/// skipped; a run of read failures ends the stream.
fn frame_source(mut capture: VideoCapture) -> impl FnMut() -> Pull<Mat> + Send + 'static {
    let mut failures = 0;
    move || {
        let mut frame = Mat::default();
        let pull = match capture.read(&mut frame) {
            Ok(true) if !frame.empty() => Pull::Item(frame),
            Ok(true) => Pull::Skip,
            Ok(false) => Pull::End,
            Err(err) => {
                warn!("frame read failed: {}", err);
                Pull::Skip
            }
        };
        match pull {
            Pull::Skip => {
                failures += 1;
                if failures >= MAX_CONSECUTIVE_READ_FAILURES {
                    warn!("{} consecutive unreadable frames, stopping capture", failures);
                    return Pull::End;
                }
            }
            _ => failures = 0,
        }
        pull
    }
}

fn draw_fps(frame: &mut Mat, elapsed: Duration) -> opencv::Result<()> {
    let seconds = elapsed.as_secs_f64();
    let fps = if seconds > 0.0 { 1.0 / seconds } else { 0.0 };
    imgproc::put_text(
        frame,
        &format!("{:5.1} FPS", fps),
        Point::new(10, 30),
        FONT_HERSHEY_SIMPLEX,
        0.8,
        Scalar::new(0.0, 255.0, 0.0, 0.0),
        2,
        LINE_AA,
        false,
    )
}

fn print_summary(accumulator: &RunAccumulator, wall_clock: Duration, capture: &CaptureStats) {
    println!("--------------------------- BENCHMARK SUMMARY ---------------------------");
    println!("Frames processed   : {}", accumulator.count());
    println!("Algorithm time     : {:8.3} s", accumulator.total().as_secs_f64());
    match (accumulator.mean_millis(), accumulator.mean_fps()) {
        (Some(mean), Some(fps)) => {
            println!("Mean per-frame     : {:8.2} ms", mean);
            println!("Mean FPS (algo)    : {:8.2}", fps);
        }
        (Some(mean), None) => {
            println!("Mean per-frame     : {:8.2} ms", mean);
            println!("Mean FPS (algo)    :  no data");
        }
        _ => {
            println!("Mean per-frame     :  no data");
            println!("Mean FPS (algo)    :  no data");
        }
    }
    println!("Total wall-clock   : {:8.3} s (incl. capture/encode/GUI)", wall_clock.as_secs_f64());
    println!(
        "Capture            : {} read, {} unreadable, {} dropped by queue",
        capture.captured, capture.skipped, capture.dropped
    );
    println!("-------------------------------------------------------------------------");
}

fn main() -> Result<()> {
    cli::init();
    let args = Args::parse();

    let pipeline = Pipeline::new(args.pipeline.to_config())
        .context("invalid pipeline configuration")?;
    debug!("pipeline configuration: {:?}", pipeline.config());
    let capture = open_capture(&args.source)?;

    let fps = match capture.get(videoio::CAP_PROP_FPS)? {
        fps if fps > 0.0 => fps,
        _ => DEFAULT_FPS,
    };
    let size = Size::new(
        capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32,
        capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32,
    );
    info!("opened {} ({}x{} @ {:.1} fps)", args.source, size.width, size.height, fps);

    let mut writer = if args.no_save {
        None
    } else {
        open_writer(&args.output, fps, size)
    };

    let queue = CaptureQueue::spawn(frame_source(capture), args.queue_depth, args.backpressure);
    let mut accumulator = RunAccumulator::new();
    let mut warmup_left = args.warmup;
    let mut timed_start: Option<Instant> = None;

    while args.max_frames == 0 || accumulator.count() < args.max_frames {
        let Some(frame) = queue.recv() else {
            break;
        };

        if warmup_left > 0 {
            warmup_left -= 1;
            if let Err(err) = pipeline.run(&frame) {
                warn!("pipeline failed on warm-up frame: {}", err);
            }
            continue;
        }
        timed_start.get_or_insert_with(Instant::now);

        let (output, elapsed) = measure(|| pipeline.run(&frame));
        let mut output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!("pipeline failed on frame: {}, skipping", err);
                continue;
            }
        };
        accumulator.record(elapsed);
        println!(
            "Frame {}: {} weeds detected. Inference time: {:.3} ms",
            accumulator.count(),
            output.detections.len(),
            millis(elapsed)
        );

        if let Some(out) = writer.as_mut() {
            if let Err(err) = out.write(&output.annotated) {
                warn!("could not write frame: {}", err);
            }
        }

        if args.display {
            draw_fps(&mut output.annotated, elapsed)?;
            if is_escape(show_image("GreenOnBrown FPS test", &output.annotated, 1)?) {
                break;
            }
        }
    }

    let wall_clock = timed_start.map(|start| start.elapsed()).unwrap_or_default();
    let capture_stats = queue.finish();
    if let Some(mut out) = writer {
        if let Err(err) = out.release() {
            warn!("could not finalise {}: {}", args.output.display(), err);
        }
    }
    if args.display {
        close_windows()?;
    }

    if accumulator.count() == 0 {
        warn!("no frames were timed");
    }
    print_summary(&accumulator, wall_clock, &capture_stats);
    Ok(())
}
