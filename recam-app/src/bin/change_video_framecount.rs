//! Resample a video to a fixed number of frames.

use clap::Parser;
use recam_app::cli::{LoggingArgs, VideoArgs, exit_with};
use recam_app::init_logging;
use recam_capture::FrameSequenceResampler;
use std::path::PathBuf;

/// Change the number of frames in a video
#[derive(Parser, Debug)]
#[command(name = "change_video_framecount")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source video
    #[arg(short, long)]
    input: PathBuf,

    /// Destination video; the container follows its extension
    #[arg(short, long)]
    output: PathBuf,

    /// Target number of frames
    #[arg(short = 'm', long = "frames", allow_negative_numbers = true)]
    frames: i64,

    #[command(flatten)]
    video: VideoArgs,

    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() {
    let args = Args::parse();
    init_logging(&args.logging.config());

    let resampler = FrameSequenceResampler::new(args.video.options());
    match resampler.resample_file(&args.input, &args.output, args.frames) {
        Ok(report) => tracing::info!(
            "{} -> {} frames at {} @ {} fps",
            report.source_frames,
            report.target_frames,
            report.resolution,
            report.fps
        ),
        Err(e) => exit_with(&e, e.kind()),
    }
}
