//! Prepare a camera track and its video for inference.

use clap::Parser;
use recam_app::cli::{LoggingArgs, PoseSamplingArg, exit_with};
use recam_app::{PairJob, init_logging};
use recam_capture::{FrameSequenceResampler, VideoResampleOptions};
use recam_data::{CameraSequenceResampler, INFERENCE_FRAME_COUNT, INFERENCE_RESOLUTION, Resolution};
use std::path::PathBuf;

/// Normalize a camera track and video to the same frame count
#[derive(Parser, Debug)]
#[command(name = "prepare_pair")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source camera JSON file
    #[arg(long)]
    camera_in: PathBuf,

    /// Destination camera JSON file
    #[arg(long)]
    camera_out: PathBuf,

    /// Source video
    #[arg(long)]
    video_in: PathBuf,

    /// Destination video
    #[arg(long)]
    video_out: PathBuf,

    /// Target number of frames and poses
    #[arg(
        short = 'm',
        long = "frames",
        allow_negative_numbers = true,
        default_value_t = INFERENCE_FRAME_COUNT as i64
    )]
    frames: i64,

    /// Output video resolution as WIDTHxHEIGHT
    #[arg(long, default_value_t = INFERENCE_RESOLUTION)]
    resolution: Resolution,

    /// How poses between source samples are produced
    #[arg(long, value_enum, default_value_t = PoseSamplingArg::Interpolate)]
    sampling: PoseSamplingArg,

    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() {
    let args = Args::parse();
    init_logging(&args.logging.config());

    let job = PairJob {
        camera_in: args.camera_in,
        camera_out: args.camera_out,
        video_in: args.video_in,
        video_out: args.video_out,
        target: args.frames,
        camera: CameraSequenceResampler::new().with_sampling(args.sampling.into()),
        video: FrameSequenceResampler::new(
            VideoResampleOptions::default().with_resolution(args.resolution),
        ),
    };
    if let Err(e) = job.run() {
        exit_with(&e, e.kind());
    }
}
