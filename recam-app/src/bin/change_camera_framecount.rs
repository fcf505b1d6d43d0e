//! Resample a camera track file to a fixed number of poses.

use clap::Parser;
use recam_app::cli::{LoggingArgs, PoseSamplingArg, exit_with};
use recam_app::init_logging;
use recam_data::CameraSequenceResampler;
use std::path::PathBuf;

/// Change the number of poses in a camera track
#[derive(Parser, Debug)]
#[command(name = "change_camera_framecount")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source camera JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Destination camera JSON file
    #[arg(short, long)]
    output: PathBuf,

    /// Target number of poses
    #[arg(short = 'm', long = "frames", allow_negative_numbers = true)]
    frames: i64,

    /// How poses between source samples are produced
    #[arg(long, value_enum, default_value_t = PoseSamplingArg::Interpolate)]
    sampling: PoseSamplingArg,

    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() {
    let args = Args::parse();
    init_logging(&args.logging.config());

    let resampler = CameraSequenceResampler::new().with_sampling(args.sampling.into());
    match resampler.resample_file(&args.input, &args.output, args.frames) {
        Ok(report) => tracing::info!(
            "{} -> {} poses ({:?}, {})",
            report.source_poses,
            report.target_poses,
            report.mode,
            report.layout
        ),
        Err(e) => exit_with(&e, e.kind()),
    }
}
