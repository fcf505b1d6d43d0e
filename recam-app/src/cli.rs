//! Argument types shared by the command line tools.

use crate::logging::LoggingConfig;
use clap::{Args, ValueEnum};
use recam_capture::{
    EncoderConfig, FitMode, FrameRatePolicy, FrameSampling, VideoResampleOptions,
};
use recam_data::{ErrorKind, PoseSampling, Resolution};
use std::fmt::Display;

/// Logging flags.
#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Log filter (overridden by RUST_LOG)
    #[arg(long, env = "RECAM_LOG", default_value = "info")]
    pub log_level: String,
}

impl LoggingArgs {
    pub fn config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseSamplingArg {
    /// Interpolate between neighbouring poses
    Interpolate,
    /// Copy the nearest source pose
    Nearest,
}

impl From<PoseSamplingArg> for PoseSampling {
    fn from(arg: PoseSamplingArg) -> Self {
        match arg {
            PoseSamplingArg::Interpolate => PoseSampling::Interpolate,
            PoseSamplingArg::Nearest => PoseSampling::Nearest,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitArg {
    /// Scale to cover, then center crop
    Crop,
    /// Scale to fit, then pad with black
    Pad,
    /// Resize ignoring aspect ratio
    Stretch,
}

impl From<FitArg> for FitMode {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Crop => FitMode::Crop,
            FitArg::Pad => FitMode::Pad,
            FitArg::Stretch => FitMode::Stretch,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSamplingArg {
    /// Duplicate or drop whole frames
    Nearest,
    /// Blend neighbouring frames
    Blend,
}

impl From<FrameSamplingArg> for FrameSampling {
    fn from(arg: FrameSamplingArg) -> Self {
        match arg {
            FrameSamplingArg::Nearest => FrameSampling::Nearest,
            FrameSamplingArg::Blend => FrameSampling::Blend,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpsPolicyArg {
    /// Keep the source frame rate
    Source,
    /// Scale the frame rate so the clip keeps its duration
    PreserveDuration,
    /// Use the rate given by --fps
    Fixed,
}

/// Video output flags.
#[derive(Args, Debug, Clone)]
pub struct VideoArgs {
    /// Output resolution as WIDTHxHEIGHT (default: source resolution)
    #[arg(long)]
    pub resolution: Option<Resolution>,

    /// How frames are fitted to a resolution with another aspect ratio
    #[arg(long, value_enum, default_value_t = FitArg::Crop)]
    pub fit: FitArg,

    /// How output frames are taken from the source
    #[arg(long, value_enum, default_value_t = FrameSamplingArg::Nearest)]
    pub sampling: FrameSamplingArg,

    /// Output frame rate policy (default: source, or fixed when --fps is given)
    #[arg(long, value_enum, requires_if("fixed", "fps"))]
    pub fps_policy: Option<FpsPolicyArg>,

    /// Output frame rate for the fixed policy
    #[arg(long)]
    pub fps: Option<f64>,

    /// ffmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// Constant rate factor passed to the encoder
    #[arg(long, default_value_t = 18)]
    pub crf: u8,
}

impl VideoArgs {
    pub fn frame_rate_policy(&self) -> FrameRatePolicy {
        match (self.fps_policy, self.fps) {
            (Some(FpsPolicyArg::Source), _) => FrameRatePolicy::Source,
            (Some(FpsPolicyArg::PreserveDuration), _) => FrameRatePolicy::PreserveDuration,
            (Some(FpsPolicyArg::Fixed) | None, Some(fps)) => FrameRatePolicy::Fixed(fps),
            // Rejected by the resampler as an invalid rate.
            (Some(FpsPolicyArg::Fixed), None) => FrameRatePolicy::Fixed(0.0),
            (None, None) => FrameRatePolicy::Source,
        }
    }

    pub fn options(&self) -> VideoResampleOptions {
        let mut options = VideoResampleOptions::default()
            .with_fit(self.fit.into())
            .with_sampling(self.sampling.into())
            .with_frame_rate(self.frame_rate_policy())
            .with_encoder(
                EncoderConfig::default()
                    .with_codec(&self.codec)
                    .with_crf(Some(self.crf)),
            );
        if let Some(resolution) = self.resolution {
            options = options.with_resolution(resolution);
        }
        options
    }
}

/// Log `error` and exit with the code for its category.
pub fn exit_with(error: &dyn Display, kind: ErrorKind) -> ! {
    tracing::error!("{}", error);
    std::process::exit(kind.exit_code())
}
