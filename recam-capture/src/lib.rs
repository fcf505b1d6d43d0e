//! Recam Capture - Video decoding, encoding and frame resampling
//!
//! This crate provides frame sources and sinks for video files and the
//! resampler that normalizes a video to a fixed frame count:
//!
//! - Video files are decoded and encoded through `ffmpeg` child processes
//!   (`ffmpeg` and `ffprobe` must be on `PATH`)
//! - In-memory sources and sinks for tests and library callers
//!
//! ## Example
//!
//! ```ignore
//! use recam_capture::{FrameSequenceResampler, VideoResampleOptions};
//! use recam_data::INFERENCE_RESOLUTION;
//!
//! let resampler = FrameSequenceResampler::new(
//!     VideoResampleOptions::default().with_resolution(INFERENCE_RESOLUTION),
//! );
//! let report = resampler.resample_file("in.mp4".as_ref(), "out.mp4".as_ref(), 81)?;
//! ```

mod command;
mod encoder;
mod file;
mod probe;
mod resampler;
mod resize;
mod source;

pub use command::{FfmpegCommand, locate_tool};
pub use encoder::{EncoderConfig, FfmpegEncoder};
pub use file::FfmpegFileCapture;
pub use probe::{VideoInfo, parse_frame_rate, probe_video};
pub use resampler::{
    FALLBACK_FRAME_RATE, FrameRatePolicy, FrameSampling, FrameSequenceResampler,
    VideoResampleOptions, VideoResampleReport,
};
pub use resize::{FitMode, blend, fit_to};
pub use source::{CaptureError, CaptureSource, FrameData, FrameSink, MemorySink, MemorySource};
