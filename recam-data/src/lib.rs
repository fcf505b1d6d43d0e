//! Recam Data Crate
//!
//! Camera track loading, the shared index mapping and camera resampling.
//! This crate is video-agnostic; frame decoding and encoding live in recam-capture.

pub mod atomic;
pub mod camera;
pub mod contract;
pub mod error;
pub mod timeline;

pub use atomic::{StagedFile, write_atomic};
pub use camera::{
    CameraDocument, CameraPose, CameraResampleReport, CameraSequenceResampler, CameraTrack,
    PoseLayout, PoseSampling,
};
pub use contract::{INFERENCE_FRAME_COUNT, INFERENCE_RESOLUTION, Resolution};
pub use error::{ErrorKind, ResampleError};
pub use timeline::{ResampleMode, ResampleSpec, SourceSample, TargetCount};
