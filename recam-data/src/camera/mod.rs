//! Camera tracks: pose records, documents and resampling

mod document;
mod pose;
mod resampler;

pub use document::{CameraDocument, CameraTrack};
pub use pose::{CameraPose, INTRINSIC_KEYS, PoseLayout, RotationLayout};
pub use resampler::{CameraResampleReport, CameraSequenceResampler, PoseSampling};
