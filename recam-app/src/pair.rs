//! Preparing a camera track and its video for inference together.

use recam_capture::{CaptureError, FrameSequenceResampler, VideoResampleReport};
use recam_data::{
    CameraResampleReport, CameraSequenceResampler, ErrorKind, ResampleError, StagedFile,
    TargetCount,
};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PairError {
    #[error("Camera resample failed: {0}")]
    Camera(#[from] ResampleError),

    #[error("Video resample failed: {0}")]
    Video(#[from] CaptureError),
}

impl PairError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PairError::Camera(e) => e.kind(),
            PairError::Video(e) => e.kind(),
        }
    }
}

/// Both resamples of one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub camera: CameraResampleReport,
    pub video: VideoResampleReport,
}

impl PairReport {
    /// Whether the sources already had the same length before resampling.
    pub fn sources_matched(&self) -> bool {
        self.camera.source_poses == self.video.source_frames
    }
}

/// A camera track and video to be normalized to the same frame count.
#[derive(Debug, Clone)]
pub struct PairJob {
    pub camera_in: PathBuf,
    pub camera_out: PathBuf,
    pub video_in: PathBuf,
    pub video_out: PathBuf,
    pub target: i64,
    pub camera: CameraSequenceResampler,
    pub video: FrameSequenceResampler,
}

impl PairJob {
    /// Run the camera resample, then the video resample. The camera output is
    /// staged and only committed once the video has been written, so a failed
    /// pair leaves whatever was at `camera_out` untouched.
    #[tracing::instrument(
        skip_all,
        fields(camera = %self.camera_in.display(), video = %self.video_in.display())
    )]
    pub fn run(&self) -> Result<PairReport, PairError> {
        TargetCount::new(self.target)?;

        let (camera, bytes) = self
            .camera
            .resample_to_bytes(&self.camera_in, self.target)?;
        let mut staged = StagedFile::new(&self.camera_out)?;
        staged.write_with(|w| w.write_all(&bytes))?;

        let video = self
            .video
            .resample_file(&self.video_in, &self.video_out, self.target)?;
        staged.commit()?;

        let report = PairReport { camera, video };
        if !report.sources_matched() {
            warn!(
                "Camera track has {} poses but the video has {} frames; \
                 both were stretched to {} over the same time span",
                report.camera.source_poses,
                report.video.source_frames,
                report.camera.target_poses
            );
        }
        info!(
            "Pair ready: {} and {} with {} frames at {}",
            self.camera_out.display(),
            self.video_out.display(),
            report.video.target_frames,
            report.video.resolution
        );
        Ok(report)
    }
}
