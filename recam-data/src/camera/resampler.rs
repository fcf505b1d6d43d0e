//! Resampling camera tracks to a fixed pose count.

use crate::atomic::write_atomic;
use crate::camera::document::{CameraDocument, CameraTrack};
use crate::camera::pose::{CameraPose, PoseLayout};
use crate::error::ResampleError;
use crate::timeline::{ResampleMode, ResampleSpec, TargetCount};
use std::path::Path;
use tracing::{debug, info};

/// How output poses are produced from the source track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseSampling {
    /// Lerp translation and intrinsics, slerp orientation.
    #[default]
    Interpolate,
    /// Copy the nearest source pose.
    Nearest,
}

/// Summary of one camera resample.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraResampleReport {
    pub source_poses: usize,
    pub target_poses: usize,
    pub mode: ResampleMode,
    pub layout: PoseLayout,
}

/// Normalizes a camera track to a target pose count.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraSequenceResampler {
    sampling: PoseSampling,
}

impl CameraSequenceResampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sampling(mut self, sampling: PoseSampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Resample an in-memory track. Samples that land exactly on a source pose
    /// reuse that pose unchanged.
    pub fn resample_track(
        &self,
        track: &CameraTrack,
        target: TargetCount,
    ) -> Result<CameraTrack, ResampleError> {
        let spec = ResampleSpec::new(track.len(), target)
            .ok_or_else(|| ResampleError::malformed("camera track has no poses"))?;

        if spec.mode() == ResampleMode::Passthrough {
            return Ok(track.clone());
        }

        let poses = track.poses();
        let resampled = spec
            .plan()
            .into_iter()
            .map(|sample| match self.sampling {
                PoseSampling::Nearest => poses[sample.nearest].clone(),
                PoseSampling::Interpolate if sample.is_exact() => poses[sample.lower].clone(),
                PoseSampling::Interpolate => CameraPose::interpolate(
                    &poses[sample.lower],
                    &poses[sample.upper],
                    sample.weight,
                    &poses[sample.nearest],
                ),
            })
            .collect();

        Ok(CameraTrack::from_poses(resampled))
    }

    /// Resample the camera file at `input` and write the result to `output`.
    ///
    /// The target count is validated before `input` is opened. On any failure
    /// nothing is left at `output`.
    #[tracing::instrument(skip_all, fields(input = %input.display(), frames = target))]
    pub fn resample_file(
        &self,
        input: &Path,
        output: &Path,
        target: i64,
    ) -> Result<CameraResampleReport, ResampleError> {
        let (report, bytes) = self.resample_to_bytes(input, target)?;
        write_atomic(output, &bytes)?;
        info!(
            "Wrote {} poses to {} (from {}, {:?})",
            report.target_poses,
            output.display(),
            report.source_poses,
            self.sampling
        );
        Ok(report)
    }

    /// Resample the camera file at `input` and return the serialized document
    /// without writing it. When the pose count already matches, the bytes are
    /// the input file's bytes.
    pub fn resample_to_bytes(
        &self,
        input: &Path,
        target: i64,
    ) -> Result<(CameraResampleReport, Vec<u8>), ResampleError> {
        let target = TargetCount::new(target)?;
        let (document, source_bytes) = CameraDocument::load(input)?;
        let track = document.track();
        let layout = track
            .layout()
            .ok_or_else(|| ResampleError::malformed("camera track has no poses"))?;

        let report = CameraResampleReport {
            source_poses: track.len(),
            target_poses: target.get(),
            mode: if track.len() == target.get() {
                ResampleMode::Passthrough
            } else {
                ResampleMode::Stretch
            },
            layout,
        };

        let bytes = match report.mode {
            ResampleMode::Passthrough => {
                debug!("Pose count already matches target, copying input verbatim");
                source_bytes
            }
            ResampleMode::Stretch => {
                let resampled = self.resample_track(track, target)?;
                document.with_track(resampled).to_vec_pretty()?
            }
        };
        Ok((report, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3};
    use serde_json::{Value as JsonValue, json};

    fn track(n: usize) -> CameraTrack {
        let records: Vec<JsonValue> = (0..n)
            .map(|i| {
                let q = DQuat::from_rotation_y(i as f64 * 0.05);
                json!({
                    "translation": [i as f64, 0.5 * i as f64, 0.0],
                    "rotation": [q.x, q.y, q.z, q.w],
                    "frame": i
                })
            })
            .collect();
        CameraTrack::from_records(records).unwrap()
    }

    fn target(m: i64) -> TargetCount {
        TargetCount::new(m).unwrap()
    }

    #[test]
    fn test_upsample_40_to_81() {
        let source = track(40);
        let out = CameraSequenceResampler::new()
            .resample_track(&source, target(81))
            .unwrap();
        assert_eq!(out.len(), 81);
        assert_eq!(out.poses()[0], source.poses()[0]);
        assert_eq!(out.poses()[80], source.poses()[39]);
    }

    #[test]
    fn test_passthrough_is_identical() {
        let source = track(81);
        let out = CameraSequenceResampler::new()
            .resample_track(&source, target(81))
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_downsample_200_to_81_covers_span() {
        let source = track(200);
        for sampling in [PoseSampling::Interpolate, PoseSampling::Nearest] {
            let out = CameraSequenceResampler::new()
                .with_sampling(sampling)
                .resample_track(&source, target(81))
                .unwrap();
            assert_eq!(out.len(), 81);
            assert_eq!(out.poses()[0], source.poses()[0]);
            assert_eq!(out.poses()[80], source.poses()[199]);
        }
    }

    #[test]
    fn test_single_target_emits_first_pose() {
        let source = track(12);
        let out = CameraSequenceResampler::new()
            .resample_track(&source, target(1))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.poses()[0], source.poses()[0]);
    }

    #[test]
    fn test_interpolated_poses_are_valid_and_monotonic() {
        let source = track(10);
        let out = CameraSequenceResampler::new()
            .resample_track(&source, target(37))
            .unwrap();
        let mut last_x = f64::NEG_INFINITY;
        for pose in out.poses() {
            assert!(pose.rotation.is_normalized());
            assert!(pose.translation.x >= last_x);
            last_x = pose.translation.x;
        }
        // 9 source intervals over 36 output intervals: output 2 sits halfway
        // between sources 0 and 1.
        assert!(out.poses()[2].translation.abs_diff_eq(DVec3::new(0.5, 0.25, 0.0), 1e-12));
        assert_eq!(out.poses()[2].record()["frame"], 1);
    }

    #[test]
    fn test_resample_to_bytes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cameras.json");
        let records = track(6).into_records();
        std::fs::write(&input, serde_json::to_vec(&records).unwrap()).unwrap();

        let (report, bytes) = CameraSequenceResampler::new()
            .resample_to_bytes(&input, 11)
            .unwrap();
        assert_eq!(report.target_poses, 11);
        let value: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 11);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_nearest_copies_source_records() {
        let source = track(5);
        let out = CameraSequenceResampler::new()
            .with_sampling(PoseSampling::Nearest)
            .resample_track(&source, target(9))
            .unwrap();
        for (j, pose) in out.poses().iter().enumerate() {
            // f(j) = j / 2, ties round up
            assert_eq!(pose, &source.poses()[(j + 1) / 2]);
        }
    }
}
