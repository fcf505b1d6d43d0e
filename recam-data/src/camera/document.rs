//! Camera track documents on disk.

use crate::camera::pose::{CameraPose, PoseLayout};
use crate::error::ResampleError;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use tracing::{debug, info};

/// Top-level keys that may hold the pose array of an object document.
const TRACK_KEYS: [&str; 2] = ["poses", "frames"];

/// An ordered, structurally homogeneous sequence of poses.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTrack {
    poses: Vec<CameraPose>,
}

impl CameraTrack {
    /// Build a track from raw JSON records. All records must share the layout of the first.
    pub fn from_records(records: Vec<JsonValue>) -> Result<Self, ResampleError> {
        if records.is_empty() {
            return Err(ResampleError::malformed("camera track has no poses"));
        }

        let poses = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| CameraPose::from_record(i, record))
            .collect::<Result<Vec<_>, _>>()?;

        let layout = poses[0].layout();
        if let Some((i, pose)) = poses
            .iter()
            .enumerate()
            .find(|(_, pose)| pose.layout() != layout)
        {
            return Err(ResampleError::malformed(format!(
                "pose {i} is a {} but pose 0 is a {layout}",
                pose.layout()
            )));
        }

        Ok(Self { poses })
    }

    pub fn from_poses(poses: Vec<CameraPose>) -> Self {
        Self { poses }
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn layout(&self) -> Option<PoseLayout> {
        self.poses.first().map(CameraPose::layout)
    }

    pub fn poses(&self) -> &[CameraPose] {
        &self.poses
    }

    pub fn into_records(self) -> Vec<JsonValue> {
        self.poses.into_iter().map(CameraPose::into_record).collect()
    }
}

/// How the pose array sits in the document.
#[derive(Debug, Clone, PartialEq)]
enum DocumentRoot {
    /// The document is the pose array.
    Array,
    /// The pose array lives under `key`; `fields` holds every other top-level field.
    Object {
        key: &'static str,
        fields: Map<String, JsonValue>,
    },
}

/// A parsed camera file: the track plus whatever surrounds it.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraDocument {
    root: DocumentRoot,
    track: CameraTrack,
}

impl CameraDocument {
    /// Parse a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResampleError> {
        let value: JsonValue = serde_json::from_slice(bytes)
            .map_err(|e| ResampleError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, ResampleError> {
        match value {
            JsonValue::Array(records) => Ok(Self {
                root: DocumentRoot::Array,
                track: CameraTrack::from_records(records)?,
            }),
            JsonValue::Object(mut fields) => {
                let key = TRACK_KEYS
                    .iter()
                    .copied()
                    .find(|key| fields.contains_key(*key))
                    .ok_or_else(|| {
                        ResampleError::malformed("document has no 'poses' or 'frames' array")
                    })?;
                let records = match fields.remove(key) {
                    Some(JsonValue::Array(records)) => records,
                    _ => {
                        return Err(ResampleError::malformed(format!("'{key}' is not an array")));
                    }
                };
                Ok(Self {
                    root: DocumentRoot::Object { key, fields },
                    track: CameraTrack::from_records(records)?,
                })
            }
            _ => Err(ResampleError::malformed(
                "expected a pose array or an object with a 'poses' array",
            )),
        }
    }

    /// Read and parse a document from disk.
    ///
    /// Returns the raw bytes too, so an unchanged track can be written back verbatim.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<(Self, Vec<u8>), ResampleError> {
        debug!("Loading camera document from: {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| ResampleError::io(path, e))?;
        let document = Self::from_slice(&bytes)?;
        info!(
            "Camera document parsed: {} poses ({})",
            document.track.len(),
            document
                .track
                .layout()
                .map(|l| l.to_string())
                .unwrap_or_default()
        );
        Ok((document, bytes))
    }

    pub fn track(&self) -> &CameraTrack {
        &self.track
    }

    /// Same surrounding document, different track. Object documents record
    /// the source and target pose counts.
    pub fn with_track(&self, track: CameraTrack) -> Self {
        let root = match &self.root {
            DocumentRoot::Array => DocumentRoot::Array,
            DocumentRoot::Object { key, fields } => {
                let mut fields = fields.clone();
                fields.insert(
                    "original_num_poses".to_string(),
                    JsonValue::from(self.track.len()),
                );
                fields.insert("target_num_poses".to_string(), JsonValue::from(track.len()));
                DocumentRoot::Object { key: *key, fields }
            }
        };
        Self { root, track }
    }

    pub fn into_value(self) -> JsonValue {
        let records = JsonValue::Array(self.track.into_records());
        match self.root {
            DocumentRoot::Array => records,
            DocumentRoot::Object { key, mut fields } => {
                fields.insert(key.to_string(), records);
                JsonValue::Object(fields)
            }
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, ResampleError> {
        let mut bytes = serde_json::to_vec_pretty(&self.clone().into_value())
            .map_err(|e| ResampleError::malformed(format!("cannot serialize poses: {e}")))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
