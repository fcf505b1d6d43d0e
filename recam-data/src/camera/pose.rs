//! Camera pose records and the JSON layouts they are read from.
//!
//! A record is either a bare 4x4 (or 3x4) row-major camera matrix, an object
//! holding such a matrix under a well-known key, or an object with separate
//! translation and rotation fields. Fields the resampler does not understand
//! are carried through untouched.

use crate::error::ResampleError;
use glam::{DMat3, DQuat, DVec3};
use serde_json::{Value as JsonValue, json};
use std::fmt;

/// Scalar intrinsics that are blended alongside the pose when present.
pub const INTRINSIC_KEYS: [&str; 8] = [
    "fov",
    "fov_x",
    "fov_y",
    "fx",
    "fy",
    "cx",
    "cy",
    "focal_length",
];

const MATRIX_KEYS: [&str; 3] = ["transform_matrix", "extrinsic", "c2w"];
const TRANSLATION_KEYS: [&str; 2] = ["translation", "position"];
const ROTATION_KEY: &str = "rotation";

/// How a rotation is written inside a component record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationLayout {
    /// `[x, y, z, w]`
    Quaternion,
    /// 3x3 row-major matrix.
    Matrix,
}

/// How a pose is encoded in its JSON record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLayout {
    /// The record itself is a row-major matrix with `rows` rows of 4.
    Matrix { rows: usize },
    /// An object holding a row-major matrix under `key`.
    Keyed { key: &'static str, rows: usize },
    /// An object with a translation vector and a rotation.
    Components {
        translation_key: &'static str,
        rotation: RotationLayout,
    },
}

impl fmt::Display for PoseLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseLayout::Matrix { rows } => write!(f, "{rows}x4 matrix"),
            PoseLayout::Keyed { key, rows } => write!(f, "{rows}x4 matrix under '{key}'"),
            PoseLayout::Components {
                translation_key,
                rotation: RotationLayout::Quaternion,
            } => write!(f, "'{translation_key}' + quaternion rotation"),
            PoseLayout::Components {
                translation_key,
                rotation: RotationLayout::Matrix,
            } => write!(f, "'{translation_key}' + matrix rotation"),
        }
    }
}

/// One camera pose: extrinsics, optional scalar intrinsics, and the record it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose {
    /// Camera position.
    pub translation: DVec3,
    /// Unit orientation quaternion.
    pub rotation: DQuat,
    /// Intrinsic scalars present on the record, in [`INTRINSIC_KEYS`] order.
    pub intrinsics: Vec<(&'static str, f64)>,
    layout: PoseLayout,
    record: JsonValue,
}

impl CameraPose {
    /// Parse record `index` of a camera document.
    pub fn from_record(index: usize, record: JsonValue) -> Result<Self, ResampleError> {
        let malformed = |what: &str| ResampleError::malformed(format!("pose {index}: {what}"));

        match &record {
            JsonValue::Array(_) => {
                let rows = parse_rows::<4>(&record)
                    .filter(|rows| rows.len() == 3 || rows.len() == 4)
                    .ok_or_else(|| malformed("expected a 3x4 or 4x4 matrix"))?;
                let (translation, rotation) = split_matrix(&rows);
                Ok(Self {
                    translation,
                    rotation: normalized(rotation).ok_or_else(|| malformed("degenerate rotation"))?,
                    intrinsics: Vec::new(),
                    layout: PoseLayout::Matrix { rows: rows.len() },
                    record,
                })
            }
            JsonValue::Object(map) => {
                let intrinsics = INTRINSIC_KEYS
                    .iter()
                    .filter_map(|&key| map.get(key).and_then(JsonValue::as_f64).map(|v| (key, v)))
                    .collect();

                if let Some(&key) = MATRIX_KEYS.iter().find(|key| map.contains_key(**key)) {
                    let rows = parse_rows::<4>(&map[key])
                        .filter(|rows| rows.len() == 3 || rows.len() == 4)
                        .ok_or_else(|| malformed(&format!("'{key}' is not a 3x4 or 4x4 matrix")))?;
                    let (translation, rotation) = split_matrix(&rows);
                    return Ok(Self {
                        translation,
                        rotation: normalized(rotation)
                            .ok_or_else(|| malformed("degenerate rotation"))?,
                        intrinsics,
                        layout: PoseLayout::Keyed {
                            key,
                            rows: rows.len(),
                        },
                        record,
                    });
                }

                let translation_key = TRANSLATION_KEYS
                    .iter()
                    .copied()
                    .find(|key| map.contains_key(*key))
                    .ok_or_else(|| {
                        malformed("missing 'translation'/'position' or a camera matrix")
                    })?;
                let translation = parse_vec3(&map[translation_key])
                    .ok_or_else(|| malformed(&format!("'{translation_key}' is not [x, y, z]")))?;

                let raw_rotation = map
                    .get(ROTATION_KEY)
                    .ok_or_else(|| malformed("missing 'rotation'"))?;
                let (rotation, rotation_layout) = if let Some(q) = parse_array::<4>(raw_rotation) {
                    (
                        DQuat::from_xyzw(q[0], q[1], q[2], q[3]),
                        RotationLayout::Quaternion,
                    )
                } else if let Some(rows) = parse_rows::<3>(raw_rotation).filter(|r| r.len() == 3) {
                    (rotation_from_rows(&rows), RotationLayout::Matrix)
                } else {
                    return Err(malformed(
                        "'rotation' must be a quaternion [x, y, z, w] or a 3x3 matrix",
                    ));
                };

                Ok(Self {
                    translation,
                    rotation: normalized(rotation).ok_or_else(|| malformed("degenerate rotation"))?,
                    intrinsics,
                    layout: PoseLayout::Components {
                        translation_key,
                        rotation: rotation_layout,
                    },
                    record,
                })
            }
            _ => Err(malformed("expected a matrix or an object")),
        }
    }

    pub fn layout(&self) -> PoseLayout {
        self.layout
    }

    /// The JSON record for this pose.
    pub fn record(&self) -> &JsonValue {
        &self.record
    }

    pub fn into_record(self) -> JsonValue {
        self.record
    }

    pub fn intrinsic(&self, key: &str) -> Option<f64> {
        self.intrinsics
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Blend two poses at `weight` in `[0, 1]`.
    ///
    /// Translation and intrinsics are blended linearly, orientation by
    /// shortest-arc slerp. The record (and with it any opaque fields) is
    /// modelled on `template`, which must share the layout of `a` and `b`.
    pub fn interpolate(a: &Self, b: &Self, weight: f64, template: &Self) -> Self {
        let translation = a.translation.lerp(b.translation, weight);
        let rotation = a.rotation.slerp(b.rotation, weight).normalize();

        let intrinsics: Vec<(&'static str, f64)> = template
            .intrinsics
            .iter()
            .map(|&(key, fallback)| match (a.intrinsic(key), b.intrinsic(key)) {
                (Some(va), Some(vb)) => (key, va + (vb - va) * weight),
                _ => (key, fallback),
            })
            .collect();

        let record = render_record(
            template.layout,
            &template.record,
            translation,
            rotation,
            &intrinsics,
        );

        Self {
            translation,
            rotation,
            intrinsics,
            layout: template.layout,
            record,
        }
    }
}

/// Build a record in `layout`, starting from `template` for object layouts.
fn render_record(
    layout: PoseLayout,
    template: &JsonValue,
    translation: DVec3,
    rotation: DQuat,
    intrinsics: &[(&'static str, f64)],
) -> JsonValue {
    match layout {
        PoseLayout::Matrix { rows } => matrix_json(rows, translation, rotation),
        PoseLayout::Keyed { key, rows } => {
            let mut record = template.clone();
            if let Some(map) = record.as_object_mut() {
                map.insert(key.to_string(), matrix_json(rows, translation, rotation));
                for &(k, v) in intrinsics {
                    map.insert(k.to_string(), json!(v));
                }
            }
            record
        }
        PoseLayout::Components {
            translation_key,
            rotation: rotation_layout,
        } => {
            let mut record = template.clone();
            if let Some(map) = record.as_object_mut() {
                map.insert(
                    translation_key.to_string(),
                    json!([translation.x, translation.y, translation.z]),
                );
                let rotation_json = match rotation_layout {
                    RotationLayout::Quaternion => {
                        json!([rotation.x, rotation.y, rotation.z, rotation.w])
                    }
                    RotationLayout::Matrix => {
                        let m = DMat3::from_quat(rotation);
                        JsonValue::Array((0..3).map(|r| row_json(m.row(r))).collect())
                    }
                };
                map.insert(ROTATION_KEY.to_string(), rotation_json);
                for &(k, v) in intrinsics {
                    map.insert(k.to_string(), json!(v));
                }
            }
            record
        }
    }
}

fn row_json(row: DVec3) -> JsonValue {
    json!([row.x, row.y, row.z])
}

fn matrix_json(rows: usize, translation: DVec3, rotation: DQuat) -> JsonValue {
    let m = DMat3::from_quat(rotation);
    let mut out: Vec<JsonValue> = (0..3)
        .map(|r| {
            let row = m.row(r);
            json!([row.x, row.y, row.z, translation[r]])
        })
        .collect();
    if rows == 4 {
        out.push(json!([0.0, 0.0, 0.0, 1.0]));
    }
    JsonValue::Array(out)
}

fn split_matrix(rows: &[[f64; 4]]) -> (DVec3, DQuat) {
    let rotation_rows = [
        [rows[0][0], rows[0][1], rows[0][2]],
        [rows[1][0], rows[1][1], rows[1][2]],
        [rows[2][0], rows[2][1], rows[2][2]],
    ];
    let translation = DVec3::new(rows[0][3], rows[1][3], rows[2][3]);
    (translation, rotation_from_rows(&rotation_rows))
}

fn rotation_from_rows(rows: &[[f64; 3]]) -> DQuat {
    let m = DMat3::from_cols_array_2d(&[rows[0], rows[1], rows[2]]).transpose();
    DQuat::from_mat3(&m)
}

fn normalized(q: DQuat) -> Option<DQuat> {
    let len = q.length();
    (len.is_finite() && len > 1e-12).then(|| q / len)
}

fn parse_array<const N: usize>(value: &JsonValue) -> Option<[f64; N]> {
    let items = value.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn parse_vec3(value: &JsonValue) -> Option<DVec3> {
    parse_array::<3>(value).map(DVec3::from_array)
}

fn parse_rows<const N: usize>(value: &JsonValue) -> Option<Vec<[f64; N]>> {
    value.as_array()?.iter().map(parse_array::<N>).collect()
}
