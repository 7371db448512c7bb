//! Per-bone rotation offset tables.
//!
//! Each entry is the constant corrective rotation, in bone local space, that
//! aligns a generated rig with the reference skeleton an animation was
//! authored for. Tables are built once and read-only while offsets apply.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::quat::{Quat, QUAT_EPSILON};

const Z_AXIS: [f64; 3] = [0.0, 0.0, 1.0];
const X_AXIS: [f64; 3] = [1.0, 0.0, 0.0];

/// Ordered bone name -> offset mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OffsetTable {
    entries: IndexMap<String, Quat>,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the offset for `bone`. Offsets must be finite and
    /// non-zero; a non-unit offset is normalized.
    pub fn insert(&mut self, bone: impl Into<String>, offset: Quat) -> Result<()> {
        let bone = bone.into();
        let unit = unit_offset(&bone, offset, true)?;
        if self.entries.insert(bone.clone(), unit).is_some() {
            log::warn!("offset for bone '{bone}' replaced");
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, bone: &str) -> Option<Quat> {
        self.entries.get(bone).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bones(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Quat)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The inverse table: applying it after this one restores the original samples.
    pub fn inverted(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(bone, q)| (bone.clone(), q.inverse()))
                .collect(),
        }
    }

    /// Build a table from `(bone, offset)` pairs with the same checks as
    /// [`OffsetTable::insert`]; later duplicates win.
    pub fn try_from_iter<I, S>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Quat)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (bone, offset) in iter {
            table.insert(bone, offset)?;
        }
        Ok(table)
    }

    /// Parse a JSON table with default configuration.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json_str_with_config(s, &Config::default())
    }

    /// Parse a JSON object whose values are `{w,x,y,z}` objects,
    /// `[w,x,y,z]` arrays, or lists of `{axis, degrees}` rotations composed
    /// left to right. With `normalize_offsets` off, non-unit offsets are rejected.
    pub fn from_json_str_with_config(s: &str, config: &Config) -> Result<Self> {
        let raw: IndexMap<String, RawOffset> = serde_json::from_str(s)?;
        let mut entries = IndexMap::with_capacity(raw.len());
        for (bone, spec) in raw {
            let q = unit_offset(&bone, spec.to_quat(), config.normalize_offsets)?;
            entries.insert(bone, q);
        }
        Ok(Self { entries })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Built-in table for `preset`.
    pub fn preset(preset: Preset) -> Self {
        let rows: &[(&str, f64, f64)] = match preset {
            Preset::TPose => T_POSE,
            Preset::APose => A_POSE,
            Preset::TPoseTwist => T_POSE_TWIST,
        };
        Self {
            entries: rows
                .iter()
                .map(|&(bone, z_deg, x_deg)| (bone.to_string(), z_then_x(z_deg, x_deg)))
                .collect(),
        }
    }
}

fn unit_offset(bone: &str, q: Quat, normalize: bool) -> Result<Quat> {
    let invalid = |reason: &str| Error::InvalidOffset {
        bone: bone.to_string(),
        reason: reason.to_string(),
    };
    if !q.is_finite() {
        return Err(invalid("non-finite component"));
    }
    if q.is_unit(QUAT_EPSILON) {
        return Ok(q);
    }
    if !normalize {
        return Err(invalid(&format!("norm {} is not 1", q.norm())));
    }
    let unit = q.try_normalize().ok_or_else(|| invalid("zero quaternion"))?;
    log::warn!("offset for bone '{bone}' normalized from norm {}", q.norm());
    Ok(unit)
}

/// `Rz(z_deg) * Rx(x_deg)`, the order the reference tables were tuned in.
fn z_then_x(z_deg: f64, x_deg: f64) -> Quat {
    Quat::from_axis_degrees(Z_AXIS, z_deg) * Quat::from_axis_degrees(X_AXIS, x_deg)
}

/// Reference skeleton calibration a built-in table targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Rig finalized in T-pose.
    TPose,
    /// Rig finalized in A-pose.
    APose,
    /// T-pose rig that also animates the arm twist bones.
    TPoseTwist,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::TPose, Preset::APose, Preset::TPoseTwist];

    pub fn name(self) -> &'static str {
        match self {
            Preset::TPose => "t-pose",
            Preset::APose => "a-pose",
            Preset::TPoseTwist => "t-pose-twist",
        }
    }
}

// (bone, degrees about Z, degrees about X), tuned by hand against Mixamo's
// reference skeleton. Parents must be adjusted before children.
const T_POSE: &[(&str, f64, f64)] = &[
    ("thigh_L", 1.8, 0.0),
    ("upperarm_L", 3.8, 4.8),
    ("lowerarm_L", -3.8, -14.5),
    ("thigh_R", -1.8, 0.0),
    ("upperarm_R", -3.8, 4.8),
    ("lowerarm_R", 3.8, -14.5),
];

const A_POSE: &[(&str, f64, f64)] = &[
    ("thigh_L", -6.3, 0.0),
    ("clavicle_L", 6.0, 0.0),
    ("upperarm_L", 24.0, 6.0),
    ("lowerarm_L", -3.8, -14.5),
    ("thigh_R", 6.3, 0.0),
    ("clavicle_R", -6.0, 0.0),
    ("upperarm_R", -24.0, 6.0),
    ("lowerarm_R", 3.8, -14.5),
];

const T_POSE_TWIST: &[(&str, f64, f64)] = &[
    ("thigh_L", 1.8, 0.0),
    ("upperarm_L", 3.8, 4.8),
    ("upperarm_twist_L", 3.8, 4.8),
    ("lowerarm_L", -3.8, -14.5),
    ("lowerarm_twist_L", -3.8, -14.5),
    ("thigh_R", -1.8, 0.0),
    ("upperarm_R", -3.8, 4.8),
    ("upperarm_twist_R", -3.8, 4.8),
    ("lowerarm_R", 3.8, -14.5),
    ("lowerarm_twist_R", 3.8, -14.5),
];

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOffset {
    Components { w: f64, x: f64, y: f64, z: f64 },
    Array([f64; 4]),
    Rotations(Vec<AxisDegrees>),
}

#[derive(Debug, Deserialize)]
struct AxisDegrees {
    axis: [f64; 3],
    degrees: f64,
}

impl RawOffset {
    fn to_quat(&self) -> Quat {
        match self {
            RawOffset::Components { w, x, y, z } => Quat::new(*w, *x, *y, *z),
            RawOffset::Array(q) => Quat::from_array(*q),
            RawOffset::Rotations(steps) => steps.iter().fold(Quat::IDENTITY, |acc, r| {
                acc * Quat::from_axis_degrees(r.axis, r.degrees)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_hold_reference_bones() {
        let t = OffsetTable::preset(Preset::TPose);
        assert_eq!(
            t.bones().collect::<Vec<_>>(),
            vec!["thigh_L", "upperarm_L", "lowerarm_L", "thigh_R", "upperarm_R", "lowerarm_R"]
        );
        assert_eq!(OffsetTable::preset(Preset::APose).len(), 8);
        assert_eq!(OffsetTable::preset(Preset::TPoseTwist).len(), 10);
        for p in Preset::ALL {
            for (_, q) in OffsetTable::preset(p).iter() {
                assert!(q.is_unit(1e-12));
            }
        }
    }

    #[test]
    fn preset_composes_z_then_x() {
        let t = OffsetTable::preset(Preset::TPose);
        let expected = Quat::from_axis_degrees(Z_AXIS, 3.8) * Quat::from_axis_degrees(X_AXIS, 4.8);
        assert_eq!(t.get("upperarm_L"), Some(expected));
        let thigh = t.get("thigh_L").unwrap();
        let half = 1.8f64.to_radians() / 2.0;
        assert!(thigh.abs_diff_eq(Quat::new(half.cos(), 0.0, 0.0, half.sin()), 1e-12));
    }

    #[test]
    fn parses_every_offset_shape() {
        let json = r#"{
            "hips": { "w": 1, "x": 0, "y": 0, "z": 0 },
            "spine01": [0.0, 0.0, 0.0, 1.0],
            "upperarm_L": [
                { "axis": [0, 0, 1], "degrees": 3.8 },
                { "axis": [1, 0, 0], "degrees": 4.8 }
            ]
        }"#;
        let table = OffsetTable::from_json_str(json).unwrap();
        assert_eq!(table.bones().collect::<Vec<_>>(), vec!["hips", "spine01", "upperarm_L"]);
        assert_eq!(table.get("hips"), Some(Quat::IDENTITY));
        assert_eq!(table.get("spine01"), Some(Quat::new(0.0, 0.0, 0.0, 1.0)));
        let preset = OffsetTable::preset(Preset::TPose);
        assert!(table
            .get("upperarm_L")
            .unwrap()
            .abs_diff_eq(preset.get("upperarm_L").unwrap(), 1e-12));
    }

    #[test]
    fn normalizes_or_rejects_non_unit() {
        let json = r#"{ "hips": [2.0, 0.0, 0.0, 0.0] }"#;
        let table = OffsetTable::from_json_str(json).unwrap();
        assert_eq!(table.get("hips"), Some(Quat::IDENTITY));

        let strict = Config {
            normalize_offsets: false,
            ..Config::default()
        };
        let err = OffsetTable::from_json_str_with_config(json, &strict).unwrap_err();
        assert!(matches!(err, Error::InvalidOffset { ref bone, .. } if bone == "hips"));

        let zero = r#"{ "hips": [0.0, 0.0, 0.0, 0.0] }"#;
        assert!(matches!(
            OffsetTable::from_json_str(zero),
            Err(Error::InvalidOffset { .. })
        ));
    }

    #[test]
    fn insert_replaces_existing_bone() {
        let mut t = OffsetTable::new();
        t.insert("head", Quat::IDENTITY).unwrap();
        t.insert("head", Quat::new(0.0, 1.0, 0.0, 0.0)).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("head"), Some(Quat::new(0.0, 1.0, 0.0, 0.0)));
    }

    #[test]
    fn pairs_are_normalized_before_use() {
        let table = OffsetTable::try_from_iter([("head", Quat::new(2.0, 0.0, 0.0, 0.0))]).unwrap();
        assert_eq!(table.get("head"), Some(Quat::IDENTITY));

        let tilt = Quat::new(3.0, 0.0, 0.0, 4.0);
        let table = OffsetTable::try_from_iter([("neck", tilt)]).unwrap();
        let roundtrip = table.get("neck").unwrap() * table.inverted().get("neck").unwrap();
        assert!(roundtrip.abs_diff_eq(Quat::IDENTITY, 1e-12));

        let err = OffsetTable::try_from_iter([("head", Quat::new(0.0, 0.0, 0.0, 0.0))]).unwrap_err();
        assert!(matches!(err, Error::InvalidOffset { ref bone, .. } if bone == "head"));
        assert!(OffsetTable::try_from_iter([("head", Quat::new(f64::INFINITY, 0.0, 0.0, 0.0))]).is_err());
    }

    #[test]
    fn json_output_reloads() {
        let t = OffsetTable::preset(Preset::APose);
        let back = OffsetTable::from_json_str(&t.to_json_string().unwrap()).unwrap();
        for (bone, q) in t.iter() {
            assert!(back.get(bone).unwrap().abs_diff_eq(q, 1e-12));
        }
    }
}
