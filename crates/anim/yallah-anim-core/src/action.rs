//! Exported action data.
//!
//! The interchange format maps each animated property's data path to its
//! curves by array index, each curve a list of `[time, value]` pairs:
//!
//! ```json
//! { "pose.bones[\"head\"].rotation_quaternion": { "0": [[1.0, 1.0]], "1": [[1.0, 0.0]] } }
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::apply::{apply_offsets, ApplyReport, CurveRefresh};
use crate::config::Config;
use crate::data::{ChannelMap, Curve, QuatComponent, RotationChannel};
use crate::error::{Error, Result};
use crate::offsets::OffsetTable;

const BONE_PREFIX: &str = "pose.bones[\"";
const ROTATION_SUFFIX: &str = "\"].rotation_quaternion";
const LOCATION_SUFFIX: &str = "\"].location";

/// Data path of a bone's quaternion rotation.
pub fn rotation_data_path(bone: &str) -> String {
    format!("{BONE_PREFIX}{bone}{ROTATION_SUFFIX}")
}

/// Data path of a bone's location.
pub fn location_data_path(bone: &str) -> String {
    format!("{BONE_PREFIX}{bone}{LOCATION_SUFFIX}")
}

/// Bone name of a quaternion rotation data path, if it is one.
pub fn rotation_bone(data_path: &str) -> Option<&str> {
    data_path
        .strip_prefix(BONE_PREFIX)?
        .strip_suffix(ROTATION_SUFFIX)
}

/// Curves of one animation, keyed by data path then array index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action {
    #[serde(skip)]
    pub name: String,
    pub curves: IndexMap<String, BTreeMap<usize, Curve>>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curves: IndexMap::new(),
        }
    }

    /// Parse exported action JSON. Curves arrive without cached handles and
    /// are brought up to date.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let mut action: Action = serde_json::from_str(s)?;
        for curve in action.curves.values_mut().flat_map(|m| m.values_mut()) {
            curve.update();
        }
        Ok(action)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn curve(&self, data_path: &str, index: usize) -> Option<&Curve> {
        self.curves.get(data_path)?.get(&index)
    }

    pub fn curve_mut(&mut self, data_path: &str, index: usize) -> Option<&mut Curve> {
        self.curves.get_mut(data_path)?.get_mut(&index)
    }

    pub fn insert_curve(&mut self, data_path: impl Into<String>, index: usize, curve: Curve) {
        self.curves
            .entry(data_path.into())
            .or_default()
            .insert(index, curve);
    }

    /// Bones that have all four quaternion rotation curves.
    pub fn rotation_bones(&self) -> Vec<&str> {
        self.curves
            .iter()
            .filter(|(_, by_index)| {
                QuatComponent::ALL
                    .iter()
                    .all(|c| by_index.contains_key(&c.index()))
            })
            .filter_map(|(path, _)| rotation_bone(path))
            .collect()
    }

    /// Copy out every complete quaternion rotation channel.
    pub fn rotation_channels(&self) -> ChannelMap {
        let mut out = ChannelMap::new();
        for bone in self.rotation_bones() {
            let path = rotation_data_path(bone);
            let pick = |c: QuatComponent| {
                self.curve(&path, c.index())
                    .cloned()
                    .unwrap_or_default()
            };
            out.insert(
                bone.to_string(),
                RotationChannel::new(
                    pick(QuatComponent::W),
                    pick(QuatComponent::X),
                    pick(QuatComponent::Y),
                    pick(QuatComponent::Z),
                ),
            );
        }
        out
    }

    /// Write channels back, replacing the rotation curves of each bone.
    pub fn store_rotation_channels(&mut self, channels: &ChannelMap) {
        for (bone, channel) in channels {
            let path = rotation_data_path(bone);
            for c in QuatComponent::ALL {
                self.insert_curve(path.clone(), c.index(), channel.curve(c).clone());
            }
        }
    }

    /// Apply `offsets` to this action's rotation channels. Nothing is written
    /// back unless every listed bone validates.
    pub fn apply_offsets<R: CurveRefresh + ?Sized>(
        &mut self,
        offsets: &OffsetTable,
        config: &Config,
        refresh: &mut R,
    ) -> Result<ApplyReport> {
        let mut channels = self.rotation_channels();
        channels.retain(|bone, _| offsets.get(bone).is_some());
        let report = apply_offsets(&mut channels, offsets, config, refresh)?;
        self.store_rotation_channels(&channels);
        Ok(report)
    }

    /// Add `delta` to every value of one curve, e.g. to lower a root bone's
    /// height track. Timestamps are unchanged; handles are recomputed.
    pub fn shift_values(&mut self, data_path: &str, index: usize, delta: f64) -> Result<usize> {
        let curve = self
            .curve_mut(data_path, index)
            .ok_or_else(|| Error::MissingCurve {
                data_path: data_path.to_string(),
                index,
            })?;
        curve.shift_values(delta);
        curve.update();
        log::info!("shifted {} keyframes of {data_path}[{index}] by {delta}", curve.len());
        Ok(curve.len())
    }
}
