//! Rest-pose detection for generated rigs.
//!
//! A rig finalized in T-pose holds its arms level, so the wrist sits at
//! roughly shoulder height; in A-pose the wrist hangs well below it.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::offsets::{OffsetTable, Preset};

/// Rest position of one bone in armature space (Z up).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestBone {
    pub head: [f64; 3],
    pub tail: [f64; 3],
}

/// Rest positions of a rig's bones, by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RestSkeleton {
    pub bones: HashMap<String, RestBone>,
}

impl RestSkeleton {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn bone(&self, name: &str) -> Result<&RestBone> {
        self.bones.get(name).ok_or_else(|| Error::MissingRestBone {
            bone: name.to_string(),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestPose {
    T,
    A,
}

impl RestPose {
    /// Offset preset calibrated for this rest pose.
    pub fn preset(self) -> Preset {
        match self {
            RestPose::T => Preset::TPose,
            RestPose::A => Preset::APose,
        }
    }
}

/// Height of the shoulder (rest head of `config.shoulder_bone`) above the
/// wrist (rest tail of `config.wrist_bone`).
pub fn shoulder_wrist_drop(skeleton: &RestSkeleton, config: &Config) -> Result<f64> {
    let shoulder = skeleton.bone(&config.shoulder_bone)?.head;
    let wrist = skeleton.bone(&config.wrist_bone)?.tail;
    Ok(shoulder[2] - wrist[2])
}

/// T-pose when the shoulder-to-wrist drop is below `config.pose_threshold`.
pub fn classify_rest_pose(skeleton: &RestSkeleton, config: &Config) -> Result<RestPose> {
    let drop = shoulder_wrist_drop(skeleton, config)?;
    let pose = if drop < config.pose_threshold {
        RestPose::T
    } else {
        RestPose::A
    };
    log::info!("rest pose {pose:?} (shoulder-wrist drop {drop:.4})");
    Ok(pose)
}

/// Detect the rest pose and return the matching built-in offset table.
pub fn offsets_for_skeleton(skeleton: &RestSkeleton, config: &Config) -> Result<OffsetTable> {
    let pose = classify_rest_pose(skeleton, config)?;
    Ok(OffsetTable::preset(pose.preset()))
}
