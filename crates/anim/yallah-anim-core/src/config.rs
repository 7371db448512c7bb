//! Core configuration for yallah-anim-core.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for pose detection and channel validation.
/// Every field has a default so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vertical shoulder-to-wrist drop below which a rest skeleton counts as T-pose.
    pub pose_threshold: f64,
    /// Bone whose rest head marks the shoulder.
    pub shoulder_bone: String,
    /// Bone whose rest tail marks the wrist.
    pub wrist_bone: String,
    /// Largest tolerated difference between component timestamps at one keyframe index.
    pub timestamp_epsilon: f64,
    /// Normalize non-unit offsets when building tables instead of rejecting them.
    pub normalize_offsets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pose_threshold: 0.1,
            shoulder_bone: "upperarm_L".to_string(),
            wrist_bone: "lowerarm_L".to_string(),
            timestamp_epsilon: 1e-4,
            normalize_offsets: true,
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
