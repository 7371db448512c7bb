//! Yallah Anim Core (host-agnostic)
//!
//! Retargets character rig animations onto generated avatars by
//! pre-multiplying per-bone corrective rotations into quaternion rotation
//! curves. The crate owns the numeric part only: hosts supply rotation
//! channels (or an exported action), an offset table, and a hook to refresh
//! whatever interpolation state they derive from curve values.

pub mod action;
pub mod apply;
pub mod config;
pub mod data;
pub mod error;
pub mod offsets;
pub mod pose;
pub mod quat;

// Re-exports for consumers (CLI, host adapters)
pub use action::{location_data_path, rotation_bone, rotation_data_path, Action};
pub use apply::{apply_offsets, offset_channels, ApplyReport, CurveRefresh, RecomputeHandles};
pub use config::Config;
pub use data::{ChannelMap, Curve, Handles, Keyframe, QuatComponent, RotationChannel};
pub use error::{Error, Result};
pub use offsets::{OffsetTable, Preset};
pub use pose::{
    classify_rest_pose, offsets_for_skeleton, shoulder_wrist_drop, RestBone, RestPose, RestSkeleton,
};
pub use quat::Quat;
