//! Error types for offset retargeting.

use thiserror::Error;

/// Errors produced while loading, validating, or applying rotation offsets.
///
/// Every variant is fatal for the call that produced it: batch operations
/// validate all inputs first and abort on the first error without touching
/// any channel.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A bone listed in the offset table has no rotation channel.
    #[error("no rotation channel for bone '{bone}'")]
    MissingChannel { bone: String },

    /// The four quaternion component curves disagree in sample count.
    #[error(
        "rotation curves of bone '{bone}' are unaligned: w={} x={} y={} z={}",
        .counts[0], .counts[1], .counts[2], .counts[3]
    )]
    UnalignedCurve { bone: String, counts: [usize; 4] },

    /// Same sample count, but the timestamps at one index differ.
    #[error(
        "rotation curves of bone '{bone}' disagree on keyframe {index} time: w={} x={} y={} z={}",
        .times[0], .times[1], .times[2], .times[3]
    )]
    MisalignedTimestamps {
        bone: String,
        index: usize,
        times: [f64; 4],
    },

    /// An offset quaternion that cannot represent a rotation.
    #[error("invalid offset for bone '{bone}': {reason}")]
    InvalidOffset { bone: String, reason: String },

    /// A bone needed for rest-pose detection is absent from the skeleton.
    #[error("rest skeleton has no bone '{bone}'")]
    MissingRestBone { bone: String },

    /// No curve exists at the given data path and array index.
    #[error("no curve at '{data_path}'[{index}]")]
    MissingCurve { data_path: String, index: usize },

    /// Malformed JSON input.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
