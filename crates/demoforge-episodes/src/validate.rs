//! Numerical and shape checks on one episode's arrays.

use crate::schema::{DELTA_EEF, EEF_POSE, FRAME_INDEX, PROPRIO, TIMESTAMPS};
use crate::store::{ArrayData, Group};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A data-quality problem found in one episode.
///
/// Serialized with the exact tag strings used in validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueTag {
    #[serde(rename = "length_mismatch")]
    LengthMismatch,
    #[serde(rename = "delta_eef_non_finite")]
    DeltaEefNonFinite,
    #[serde(rename = "proprio_non_finite")]
    ProprioNonFinite,
    #[serde(rename = "eef_pose_non_finite")]
    EefPoseNonFinite,
    #[serde(rename = "frame_index_not_monotonic")]
    FrameIndexNotMonotonic,
    #[serde(rename = "timestamps_not_monotonic")]
    TimestampsNotMonotonic,
    #[serde(rename = "delta_eef_shape_not_Tx6")]
    DeltaEefShapeNotTx6,
    /// Resolved video file does not exist. Added by the validate stage.
    #[serde(rename = "video_file_missing")]
    VideoFileMissing,
}

impl IssueTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueTag::LengthMismatch => "length_mismatch",
            IssueTag::DeltaEefNonFinite => "delta_eef_non_finite",
            IssueTag::ProprioNonFinite => "proprio_non_finite",
            IssueTag::EefPoseNonFinite => "eef_pose_non_finite",
            IssueTag::FrameIndexNotMonotonic => "frame_index_not_monotonic",
            IssueTag::TimestampsNotMonotonic => "timestamps_not_monotonic",
            IssueTag::DeltaEefShapeNotTx6 => "delta_eef_shape_not_Tx6",
            IssueTag::VideoFileMissing => "video_file_missing",
        }
    }
}

impl fmt::Display for IssueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of action columns each step must carry.
pub const DELTA_EEF_WIDTH: usize = 6;

fn steps(array: &ArrayData, path: &str) -> Result<usize> {
    array
        .len()
        .ok_or_else(|| Error::invalid_shape(path, "expected a per-step array, found a scalar"))
}

/// Check one episode group and return every issue found, in a fixed order.
///
/// Only structurally absent fields are errors; everything else is a tag.
pub fn validate_episode_arrays(episode: &dyn Group) -> Result<Vec<IssueTag>> {
    let delta_eef = episode.array(DELTA_EEF)?;
    let proprio = episode.array(PROPRIO)?;
    let eef_pose = episode.array(EEF_POSE)?;
    let frame_index = episode.array(FRAME_INDEX)?;
    let timestamps = episode.array(TIMESTAMPS)?;

    let length = steps(&delta_eef, DELTA_EEF)?;
    let lengths = [
        steps(&proprio, PROPRIO)?,
        steps(&eef_pose, EEF_POSE)?,
        steps(&frame_index, FRAME_INDEX)?,
        steps(&timestamps, TIMESTAMPS)?,
    ];

    let mut issues = Vec::new();
    if lengths.iter().any(|&n| n != length) {
        issues.push(IssueTag::LengthMismatch);
    }
    if !delta_eef.all_finite() {
        issues.push(IssueTag::DeltaEefNonFinite);
    }
    if !proprio.all_finite() {
        issues.push(IssueTag::ProprioNonFinite);
    }
    if !eef_pose.all_finite() {
        issues.push(IssueTag::EefPoseNonFinite);
    }
    if !frame_index.is_non_decreasing() {
        issues.push(IssueTag::FrameIndexNotMonotonic);
    }
    if !timestamps.is_non_decreasing() {
        issues.push(IssueTag::TimestampsNotMonotonic);
    }
    if delta_eef.ndim() != 2 || delta_eef.shape()[1] != DELTA_EEF_WIDTH {
        issues.push(IssueTag::DeltaEefShapeNotTx6);
    }

    Ok(issues)
}
