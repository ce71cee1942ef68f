//! Row and report types exchanged between pipeline stages.
//!
//! Every stage writes JSONL manifests and a pretty JSON report; later stages
//! read earlier manifests back, so the readers here are lenient about fields
//! they do not need.

use demoforge_common::DemoId;
use demoforge_episodes::{EpisodeView, IssueTag};
use serde::{Deserialize, Serialize};

/// Current time as an RFC 3339 UTC timestamp.
pub fn utc_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// One line of the episode manifest written by `validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeManifestRow {
    pub demo_id: DemoId,
    pub episode_key: String,
    pub num_steps: usize,
    pub task_text: String,
    pub video_path_hdf5: String,
    pub video_path_resolved: String,
    pub video_exists: bool,
    pub from_timestamp: f64,
    pub to_timestamp: f64,
    pub fps: f64,
    /// Name the exporter will give this episode's clip.
    pub expected_export_name: String,
}

impl EpisodeManifestRow {
    pub fn from_view(view: &EpisodeView, video_exists: bool) -> Self {
        Self {
            demo_id: view.demo_id,
            episode_key: view.episode_key.clone(),
            num_steps: view.num_steps,
            task_text: view.task_text.clone(),
            video_path_hdf5: view.video_path_hdf5.clone(),
            video_path_resolved: view.video_path_resolved.display().to_string(),
            video_exists,
            from_timestamp: view.from_timestamp,
            to_timestamp: view.to_timestamp,
            fps: view.fps,
            expected_export_name: demoforge_common::paths::export_file_name(view.demo_id, "front"),
        }
    }
}

/// Issues found in one episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub demo_id: DemoId,
    pub episode_key: String,
    pub issues: Vec<IssueTag>,
}

/// Outcome of exporting one episode clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Exported,
    SkippedExisting,
    MissingSource,
    Failed,
}

/// One line of the export manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifestRow {
    pub demo_id: DemoId,
    pub episode_key: String,
    pub task_text: String,
    pub source_video_path: String,
    pub output_video_path: String,
    pub output_video_name: String,
    pub camera_key: String,
    pub fps: f64,
    pub from_timestamp: f64,
    pub to_timestamp: f64,
    pub num_steps: usize,
    pub status: ExportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload written to `requests/job_NNNNNN.json` for the transfer service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub run_id: String,
    pub job_id: String,
    pub demo_id: DemoId,
    pub variant_idx: u32,
    pub prompt_profile: String,
    pub seed: u64,
    pub local_input_video: String,
    pub local_expected_output_video: String,
    pub remote_input_video: String,
    pub remote_expected_output_video: String,
    pub notes: Vec<String>,
}

/// One line of `transfer_jobs.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferJobRecord {
    pub run_id: String,
    pub job_id: String,
    pub demo_id: DemoId,
    pub variant_idx: u32,
    pub camera_key: String,
    pub seed: u64,
    pub prompt_profile: String,
    pub input_video: String,
    pub expected_output_video: String,
    pub request_json: String,
}

/// One line of `transfer_expected_outputs.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedOutputRecord {
    pub run_id: String,
    pub job_id: String,
    pub demo_id: DemoId,
    pub variant_idx: u32,
    pub expected_output_filename: String,
    pub expected_output_video: String,
}

/// An original-episode row as read back by later stages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OriginalEpisodeRow {
    pub demo_id: DemoId,
    #[serde(default)]
    pub task_text: String,
    #[serde(default)]
    pub expected_export_name: Option<String>,
    #[serde(default)]
    pub video_path_resolved: Option<String>,
}

/// A transfer job as read back by the labeling sampler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AugmentedJobRow {
    pub demo_id: DemoId,
    pub variant_idx: u32,
    pub expected_output_video: String,
    #[serde(default)]
    pub prompt_profile: String,
    #[serde(default = "missing_seed")]
    pub seed: i64,
}

fn missing_seed() -> i64 {
    -1
}

/// Timing fields the budget estimator needs from any episode manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimingRow {
    #[serde(default)]
    pub from_timestamp: Option<f64>,
    #[serde(default)]
    pub to_timestamp: Option<f64>,
    #[serde(default)]
    pub num_steps: Option<f64>,
    #[serde(default)]
    pub fps: Option<f64>,
}

impl TimingRow {
    /// Clip seconds from the timestamps, else from `num_steps / fps`.
    pub fn input_seconds(&self) -> Option<f64> {
        match (self.from_timestamp, self.to_timestamp, self.num_steps, self.fps) {
            (Some(from), Some(to), _, _) => Some(to - from),
            (_, _, Some(steps), Some(fps)) => Some(steps / fps),
            _ => None,
        }
    }
}

/// Where a labeling request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Original,
    Augmented,
}

/// One line of the labeling request manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonRequest {
    pub request_id: String,
    pub source_type: SourceType,
    pub demo_id: DemoId,
    pub variant_idx: Option<u32>,
    pub task_text: String,
    pub video_path: String,
    pub keyframes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}
