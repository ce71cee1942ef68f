use demoforge_episodes::SchemaCheck;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub reason: ReasonConfig,
}

/// Data layout shared by every stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_incoming_hdf5")]
    pub incoming_hdf5: PathBuf,

    #[serde(default = "default_canonical_hdf5")]
    pub canonical_hdf5: PathBuf,

    /// Root that stored video paths are resolved against.
    #[serde(default = "default_video_root")]
    pub video_root: PathBuf,

    /// Where exported per-episode clips are written.
    #[serde(default = "default_original_videos_dir")]
    pub original_videos_dir: PathBuf,

    /// Where augmented clips are expected to land.
    #[serde(default = "default_augmented_videos_dir")]
    pub augmented_videos_dir: PathBuf,

    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,
}

fn default_incoming_hdf5() -> PathBuf {
    PathBuf::from("data/hdf5/incoming/demos.hdf5")
}
fn default_canonical_hdf5() -> PathBuf {
    PathBuf::from("data/hdf5/demos.hdf5")
}
fn default_video_root() -> PathBuf {
    PathBuf::from("data/videos/incoming")
}
fn default_original_videos_dir() -> PathBuf {
    PathBuf::from("data/videos/original")
}
fn default_augmented_videos_dir() -> PathBuf {
    PathBuf::from("data/videos/augmented")
}
fn default_manifests_dir() -> PathBuf {
    PathBuf::from("data/manifests")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            incoming_hdf5: default_incoming_hdf5(),
            canonical_hdf5: default_canonical_hdf5(),
            video_root: default_video_root(),
            original_videos_dir: default_original_videos_dir(),
            augmented_videos_dir: default_augmented_videos_dir(),
            manifests_dir: default_manifests_dir(),
        }
    }
}

impl PathsConfig {
    /// Path of a named file inside the manifests directory.
    pub fn manifest(&self, name: &str) -> PathBuf {
        self.manifests_dir.join(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Check only the first episode (`first`) or every episode (`all`).
    #[serde(default)]
    pub schema_check: SchemaCheck,

    /// Persisted id assignments for non-numeric episode keys.
    #[serde(default)]
    pub key_map: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,

    #[serde(default)]
    pub overwrite: bool,
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}
fn default_video_codec() -> String {
    "libx264".to_string()
}
fn default_preset() -> String {
    "fast".to_string()
}
fn default_crf() -> u8 {
    18
}
fn default_pix_fmt() -> String {
    "yuv420p".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: default_ffmpeg_bin(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            pix_fmt: default_pix_fmt(),
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferConfig {
    #[serde(default = "default_video_glob")]
    pub video_glob: String,

    #[serde(default = "default_variants_per_demo")]
    pub variants_per_demo: u32,

    #[serde(default = "default_base_seed")]
    pub base_seed: u64,

    /// Cycled across variants of each demo.
    #[serde(default = "default_prompt_profiles")]
    pub prompt_profiles: Vec<String>,

    #[serde(default = "default_run_root")]
    pub run_root: PathBuf,

    #[serde(default = "default_remote_input_root")]
    pub remote_input_root: String,

    #[serde(default = "default_remote_output_root")]
    pub remote_output_root: String,
}

fn default_video_glob() -> String {
    "demo_*_*.mp4".to_string()
}
fn default_variants_per_demo() -> u32 {
    3
}
fn default_base_seed() -> u64 {
    1000
}
fn default_prompt_profiles() -> Vec<String> {
    vec![
        "lighting".to_string(),
        "texture".to_string(),
        "sensor".to_string(),
    ]
}
fn default_run_root() -> PathBuf {
    PathBuf::from("data/manifests/transfer_runs")
}
fn default_remote_input_root() -> String {
    "/workspace/so101/transfer_input".to_string()
}
fn default_remote_output_root() -> String {
    "/workspace/so101/transfer_output".to_string()
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            video_glob: default_video_glob(),
            variants_per_demo: default_variants_per_demo(),
            base_seed: default_base_seed(),
            prompt_profiles: default_prompt_profiles(),
            run_root: default_run_root(),
            remote_input_root: default_remote_input_root(),
            remote_output_root: default_remote_output_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BudgetConfig {
    #[serde(default = "default_num_gpus")]
    pub pilot_num_gpus: u32,

    #[serde(default = "default_num_gpus")]
    pub target_num_gpus: u32,

    #[serde(default = "default_gpu_power_watts")]
    pub avg_gpu_power_watts: f64,

    #[serde(default)]
    pub gpu_hours_budget: Option<f64>,

    #[serde(default)]
    pub wall_hours_budget: Option<f64>,

    #[serde(default)]
    pub energy_kwh_budget: Option<f64>,
}

fn default_num_gpus() -> u32 {
    1
}
fn default_gpu_power_watts() -> f64 {
    350.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            pilot_num_gpus: default_num_gpus(),
            target_num_gpus: default_num_gpus(),
            avg_gpu_power_watts: default_gpu_power_watts(),
            gpu_hours_budget: None,
            wall_hours_budget: None,
            energy_kwh_budget: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReasonConfig {
    #[serde(default = "default_true")]
    pub include_original: bool,

    /// Fraction of augmented jobs sampled per task group.
    #[serde(default = "default_sample_ratio")]
    pub augmented_sample_ratio: f64,

    #[serde(default)]
    pub augmented_sample_max: Option<usize>,

    #[serde(default)]
    pub seed: u64,

    #[serde(default = "default_keyframes")]
    pub keyframes: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_sample_ratio() -> f64 {
    0.25
}
fn default_keyframes() -> Vec<String> {
    vec!["start".to_string(), "mid".to_string(), "end".to_string()]
}

impl Default for ReasonConfig {
    fn default() -> Self {
        Self {
            include_original: true,
            augmented_sample_ratio: default_sample_ratio(),
            augmented_sample_max: None,
            seed: 0,
            keyframes: default_keyframes(),
        }
    }
}

/// Split a comma separated CLI list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Display helper for optional paths in summaries.
pub fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}
