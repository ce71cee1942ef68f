//! Deterministic job bundle for the video augmentation service.

use crate::manifest::{utc_now, ExpectedOutputRecord, TransferJobRecord, TransferRequest};
use anyhow::{Context, Result};
use demoforge_common::checksum::{checksum_line, sha256_file};
use demoforge_common::json::{write_json_pretty, write_jsonl, write_lines};
use demoforge_common::paths::{augmented_file_name, parse_demo_filename};
use demoforge_common::{DemoId, JobId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Instructions carried in every request payload for the remote operator.
const REQUEST_NOTES: [&str; 2] = [
    "Map this request payload into the exact params schema used by the remote transfer service.",
    "Keep demo_id and variant_idx unchanged for deterministic import mapping.",
];

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub input_videos_dir: PathBuf,
    pub video_glob: String,
    pub variants_per_demo: u32,
    pub base_seed: u64,
    pub prompt_profiles: Vec<String>,
    /// Defaults to a UTC timestamp when unset.
    pub run_id: Option<String>,
    pub run_root: PathBuf,
    pub remote_input_root: String,
    pub remote_output_root: String,
    /// Local directory augmented clips are expected in.
    pub augmented_videos_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub generated_at_utc: String,
    pub run_id: String,
    pub input_videos_dir: String,
    pub video_glob: String,
    pub variants_per_demo: u32,
    pub prompt_profiles: Vec<String>,
    pub base_seed: u64,
    pub remote_input_root: String,
    pub remote_output_root: String,
    pub source_video_files: usize,
    pub unique_demo_ids: usize,
    pub jobs_total: usize,
    pub jobs_manifest: String,
    pub expected_outputs_manifest: String,
    pub input_checksums: String,
}

/// Seed for one variant of one demo.
pub fn job_seed(base_seed: u64, demo_id: DemoId, variant_idx: u32) -> u64 {
    base_seed
        .wrapping_add(demo_id.get().wrapping_mul(1000))
        .wrapping_add(u64::from(variant_idx))
}

/// Files under `dir` matching the glob `pattern`, sorted by path.
///
/// The pattern is relative to `dir` and may use `*`, `?`, `[...]` classes
/// and `**`. Directories are skipped.
pub fn list_videos(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir_str = dir.to_string_lossy();
    let full = format!("{}/{}", glob::Pattern::escape(&dir_str), pattern);
    let mut videos: Vec<PathBuf> = glob::glob(&full)
        .with_context(|| format!("Invalid video glob: {}", pattern))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    videos.sort();
    Ok(videos)
}

/// Build the run bundle under `run_root/run_id`.
pub fn run(opts: &TransferOptions) -> Result<(PathBuf, RunMetadata)> {
    if opts.variants_per_demo < 1 {
        anyhow::bail!("--variants-per-demo must be >= 1");
    }
    if opts.prompt_profiles.is_empty() {
        anyhow::bail!("--prompt-profiles must contain at least one value");
    }
    super::require_exists(&opts.input_videos_dir, "input videos dir")?;

    let input_videos = list_videos(&opts.input_videos_dir, &opts.video_glob)?;
    if input_videos.is_empty() {
        anyhow::bail!(
            "No videos found in {} with glob {}",
            opts.input_videos_dir.display(),
            opts.video_glob
        );
    }

    let run_id = opts
        .run_id
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().format("transfer_%Y%m%d_%H%M%S").to_string());
    let run_dir = opts.run_root.join(&run_id);
    let requests_dir = run_dir.join("requests");
    std::fs::create_dir_all(&requests_dir)
        .with_context(|| format!("Failed to create {:?}", requests_dir))?;

    let jobs_path = run_dir.join("transfer_jobs.jsonl");
    let expected_path = run_dir.join("transfer_expected_outputs.jsonl");
    let checksums_path = run_dir.join("transfer_input_checksums.sha256");
    let metadata_path = run_dir.join("run_metadata.json");

    let mut jobs = Vec::new();
    let mut expected = Vec::new();
    let mut checksums = Vec::new();
    let mut demo_ids = BTreeSet::new();
    let mut job_id = JobId::default();

    for video in &input_videos {
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some((demo_id, camera_key)) = parse_demo_filename(&file_name) else {
            tracing::debug!("Skipping {:?}: not a demo clip name", file_name);
            continue;
        };
        demo_ids.insert(demo_id);

        let digest =
            sha256_file(video).with_context(|| format!("Failed to hash {:?}", video))?;
        checksums.push(checksum_line(&digest, &file_name));

        for variant_idx in 0..opts.variants_per_demo {
            let profile = &opts.prompt_profiles[variant_idx as usize % opts.prompt_profiles.len()];
            let seed = job_seed(opts.base_seed, demo_id, variant_idx);
            let output_name = augmented_file_name(demo_id, variant_idx, &camera_key);
            let local_output = opts.augmented_videos_dir.join(&output_name);
            let request_path = requests_dir.join(format!("{}.json", job_id));

            let request = TransferRequest {
                run_id: run_id.clone(),
                job_id: job_id.to_string(),
                demo_id,
                variant_idx,
                prompt_profile: profile.clone(),
                seed,
                local_input_video: video.display().to_string(),
                local_expected_output_video: local_output.display().to_string(),
                remote_input_video: format!("{}/{}", opts.remote_input_root, file_name),
                remote_expected_output_video: format!(
                    "{}/{}",
                    opts.remote_output_root, output_name
                ),
                notes: REQUEST_NOTES.iter().map(|n| n.to_string()).collect(),
            };
            write_json_pretty(&request_path, &request)
                .with_context(|| format!("Failed to write {:?}", request_path))?;

            jobs.push(TransferJobRecord {
                run_id: run_id.clone(),
                job_id: job_id.to_string(),
                demo_id,
                variant_idx,
                camera_key: camera_key.clone(),
                seed,
                prompt_profile: profile.clone(),
                input_video: video.display().to_string(),
                expected_output_video: local_output.display().to_string(),
                request_json: request_path.display().to_string(),
            });
            expected.push(ExpectedOutputRecord {
                run_id: run_id.clone(),
                job_id: job_id.to_string(),
                demo_id,
                variant_idx,
                expected_output_filename: output_name,
                expected_output_video: local_output.display().to_string(),
            });
            job_id = job_id.next();
        }
    }

    if jobs.is_empty() {
        anyhow::bail!(
            "No input filenames matched expected pattern 'demo_<id>_<camera>.mp4'. \
             Run export first or adjust --video-glob and naming."
        );
    }

    write_jsonl(&jobs_path, &jobs)?;
    write_jsonl(&expected_path, &expected)?;
    write_lines(&checksums_path, &checksums)?;

    let metadata = RunMetadata {
        generated_at_utc: utc_now(),
        run_id,
        input_videos_dir: opts.input_videos_dir.display().to_string(),
        video_glob: opts.video_glob.clone(),
        variants_per_demo: opts.variants_per_demo,
        prompt_profiles: opts.prompt_profiles.clone(),
        base_seed: opts.base_seed,
        remote_input_root: opts.remote_input_root.clone(),
        remote_output_root: opts.remote_output_root.clone(),
        source_video_files: input_videos.len(),
        unique_demo_ids: demo_ids.len(),
        jobs_total: jobs.len(),
        jobs_manifest: jobs_path.display().to_string(),
        expected_outputs_manifest: expected_path.display().to_string(),
        input_checksums: checksums_path.display().to_string(),
    };
    write_json_pretty(&metadata_path, &metadata)?;

    tracing::info!(
        "Transfer bundle {:?}: {} jobs for {} demos",
        run_dir,
        metadata.jobs_total,
        metadata.unique_demo_ids
    );
    Ok((run_dir, metadata))
}
