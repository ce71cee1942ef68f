//! Labeling requests: every original episode plus a stratified sample of
//! augmented variants.

use crate::manifest::{utc_now, AugmentedJobRow, OriginalEpisodeRow, ReasonRequest, SourceType};
use anyhow::{Context, Result};
use demoforge_common::json::{read_jsonl, write_json_pretty, write_jsonl};
use demoforge_common::DemoId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Task group for jobs whose demo is absent from the original manifest.
const UNKNOWN_TASK: &str = "<unknown>";

#[derive(Debug, Clone)]
pub struct ReasonOptions {
    pub original_manifest_jsonl: PathBuf,
    pub transfer_jobs_jsonl: Option<PathBuf>,
    pub include_original: bool,
    pub augmented_sample_ratio: f64,
    pub augmented_sample_max: Option<usize>,
    pub seed: u64,
    pub keyframes: Vec<String>,
    pub output_requests_jsonl: PathBuf,
    pub output_report_json: PathBuf,
    /// Directory exported original clips live in.
    pub original_videos_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingReport {
    pub generated_at_utc: String,
    pub seed: u64,
    pub include_original: bool,
    pub original_total: usize,
    pub original_selected: usize,
    pub augmented_total: usize,
    pub augmented_selected: usize,
    pub augmented_sample_ratio: f64,
    pub augmented_sample_max: Option<usize>,
    pub requests_total: usize,
    pub requests_path: String,
}

/// Pick augmented jobs per task group, deterministic for a given `rng` seed.
///
/// Each group keeps `min(len, max(1, ceil(len * ratio)))` jobs; an optional
/// global cap then subsamples the union. The result is sorted by
/// `(demo_id, variant_idx)`.
pub fn sample_augmented_jobs(
    jobs: &[AugmentedJobRow],
    task_by_demo: &HashMap<DemoId, String>,
    ratio: f64,
    max_items: Option<usize>,
    rng: &mut StdRng,
) -> Vec<AugmentedJobRow> {
    if ratio <= 0.0 || jobs.is_empty() {
        return Vec::new();
    }

    let mut grouped: BTreeMap<&str, Vec<&AugmentedJobRow>> = BTreeMap::new();
    for job in jobs {
        let task = task_by_demo
            .get(&job.demo_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TASK);
        grouped.entry(task).or_default().push(job);
    }

    let mut sampled: Vec<AugmentedJobRow> = Vec::new();
    for (task, group) in &grouped {
        let k = ((group.len() as f64 * ratio).ceil() as usize).clamp(1, group.len());
        tracing::debug!("Sampling {} of {} jobs for task {:?}", k, group.len(), task);
        sampled.extend(group.choose_multiple(rng, k).map(|job| (*job).clone()));
    }

    if let Some(max) = max_items {
        if sampled.len() > max {
            sampled = sampled.choose_multiple(rng, max).cloned().collect();
        }
    }

    sampled.sort_by_key(|job| (job.demo_id, job.variant_idx));
    sampled
}

fn original_video_path(row: &OriginalEpisodeRow, original_videos_dir: &Path) -> String {
    match row.expected_export_name {
        Some(ref name) if !name.is_empty() => original_videos_dir.join(name).display().to_string(),
        _ => row.video_path_resolved.clone().unwrap_or_default(),
    }
}

/// Build the request manifest and sampling report.
pub fn run(opts: &ReasonOptions) -> Result<SamplingReport> {
    if opts.keyframes.is_empty() {
        anyhow::bail!("--keyframes must contain at least one value.");
    }
    if opts.augmented_sample_ratio.is_nan() || opts.augmented_sample_ratio < 0.0 {
        anyhow::bail!("--augmented-sample-ratio must be >= 0.");
    }
    super::require_exists(&opts.original_manifest_jsonl, "original manifest")?;

    let originals: Vec<OriginalEpisodeRow> = read_jsonl(&opts.original_manifest_jsonl)
        .with_context(|| format!("Failed to read {:?}", opts.original_manifest_jsonl))?;
    if originals.is_empty() {
        anyhow::bail!("No rows in {}", opts.original_manifest_jsonl.display());
    }

    let task_by_demo: HashMap<DemoId, String> = originals
        .iter()
        .map(|row| (row.demo_id, row.task_text.clone()))
        .collect();

    let mut requests = Vec::new();
    if opts.include_original {
        requests.extend(originals.iter().map(|row| ReasonRequest {
            request_id: format!("orig_{}", row.demo_id.padded()),
            source_type: SourceType::Original,
            demo_id: row.demo_id,
            variant_idx: None,
            task_text: row.task_text.clone(),
            video_path: original_video_path(row, &opts.original_videos_dir),
            keyframes: opts.keyframes.clone(),
            prompt_profile: None,
            seed: None,
        }));
    }
    let original_selected = requests.len();

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut augmented_total = 0;
    let mut augmented_selected = 0;
    if let Some(ref jobs_path) = opts.transfer_jobs_jsonl {
        if jobs_path.exists() {
            let jobs: Vec<AugmentedJobRow> = read_jsonl(jobs_path)
                .with_context(|| format!("Failed to read {:?}", jobs_path))?;
            augmented_total = jobs.len();
            let sampled = sample_augmented_jobs(
                &jobs,
                &task_by_demo,
                opts.augmented_sample_ratio,
                opts.augmented_sample_max,
                &mut rng,
            );
            augmented_selected = sampled.len();

            requests.extend(sampled.into_iter().map(|job| ReasonRequest {
                request_id: format!("aug_{}_v{:02}", job.demo_id.padded(), job.variant_idx),
                source_type: SourceType::Augmented,
                demo_id: job.demo_id,
                variant_idx: Some(job.variant_idx),
                task_text: task_by_demo.get(&job.demo_id).cloned().unwrap_or_default(),
                video_path: job.expected_output_video,
                keyframes: opts.keyframes.clone(),
                prompt_profile: Some(job.prompt_profile),
                seed: Some(job.seed),
            }));
        } else {
            tracing::warn!("Transfer jobs manifest not found, skipping augmented: {:?}", jobs_path);
        }
    }

    write_jsonl(&opts.output_requests_jsonl, &requests)
        .with_context(|| format!("Failed to write {:?}", opts.output_requests_jsonl))?;

    let report = SamplingReport {
        generated_at_utc: utc_now(),
        seed: opts.seed,
        include_original: opts.include_original,
        original_total: originals.len(),
        original_selected,
        augmented_total,
        augmented_selected,
        augmented_sample_ratio: opts.augmented_sample_ratio,
        augmented_sample_max: opts.augmented_sample_max,
        requests_total: requests.len(),
        requests_path: opts.output_requests_jsonl.display().to_string(),
    };
    write_json_pretty(&opts.output_report_json, &report)
        .with_context(|| format!("Failed to write {:?}", opts.output_report_json))?;

    Ok(report)
}
