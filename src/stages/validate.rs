//! Incoming-data validation: episode manifest plus issue report.

use crate::manifest::{utc_now, EpisodeManifestRow, IssueRecord};
use anyhow::{Context, Result};
use demoforge_common::json::{write_json_pretty, write_jsonl};
use demoforge_episodes::{
    assert_required_structure, validate_episode_arrays, DatasetFile, Episodes, IssueTag, KeyMap,
    SchemaCheck,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub hdf5: PathBuf,
    pub video_root: PathBuf,
    pub manifest_out: PathBuf,
    pub report_out: PathBuf,
    pub schema_check: SchemaCheck,
    /// Loaded before indexing and written back afterwards.
    pub key_map: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub generated_at_utc: String,
    pub hdf5: String,
    pub video_root: String,
    pub episodes_total: usize,
    pub episodes_with_issues: usize,
    pub missing_video_files: usize,
    pub unique_video_files: usize,
    pub issues: Vec<IssueRecord>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate a dataset and write the episode manifest and report.
///
/// Schema errors abort before anything is written. Data issues are recorded
/// and both files are still written; check [`ValidationReport::passed`].
pub fn run(opts: &ValidateOptions) -> Result<ValidationReport> {
    super::require_exists(&opts.hdf5, "HDF5")?;
    super::require_exists(&opts.video_root, "video root")?;

    let mut key_map = match opts.key_map {
        Some(ref path) => KeyMap::load_or_default(path)
            .with_context(|| format!("Failed to load key map: {:?}", path))?,
        None => KeyMap::new(),
    };

    let file = DatasetFile::open(&opts.hdf5)
        .with_context(|| format!("Failed to open dataset: {:?}", opts.hdf5))?;
    let root = file.root();
    assert_required_structure(root, opts.schema_check)?;

    let episodes = Episodes::open(root, &mut key_map)?;
    tracing::info!(
        "Validating {} episodes from {:?}",
        episodes.len(),
        opts.hdf5
    );

    let mut rows = Vec::with_capacity(episodes.len());
    let mut issues = Vec::new();
    let mut video_paths = BTreeSet::new();

    for (entry, view) in episodes.index().iter().zip(episodes.views(&opts.video_root)) {
        let view = view?;
        let group = episodes.episode(entry)?;
        let mut tags = validate_episode_arrays(group.as_ref())?;

        let video_exists = view.video_path_resolved.exists();
        video_paths.insert(view.video_path_resolved.clone());
        if !video_exists {
            tags.push(IssueTag::VideoFileMissing);
        }

        if !tags.is_empty() {
            tracing::debug!("Episode {:?} has issues: {:?}", view.episode_key, tags);
            issues.push(IssueRecord {
                demo_id: view.demo_id,
                episode_key: view.episode_key.clone(),
                issues: tags,
            });
        }
        rows.push(EpisodeManifestRow::from_view(&view, video_exists));
    }

    let report = ValidationReport {
        generated_at_utc: utc_now(),
        hdf5: opts.hdf5.display().to_string(),
        video_root: opts.video_root.display().to_string(),
        episodes_total: rows.len(),
        episodes_with_issues: issues.len(),
        missing_video_files: rows.iter().filter(|r| !r.video_exists).count(),
        unique_video_files: video_paths.len(),
        issues,
    };

    write_jsonl(&opts.manifest_out, &rows)
        .with_context(|| format!("Failed to write manifest: {:?}", opts.manifest_out))?;
    write_json_pretty(&opts.report_out, &report)
        .with_context(|| format!("Failed to write report: {:?}", opts.report_out))?;

    if let Some(ref path) = opts.key_map {
        key_map
            .save(path)
            .with_context(|| format!("Failed to write key map: {:?}", path))?;
    }

    tracing::info!(
        "Validation finished: {} episodes, {} with issues",
        report.episodes_total,
        report.episodes_with_issues
    );
    Ok(report)
}
