//! Per-episode clip export.

use crate::manifest::{utc_now, ExportManifestRow, ExportStatus};
use anyhow::{Context, Result};
use demoforge_av::{ClipRequest, Encoder};
use demoforge_common::checksum::{checksum_line, sha256_file};
use demoforge_common::json::{write_json_pretty, write_jsonl, write_lines};
use demoforge_common::paths::{export_file_name, infer_camera_key};
use demoforge_episodes::{assert_required_structure, DatasetFile, Episodes, KeyMap, SchemaCheck};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub input_hdf5: PathBuf,
    pub video_root: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_out: PathBuf,
    pub checksums_out: PathBuf,
    pub report_out: PathBuf,
    pub max_episodes: Option<usize>,
    pub overwrite: bool,
    pub dry_run: bool,
    pub schema_check: SchemaCheck,
    /// Read-only here; ids must match the ones `validate` assigned.
    pub key_map: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub generated_at_utc: String,
    pub input_hdf5: String,
    pub video_root: String,
    pub output_dir: String,
    pub episodes_considered: usize,
    pub source_video_files: usize,
    pub exported_count: usize,
    pub skipped_existing: usize,
    pub missing_sources: usize,
    pub failed_exports: usize,
    pub dry_run: bool,
    pub manifest_out: String,
    pub checksums_out: String,
}

impl ExportReport {
    /// True when every episode had a source and no clip failed.
    pub fn passed(&self) -> bool {
        self.missing_sources == 0 && self.failed_exports == 0
    }
}

/// Export one clip per episode through `encoder`.
///
/// Per-episode problems are recorded in the manifest and counted; the
/// remaining episodes are still processed.
pub fn run(opts: &ExportOptions, encoder: &dyn Encoder) -> Result<ExportReport> {
    super::require_exists(&opts.input_hdf5, "canonical HDF5")?;
    super::require_exists(&opts.video_root, "video root")?;
    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("Failed to create output dir: {:?}", opts.output_dir))?;

    let mut key_map = match opts.key_map {
        Some(ref path) => KeyMap::load_or_default(path)
            .with_context(|| format!("Failed to load key map: {:?}", path))?,
        None => KeyMap::new(),
    };

    let file = DatasetFile::open(&opts.input_hdf5)
        .with_context(|| format!("Failed to open dataset: {:?}", opts.input_hdf5))?;
    let root = file.root();
    assert_required_structure(root, opts.schema_check)?;

    let mut episodes = Episodes::open(root, &mut key_map)?;
    if let Some(max) = opts.max_episodes {
        episodes.truncate(max);
    }
    tracing::info!(
        "Exporting {} episodes to {:?}{}",
        episodes.len(),
        opts.output_dir,
        if opts.dry_run { " (dry run)" } else { "" }
    );

    let mut rows = Vec::with_capacity(episodes.len());
    let mut checksums = Vec::new();
    let mut sources = BTreeSet::new();
    let (mut exported, mut skipped, mut missing, mut failed) = (0, 0, 0, 0);

    for view in episodes.views(&opts.video_root) {
        let view = view?;
        sources.insert(view.video_path_resolved.clone());

        let camera_key = infer_camera_key(&view.video_path_hdf5);
        let output_name = export_file_name(view.demo_id, &camera_key);
        let output_path = opts.output_dir.join(&output_name);

        let mut error = None;
        let status = if !view.video_path_resolved.exists() {
            missing += 1;
            error = Some(format!(
                "Missing source video: {}",
                view.video_path_resolved.display()
            ));
            ExportStatus::MissingSource
        } else if output_path.exists() && !opts.overwrite {
            skipped += 1;
            ExportStatus::SkippedExisting
        } else if opts.dry_run {
            exported += 1;
            ExportStatus::Exported
        } else {
            let request = ClipRequest {
                input: view.video_path_resolved.clone(),
                output: output_path.clone(),
                start_sec: view.from_timestamp,
                end_sec: view.to_timestamp,
                fps: view.fps,
            };
            match encoder.encode(&request) {
                Ok(()) => {
                    exported += 1;
                    ExportStatus::Exported
                }
                Err(e) => {
                    tracing::warn!("Export failed for demo {}: {}", view.demo_id, e);
                    failed += 1;
                    error = Some(e.to_string());
                    ExportStatus::Failed
                }
            }
        };

        if matches!(status, ExportStatus::Exported | ExportStatus::SkippedExisting)
            && !opts.dry_run
            && output_path.exists()
        {
            let digest = sha256_file(&output_path)
                .with_context(|| format!("Failed to hash {:?}", output_path))?;
            checksums.push(checksum_line(&digest, &output_name));
        }

        tracing::debug!("Demo {} -> {} ({:?})", view.demo_id, output_name, status);
        rows.push(ExportManifestRow {
            demo_id: view.demo_id,
            episode_key: view.episode_key,
            task_text: view.task_text,
            source_video_path: view.video_path_resolved.display().to_string(),
            output_video_path: output_path.display().to_string(),
            output_video_name: output_name,
            camera_key,
            fps: view.fps,
            from_timestamp: view.from_timestamp,
            to_timestamp: view.to_timestamp,
            num_steps: view.num_steps,
            status,
            error,
        });
    }

    write_jsonl(&opts.manifest_out, &rows)
        .with_context(|| format!("Failed to write manifest: {:?}", opts.manifest_out))?;
    if !checksums.is_empty() {
        write_lines(&opts.checksums_out, &checksums)
            .with_context(|| format!("Failed to write checksums: {:?}", opts.checksums_out))?;
    }

    let report = ExportReport {
        generated_at_utc: utc_now(),
        input_hdf5: opts.input_hdf5.display().to_string(),
        video_root: opts.video_root.display().to_string(),
        output_dir: opts.output_dir.display().to_string(),
        episodes_considered: rows.len(),
        source_video_files: sources.len(),
        exported_count: exported,
        skipped_existing: skipped,
        missing_sources: missing,
        failed_exports: failed,
        dry_run: opts.dry_run,
        manifest_out: opts.manifest_out.display().to_string(),
        checksums_out: opts.checksums_out.display().to_string(),
    };
    write_json_pretty(&opts.report_out, &report)
        .with_context(|| format!("Failed to write report: {:?}", opts.report_out))?;

    Ok(report)
}
