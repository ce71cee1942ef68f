//! Promotion of an incoming dataset to the canonical location.

use crate::manifest::utc_now;
use anyhow::{Context, Result};
use demoforge_common::checksum::sha256_file;
use demoforge_common::json::write_json_pretty;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PromoteOptions {
    pub incoming: PathBuf,
    pub canonical: PathBuf,
    pub meta_out: PathBuf,
    /// Replace a canonical file whose content differs.
    pub force: bool,
}

/// What happened to the canonical file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteAction {
    Created,
    Overwrote,
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoteMetadata {
    pub promoted_at_utc: String,
    pub incoming_hdf5: String,
    pub canonical_hdf5: String,
    pub source_size_bytes: u64,
    pub source_sha256: String,
    pub canonical_sha256: String,
    pub content_match: bool,
}

/// Copy the incoming file to the canonical path unless already identical.
pub fn run(opts: &PromoteOptions) -> Result<(PromoteAction, PromoteMetadata)> {
    super::require_exists(&opts.incoming, "incoming HDF5")?;

    let source_hash = sha256_file(&opts.incoming)
        .with_context(|| format!("Failed to hash {:?}", opts.incoming))?;
    let source_size = std::fs::metadata(&opts.incoming)?.len();

    let action = if opts.canonical.exists() {
        let target_hash = sha256_file(&opts.canonical)
            .with_context(|| format!("Failed to hash {:?}", opts.canonical))?;
        if target_hash == source_hash {
            PromoteAction::UpToDate
        } else if !opts.force {
            anyhow::bail!(
                "Target exists and differs from source. Use --force to overwrite: {}",
                opts.canonical.display()
            );
        } else {
            copy_file(opts)?;
            PromoteAction::Overwrote
        }
    } else {
        copy_file(opts)?;
        PromoteAction::Created
    };

    let canonical_hash = sha256_file(&opts.canonical)
        .with_context(|| format!("Failed to hash {:?}", opts.canonical))?;
    let meta = PromoteMetadata {
        promoted_at_utc: utc_now(),
        incoming_hdf5: opts.incoming.display().to_string(),
        canonical_hdf5: opts.canonical.display().to_string(),
        source_size_bytes: source_size,
        content_match: source_hash == canonical_hash,
        source_sha256: source_hash,
        canonical_sha256: canonical_hash,
    };
    write_json_pretty(&opts.meta_out, &meta)
        .with_context(|| format!("Failed to write metadata: {:?}", opts.meta_out))?;

    tracing::info!("Promotion {:?}: {:?}", action, opts.canonical);
    Ok((action, meta))
}

fn copy_file(opts: &PromoteOptions) -> Result<()> {
    if let Some(parent) = opts.canonical.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&opts.incoming, &opts.canonical).with_context(|| {
        format!(
            "Failed to copy {:?} to {:?}",
            opts.incoming, opts.canonical
        )
    })?;
    Ok(())
}
