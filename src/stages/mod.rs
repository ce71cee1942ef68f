//! Pipeline stages run by the CLI.
//!
//! Each stage takes fully resolved options (CLI flags merged over config),
//! writes its outputs and returns a summary for the caller to print.

pub mod budget;
pub mod export;
pub mod promote;
pub mod reason;
pub mod transfer;
pub mod validate;

use anyhow::Result;
use std::path::Path;

/// Fail with a readable message when a required input is missing.
pub(crate) fn require_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Missing {}: {}", what, path.display());
    }
    Ok(())
}
