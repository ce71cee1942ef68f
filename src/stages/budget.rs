//! Transfer cost and time estimate from a pilot throughput measurement.

use crate::manifest::TimingRow;
use anyhow::{Context, Result};
use demoforge_common::json::{read_jsonl, write_json_pretty};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BudgetOptions {
    pub manifest_jsonl: PathBuf,
    pub variants_per_demo: u32,
    pub pilot_output_seconds: f64,
    pub pilot_wall_seconds: f64,
    pub pilot_num_gpus: u32,
    pub target_num_gpus: u32,
    pub avg_gpu_power_watts: f64,
    pub gpu_hours_budget: Option<f64>,
    pub wall_hours_budget: Option<f64>,
    pub energy_kwh_budget: Option<f64>,
    pub output_json: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetEstimate {
    pub episodes: usize,
    pub total_input_seconds: f64,
    pub variants_per_demo: u32,
    pub total_output_seconds: f64,
    pub pilot_output_seconds_per_gpu_second: f64,
    pub estimated_gpu_hours: f64,
    pub estimated_wall_hours: f64,
    pub estimated_energy_kwh: f64,
    pub max_variants_by_gpu_hours: Option<u64>,
    pub max_variants_by_wall_hours: Option<u64>,
    pub max_variants_by_energy_kwh: Option<u64>,
}

/// Largest whole number of variants per demo a GPU-hour budget allows.
pub fn max_variants(gpu_hours_budget: Option<f64>, total_input_seconds: f64, throughput: f64) -> Option<u64> {
    let budget = gpu_hours_budget?;
    let max_output_seconds = budget * 3600.0 * throughput;
    let variants = (max_output_seconds / total_input_seconds.max(1e-9)).floor();
    Some(if variants > 0.0 { variants as u64 } else { 0 })
}

/// Compute the estimate for `rows` of an episode manifest.
pub fn estimate(rows: &[TimingRow], opts: &BudgetOptions) -> Result<BudgetEstimate> {
    if opts.variants_per_demo < 1 {
        anyhow::bail!("--variants-per-demo must be >= 1");
    }
    if opts.pilot_output_seconds <= 0.0 || opts.pilot_wall_seconds <= 0.0 {
        anyhow::bail!("--pilot-output-seconds and --pilot-wall-seconds must be > 0");
    }
    if opts.pilot_num_gpus < 1 || opts.target_num_gpus < 1 {
        anyhow::bail!("--pilot-num-gpus and --target-num-gpus must be >= 1");
    }
    if opts.avg_gpu_power_watts.is_nan() || opts.avg_gpu_power_watts <= 0.0 {
        anyhow::bail!("--avg-gpu-power-watts must be > 0");
    }

    let mut total_input_seconds = 0.0;
    for row in rows {
        total_input_seconds += row.input_seconds().ok_or_else(|| {
            anyhow::anyhow!("Manifest rows must include either from/to timestamps or num_steps+fps.")
        })?;
    }

    let watts_kw = opts.avg_gpu_power_watts / 1000.0;
    let throughput =
        opts.pilot_output_seconds / (opts.pilot_wall_seconds * f64::from(opts.pilot_num_gpus));
    let total_output_seconds = total_input_seconds * f64::from(opts.variants_per_demo);
    let estimated_gpu_hours = total_output_seconds / throughput / 3600.0;
    let estimated_wall_hours = estimated_gpu_hours / f64::from(opts.target_num_gpus);
    let estimated_energy_kwh = estimated_gpu_hours * watts_kw;

    // A zero wall or energy budget counts as no budget.
    let wall_gpu_hours = opts
        .wall_hours_budget
        .filter(|h| *h != 0.0)
        .map(|h| h * f64::from(opts.target_num_gpus));
    let energy_gpu_hours = opts
        .energy_kwh_budget
        .filter(|kwh| *kwh != 0.0)
        .map(|kwh| kwh / watts_kw);

    Ok(BudgetEstimate {
        episodes: rows.len(),
        total_input_seconds,
        variants_per_demo: opts.variants_per_demo,
        total_output_seconds,
        pilot_output_seconds_per_gpu_second: throughput,
        estimated_gpu_hours,
        estimated_wall_hours,
        estimated_energy_kwh,
        max_variants_by_gpu_hours: max_variants(opts.gpu_hours_budget, total_input_seconds, throughput),
        max_variants_by_wall_hours: max_variants(wall_gpu_hours, total_input_seconds, throughput),
        max_variants_by_energy_kwh: max_variants(energy_gpu_hours, total_input_seconds, throughput),
    })
}

/// Read the manifest, estimate, and write the JSON summary.
pub fn run(opts: &BudgetOptions) -> Result<BudgetEstimate> {
    super::require_exists(&opts.manifest_jsonl, "manifest")?;
    let rows: Vec<TimingRow> = read_jsonl(&opts.manifest_jsonl)
        .with_context(|| format!("Failed to read manifest: {:?}", opts.manifest_jsonl))?;

    let estimate = estimate(&rows, opts)?;
    write_json_pretty(&opts.output_json, &estimate)
        .with_context(|| format!("Failed to write estimate: {:?}", opts.output_json))?;

    tracing::info!(
        "Budget estimate: {:.2} GPU-hours for {} episodes",
        estimate.estimated_gpu_hours,
        estimate.episodes
    );
    Ok(estimate)
}
