mod cli;

use demoforge::config::{self, split_list};
use demoforge::stages::{budget, export, promote, reason, transfer, validate};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use demoforge_av::{ClipSettings, FfmpegEncoder};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "demoforge=trace,demoforge_episodes=trace,demoforge_av=debug,demoforge_common=debug"
                .to_string()
        } else {
            "demoforge=info,demoforge_episodes=info,demoforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone();
    let load = || config::load_config_or_default(config_path.as_deref());

    match cli.command {
        Commands::CheckTools => check_tools(),
        Commands::ValidateConfig { path } => validate_config(path.or(cli.config).as_deref()),
        Commands::Version => {
            println!("demoforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Validate {
            hdf5,
            video_root,
            manifest_out,
            report_out,
            schema_check,
            key_map,
        } => {
            let config = load()?;
            run_validate(validate::ValidateOptions {
                hdf5: hdf5.unwrap_or_else(|| config.paths.incoming_hdf5.clone()),
                video_root: video_root.unwrap_or_else(|| config.paths.video_root.clone()),
                manifest_out: manifest_out
                    .unwrap_or_else(|| config.paths.manifest("episode_video_manifest.jsonl")),
                report_out: report_out
                    .unwrap_or_else(|| config.paths.manifest("incoming_validation_report.json")),
                schema_check: schema_check.unwrap_or(config.validation.schema_check),
                key_map: key_map.or_else(|| config.validation.key_map.clone()),
            })
        }
        Commands::Promote {
            incoming_hdf5,
            canonical_hdf5,
            meta_out,
            force,
        } => {
            let config = load()?;
            run_promote(promote::PromoteOptions {
                incoming: incoming_hdf5.unwrap_or_else(|| config.paths.incoming_hdf5.clone()),
                canonical: canonical_hdf5
                    .unwrap_or_else(|| config.paths.canonical_hdf5.clone()),
                meta_out: meta_out
                    .unwrap_or_else(|| config.paths.manifest("canonical_hdf5_metadata.json")),
                force,
            })
        }
        Commands::Export {
            input_hdf5,
            video_root,
            output_dir,
            manifest_out,
            checksums_out,
            report_out,
            ffmpeg_bin,
            max_episodes,
            overwrite,
            dry_run,
            schema_check,
            key_map,
        } => {
            let config = load()?;
            let opts = export::ExportOptions {
                input_hdf5: input_hdf5.unwrap_or_else(|| config.paths.canonical_hdf5.clone()),
                video_root: video_root.unwrap_or_else(|| config.paths.video_root.clone()),
                output_dir: output_dir
                    .unwrap_or_else(|| config.paths.original_videos_dir.clone()),
                manifest_out: manifest_out
                    .unwrap_or_else(|| config.paths.manifest("transfer_export_manifest.jsonl")),
                checksums_out: checksums_out
                    .unwrap_or_else(|| config.paths.manifest("transfer_export_checksums.sha256")),
                report_out: report_out
                    .unwrap_or_else(|| config.paths.manifest("transfer_export_report.json")),
                max_episodes,
                overwrite: overwrite || config.export.overwrite,
                dry_run,
                schema_check: schema_check.unwrap_or(config.validation.schema_check),
                key_map: key_map.or_else(|| config.validation.key_map.clone()),
            };
            let ffmpeg_bin = ffmpeg_bin.unwrap_or_else(|| config.export.ffmpeg_bin.clone());
            if !dry_run {
                if let Err(e) = demoforge_av::get_tool_path(&ffmpeg_bin) {
                    tracing::warn!("{}; clip encoding will fail", e);
                }
            }
            let encoder = FfmpegEncoder::new(ClipSettings {
                ffmpeg_bin,
                video_codec: config.export.video_codec.clone(),
                preset: config.export.preset.clone(),
                crf: config.export.crf,
                pix_fmt: config.export.pix_fmt.clone(),
            });
            run_export(opts, &encoder)
        }
        Commands::Transfer {
            input_videos_dir,
            video_glob,
            variants_per_demo,
            base_seed,
            prompt_profiles,
            run_id,
            run_root,
            remote_input_root,
            remote_output_root,
        } => {
            let config = load()?;
            let t = &config.transfer;
            run_transfer(transfer::TransferOptions {
                input_videos_dir: input_videos_dir
                    .unwrap_or_else(|| config.paths.original_videos_dir.clone()),
                video_glob: video_glob.unwrap_or_else(|| t.video_glob.clone()),
                variants_per_demo: variants_per_demo.unwrap_or(t.variants_per_demo),
                base_seed: base_seed.unwrap_or(t.base_seed),
                prompt_profiles: prompt_profiles
                    .map(|p| split_list(&p))
                    .unwrap_or_else(|| t.prompt_profiles.clone()),
                run_id,
                run_root: run_root.unwrap_or_else(|| t.run_root.clone()),
                remote_input_root: remote_input_root
                    .unwrap_or_else(|| t.remote_input_root.clone()),
                remote_output_root: remote_output_root
                    .unwrap_or_else(|| t.remote_output_root.clone()),
                augmented_videos_dir: config.paths.augmented_videos_dir.clone(),
            })
        }
        Commands::Budget {
            manifest_jsonl,
            variants_per_demo,
            pilot_output_seconds,
            pilot_wall_seconds,
            pilot_num_gpus,
            target_num_gpus,
            avg_gpu_power_watts,
            gpu_hours_budget,
            wall_hours_budget,
            energy_kwh_budget,
            output_json,
        } => {
            let config = load()?;
            let b = &config.budget;
            run_budget(budget::BudgetOptions {
                manifest_jsonl: manifest_jsonl
                    .unwrap_or_else(|| config.paths.manifest("episode_video_manifest.jsonl")),
                variants_per_demo: variants_per_demo.unwrap_or(config.transfer.variants_per_demo),
                pilot_output_seconds,
                pilot_wall_seconds,
                pilot_num_gpus: pilot_num_gpus.unwrap_or(b.pilot_num_gpus),
                target_num_gpus: target_num_gpus.unwrap_or(b.target_num_gpus),
                avg_gpu_power_watts: avg_gpu_power_watts.unwrap_or(b.avg_gpu_power_watts),
                gpu_hours_budget: gpu_hours_budget.or(b.gpu_hours_budget),
                wall_hours_budget: wall_hours_budget.or(b.wall_hours_budget),
                energy_kwh_budget: energy_kwh_budget.or(b.energy_kwh_budget),
                output_json: output_json
                    .unwrap_or_else(|| config.paths.manifest("transfer_budget_estimate.json")),
            })
        }
        Commands::Reason {
            original_manifest_jsonl,
            transfer_jobs_jsonl,
            no_include_original,
            augmented_sample_ratio,
            augmented_sample_max,
            seed,
            keyframes,
            output_requests_jsonl,
            output_report_json,
        } => {
            let config = load()?;
            let r = &config.reason;
            run_reason(reason::ReasonOptions {
                original_manifest_jsonl: original_manifest_jsonl
                    .unwrap_or_else(|| config.paths.manifest("episode_video_manifest.jsonl")),
                transfer_jobs_jsonl,
                include_original: r.include_original && !no_include_original,
                augmented_sample_ratio: augmented_sample_ratio
                    .unwrap_or(r.augmented_sample_ratio),
                augmented_sample_max: augmented_sample_max.or(r.augmented_sample_max),
                seed: seed.unwrap_or(r.seed),
                keyframes: keyframes
                    .map(|k| split_list(&k))
                    .unwrap_or_else(|| r.keyframes.clone()),
                output_requests_jsonl: output_requests_jsonl
                    .unwrap_or_else(|| config.paths.manifest("reason_requests.jsonl")),
                output_report_json: output_report_json
                    .unwrap_or_else(|| config.paths.manifest("reason_sampling_report.json")),
                original_videos_dir: config.paths.original_videos_dir.clone(),
            })
        }
    }
}

fn run_validate(opts: validate::ValidateOptions) -> Result<()> {
    let report = validate::run(&opts)?;

    println!("Wrote manifest: {}", opts.manifest_out.display());
    println!("Wrote report:   {}", opts.report_out.display());
    println!("Episodes:       {}", report.episodes_total);
    println!("Issues:         {}", report.episodes_with_issues);

    if !report.passed() {
        anyhow::bail!("Validation failed: dataset has issues.");
    }
    println!("Validation passed.");
    Ok(())
}

fn run_promote(opts: promote::PromoteOptions) -> Result<()> {
    let (action, _meta) = promote::run(&opts)?;

    let target = opts.canonical.display();
    match action {
        promote::PromoteAction::Created => println!("Created canonical HDF5: {}", target),
        promote::PromoteAction::Overwrote => println!("Overwrote canonical HDF5: {}", target),
        promote::PromoteAction::UpToDate => {
            println!("Canonical file already up to date: {}", target)
        }
    }
    println!("Wrote metadata: {}", opts.meta_out.display());
    Ok(())
}

fn run_export(opts: export::ExportOptions, encoder: &FfmpegEncoder) -> Result<()> {
    let report = export::run(&opts, encoder)?;

    println!("Wrote manifest: {}", opts.manifest_out.display());
    println!("Wrote report:   {}", opts.report_out.display());
    if report.exported_count + report.skipped_existing > 0 && !opts.dry_run {
        println!("Wrote checksums: {}", opts.checksums_out.display());
    }
    println!("Episodes considered: {}", report.episodes_considered);
    println!("Exported: {}", report.exported_count);
    println!("Skipped existing: {}", report.skipped_existing);
    println!("Missing sources: {}", report.missing_sources);
    println!("Failed exports: {}", report.failed_exports);

    if !report.passed() {
        anyhow::bail!(
            "Export incomplete: {} missing sources, {} failed",
            report.missing_sources,
            report.failed_exports
        );
    }
    Ok(())
}

fn run_transfer(opts: transfer::TransferOptions) -> Result<()> {
    let (run_dir, meta) = transfer::run(&opts)?;

    println!("Run bundle: {}", run_dir.display());
    println!("Jobs: {}", meta.jobs_total);
    println!("Unique demos: {}", meta.unique_demo_ids);
    println!("Checksums: {}", meta.input_checksums);
    println!("Metadata: {}", run_dir.join("run_metadata.json").display());
    Ok(())
}

fn run_budget(opts: budget::BudgetOptions) -> Result<()> {
    let estimate = budget::run(&opts)?;

    println!("Wrote estimate: {}", opts.output_json.display());
    println!("Episodes: {}", estimate.episodes);
    println!("Total input seconds: {:.2}", estimate.total_input_seconds);
    println!("Planned variants/demo: {}", estimate.variants_per_demo);
    println!("Estimated GPU-hours: {:.2}", estimate.estimated_gpu_hours);
    println!(
        "Estimated wall-hours (@{} GPU): {:.2}",
        opts.target_num_gpus, estimate.estimated_wall_hours
    );
    println!("Estimated energy (kWh): {:.2}", estimate.estimated_energy_kwh);
    Ok(())
}

fn run_reason(opts: reason::ReasonOptions) -> Result<()> {
    let report = reason::run(&opts)?;

    println!("Wrote requests: {}", opts.output_requests_jsonl.display());
    println!("Wrote report:   {}", opts.output_report_json.display());
    println!("Original selected: {}", report.original_selected);
    println!("Augmented selected: {}", report.augmented_selected);
    println!("Total requests: {}", report.requests_total);
    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = demoforge_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable clip export.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("  Video root: {}", config.paths.video_root.display());
    println!("  Canonical dataset: {}", config.paths.canonical_hdf5.display());
    println!("  Manifests: {}", config.paths.manifests_dir.display());
    println!("  Schema check: {}", config.validation.schema_check);
    println!(
        "  Key map: {}",
        config::display_opt(config.validation.key_map.as_deref())
    );
    println!("  ffmpeg: {}", config.export.ffmpeg_bin);
    println!(
        "  Transfer: {} variants/demo, profiles {:?}",
        config.transfer.variants_per_demo, config.transfer.prompt_profiles
    );
    println!(
        "  Reason: ratio {}, keyframes {:?}",
        config.reason.augmented_sample_ratio, config.reason.keyframes
    );

    Ok(())
}
