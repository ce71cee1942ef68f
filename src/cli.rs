use clap::{Parser, Subcommand};
use demoforge_episodes::SchemaCheck;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "demoforge")]
#[command(author, version, about = "Robot demonstration episode pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an incoming dataset and write the episode manifest
    Validate {
        /// Dataset to validate (.hdf5, .h5 or .json snapshot)
        #[arg(long)]
        hdf5: Option<PathBuf>,

        /// Root directory for the dataset's videos
        #[arg(long)]
        video_root: Option<PathBuf>,

        /// Episode manifest JSONL output
        #[arg(long)]
        manifest_out: Option<PathBuf>,

        /// Validation report JSON output
        #[arg(long)]
        report_out: Option<PathBuf>,

        /// Structural check scope: first or all
        #[arg(long)]
        schema_check: Option<SchemaCheck>,

        /// Persisted id map for non-numeric episode keys
        #[arg(long)]
        key_map: Option<PathBuf>,
    },

    /// Promote the incoming dataset to the canonical path
    Promote {
        #[arg(long)]
        incoming_hdf5: Option<PathBuf>,

        #[arg(long)]
        canonical_hdf5: Option<PathBuf>,

        /// Metadata JSON output
        #[arg(long)]
        meta_out: Option<PathBuf>,

        /// Overwrite a canonical file that differs from the source
        #[arg(long)]
        force: bool,
    },

    /// Export one clip per episode from the canonical dataset
    Export {
        #[arg(long)]
        input_hdf5: Option<PathBuf>,

        #[arg(long)]
        video_root: Option<PathBuf>,

        /// Directory to write clips to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        manifest_out: Option<PathBuf>,

        #[arg(long)]
        checksums_out: Option<PathBuf>,

        #[arg(long)]
        report_out: Option<PathBuf>,

        /// ffmpeg binary to use
        #[arg(long)]
        ffmpeg_bin: Option<String>,

        /// Export at most this many episodes
        #[arg(long)]
        max_episodes: Option<usize>,

        /// Re-encode clips that already exist
        #[arg(long)]
        overwrite: bool,

        /// Plan exports without writing clips
        #[arg(long)]
        dry_run: bool,

        /// Structural check scope: first or all
        #[arg(long)]
        schema_check: Option<SchemaCheck>,

        /// Id map for non-numeric episode keys written by `validate`
        #[arg(long)]
        key_map: Option<PathBuf>,
    },

    /// Build a job bundle for the video augmentation service
    Transfer {
        /// Directory of exported clips (demo_<id>_<camera>.mp4)
        #[arg(long)]
        input_videos_dir: Option<PathBuf>,

        #[arg(long)]
        video_glob: Option<String>,

        #[arg(long)]
        variants_per_demo: Option<u32>,

        #[arg(long)]
        base_seed: Option<u64>,

        /// Comma-separated profile tags, cycled across variants
        #[arg(long)]
        prompt_profiles: Option<String>,

        /// Run id (defaults to a UTC timestamp)
        #[arg(long)]
        run_id: Option<String>,

        #[arg(long)]
        run_root: Option<PathBuf>,

        #[arg(long)]
        remote_input_root: Option<String>,

        #[arg(long)]
        remote_output_root: Option<String>,
    },

    /// Estimate transfer cost from a pilot run
    Budget {
        /// Episode manifest JSONL
        #[arg(long)]
        manifest_jsonl: Option<PathBuf>,

        #[arg(long)]
        variants_per_demo: Option<u32>,

        /// Output video seconds produced by the pilot
        #[arg(long)]
        pilot_output_seconds: f64,

        /// Wall-clock seconds the pilot took
        #[arg(long)]
        pilot_wall_seconds: f64,

        #[arg(long)]
        pilot_num_gpus: Option<u32>,

        #[arg(long)]
        target_num_gpus: Option<u32>,

        #[arg(long)]
        avg_gpu_power_watts: Option<f64>,

        #[arg(long)]
        gpu_hours_budget: Option<f64>,

        #[arg(long)]
        wall_hours_budget: Option<f64>,

        #[arg(long)]
        energy_kwh_budget: Option<f64>,

        #[arg(long)]
        output_json: Option<PathBuf>,
    },

    /// Build labeling requests for original and sampled augmented clips
    Reason {
        #[arg(long)]
        original_manifest_jsonl: Option<PathBuf>,

        #[arg(long)]
        transfer_jobs_jsonl: Option<PathBuf>,

        /// Sample only augmented entries
        #[arg(long)]
        no_include_original: bool,

        #[arg(long)]
        augmented_sample_ratio: Option<f64>,

        #[arg(long)]
        augmented_sample_max: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Comma-separated keyframe anchors
        #[arg(long)]
        keyframes: Option<String>,

        #[arg(long)]
        output_requests_jsonl: Option<PathBuf>,

        #[arg(long)]
        output_report_json: Option<PathBuf>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    ValidateConfig {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        path: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
