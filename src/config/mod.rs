mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    normalize_lists(&mut config);
    validate_config(&config)?;

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./demoforge.toml",
        "./config.toml",
        "~/.config/demoforge/config.toml",
        "/etc/demoforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn normalize_lists(config: &mut Config) {
    for list in [
        &mut config.transfer.prompt_profiles,
        &mut config.reason.keyframes,
    ] {
        list.iter_mut().for_each(|item| *item = item.trim().to_string());
        list.retain(|item| !item.is_empty());
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.transfer.variants_per_demo < 1 {
        anyhow::bail!("transfer.variants_per_demo must be >= 1");
    }
    if config.transfer.prompt_profiles.is_empty() {
        anyhow::bail!("transfer.prompt_profiles must contain at least one value");
    }
    if config.export.crf > 51 {
        anyhow::bail!("export.crf must be between 0 and 51");
    }
    if config.budget.pilot_num_gpus < 1 || config.budget.target_num_gpus < 1 {
        anyhow::bail!("budget.pilot_num_gpus and budget.target_num_gpus must be >= 1");
    }
    let watts = config.budget.avg_gpu_power_watts;
    if watts.is_nan() || watts <= 0.0 {
        anyhow::bail!("budget.avg_gpu_power_watts must be > 0");
    }
    let ratio = config.reason.augmented_sample_ratio;
    if ratio.is_nan() || ratio < 0.0 {
        anyhow::bail!("reason.augmented_sample_ratio must be >= 0");
    }
    if config.reason.keyframes.is_empty() {
        anyhow::bail!("reason.keyframes must contain at least one value");
    }

    if let Some(ref key_map) = config.validation.key_map {
        if !key_map.exists() {
            tracing::warn!("Key map does not exist yet and will be created: {:?}", key_map);
        }
    }

    Ok(())
}
