use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Writes the example configuration to the default location and tells the
/// user what to do next.
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    let config = setup_at_path(&path)?;
    println!("Created configuration at {}", path.display());
    println!("API endpoint: {}", config.api.base_url);
    println!("Sign in with `fintrack login --email <EMAIL>`.");
    Ok(())
}

/// Writes the example configuration to `path`, refusing to overwrite an
/// existing file. Returns the configuration that was written.
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    let config: AppConfig =
        serde_yaml::from_str(EXAMPLE_CONFIG).context("Bundled example config is invalid")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(config)
}
