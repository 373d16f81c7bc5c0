//! Command implementations.

mod inspect;
mod serve;
mod validate;

pub use inspect::{run_chat_type, run_peers, run_targets};
pub use serve::run_serve;
pub use validate::run_validate;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, ConfigSource, DispatcherConfig};
use tracing::info;

use crate::cli::ConfigArgs;

/// Load configuration from `--config`, or discover it (file, then environment)
fn load_config(args: &ConfigArgs) -> Result<(DispatcherConfig, ConfigSource)> {
    let (config, source) = match &args.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            let config = ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, ConfigSource::File(path.clone()))
        }
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };

    info!(source = %source, "Configuration loaded");
    Ok((config, source))
}
