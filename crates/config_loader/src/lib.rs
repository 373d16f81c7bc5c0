//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Fall back to environment variables when no file is readable
//! - Validate configuration legality once, at startup
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//!
//! let (config, source) = ConfigLoader::load().unwrap();
//! println!("function: {} (from {source})", config.invocation.function);
//! ```

mod env;
mod parser;
mod validator;

pub use contracts::DispatcherConfig;
pub use env::ENV_VARS;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Base name of the configuration file
pub const CONFIG_FILE_NAME: &str = "ws-message-dispatcher";

/// Recognized configuration file extensions, in lookup order
pub const CONFIG_EXTENSIONS: [&str; 4] = ["toml", "json", "yaml", "yml"];

/// Directories searched for the configuration file, in order
pub const CONFIG_SEARCH_DIRS: [&str; 2] = ["/etc/ws-message-dispatcher", "./config"];

/// Where a configuration was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Environment => f.write_str("environment"),
        }
    }
}

/// Configuration loader
///
/// Provides static methods to load configuration from files, strings or the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the first config file found in [`CONFIG_SEARCH_DIRS`],
    /// otherwise from environment variables.
    ///
    /// A file that exists but fails to parse or validate is an error; it does
    /// not fall through to the environment.
    pub fn load() -> Result<(DispatcherConfig, ConfigSource), ContractError> {
        let dirs: Vec<PathBuf> = CONFIG_SEARCH_DIRS.iter().map(PathBuf::from).collect();
        match Self::discover(&dirs) {
            Some(path) => {
                let config = Self::load_from_path(&path)?;
                info!(path = %path.display(), "config read from file");
                Ok((config, ConfigSource::File(path)))
            }
            None => {
                warn!("unable to read config file, trying with env vars");
                let config = Self::load_from_env()?;
                info!("config read from envs");
                Ok((config, ConfigSource::Environment))
            }
        }
    }

    /// Find `ws-message-dispatcher.{toml,json,yaml,yml}` in the given directories
    pub fn discover(dirs: &[PathBuf]) -> Option<PathBuf> {
        dirs.iter()
            .flat_map(|dir| {
                CONFIG_EXTENSIONS
                    .into_iter()
                    .map(move |ext| dir.join(format!("{CONFIG_FILE_NAME}.{ext}")))
            })
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json / .yaml / .yml).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DispatcherConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatcherConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from process environment variables
    pub fn load_from_env() -> Result<DispatcherConfig, ContractError> {
        Self::load_from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn load_from_vars(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<DispatcherConfig, ContractError> {
        let config = env::from_vars(lookup)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(config: &DispatcherConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize configuration to JSON string
    pub fn to_json(config: &DispatcherConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
