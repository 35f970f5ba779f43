//! Tool configuration for the launchspec binary.
//!
//! Loaded from --config, ./.launchspec.yml, or
//! ~/.config/launchspec/launchspec.yml, falling back to defaults.

use clap::ValueEnum;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default ecosystem file looked up when no file is given.
pub const DEFAULT_ECOSYSTEM_FILE: &str = "ecosystem.yml";

/// Output format for `show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ecosystem file used when none is given on the command line.
    #[serde(rename = "default-file")]
    pub default_file: PathBuf,

    /// Directories searched for executables after PATH.
    #[serde(rename = "extra-paths")]
    pub extra_paths: Vec<PathBuf>,

    /// Default output format for `show`.
    #[serde(rename = "output-format")]
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_file: PathBuf::from(DEFAULT_ECOSYSTEM_FILE),
            extra_paths: Vec::new(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try project config
        let project_config = PathBuf::from(format!(".{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", project_config.display(), e);
                }
            }
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.default_file.as_os_str().is_empty() {
            eyre::bail!("default-file cannot be empty");
        }
        if let Some(relative) = self.extra_paths.iter().find(|p| p.is_relative()) {
            eyre::bail!("extra-paths entries must be absolute: {}", relative.display());
        }
        Ok(())
    }
}
