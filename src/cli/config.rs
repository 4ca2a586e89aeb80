//! Command-line interface configuration
//!
//! The `imxfuse` binary reads an optional `imxfuse.toml` so that
//! operators do not have to repeat `--device` or `--fuse-file` on every
//! invocation. A file in the current directory takes precedence over the
//! per-user configuration directory.

use std::{env, fs::read_to_string, path::PathBuf};

use directories::ProjectDirs;
use log::debug;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "imxfuse.toml";

/// Operator preferences for the imxfuse binary.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Preferred OCOTP nvmem device path
    #[serde(default)]
    pub device: Option<PathBuf>,
    /// Default SRK fuse file to compare against
    #[serde(default)]
    pub fuse_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the configuration file, if one exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw_data = read_to_string(&path).into_diagnostic()?;
        let config: Config = toml::from_str(&raw_data)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
        debug!("Config: {:#?}", config);

        Ok(config)
    }

    fn config_path() -> PathBuf {
        if let Ok(current_dir) = env::current_dir() {
            let local_config = current_dir.join(CONFIG_FILE);
            if local_config.exists() {
                return local_config;
            }
        }

        let project_dirs = ProjectDirs::from("", "", "imxfuse").unwrap();
        project_dirs.config_dir().join(CONFIG_FILE)
    }
}
