//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;
pub mod text;

use std::path::Path;

use profex_core::ProfexConfig;
use tracing::debug;

/// Load the configuration: an explicit path, else the user config file if
/// one exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ProfexConfig> {
    if let Some(path) = config_path {
        return Ok(ProfexConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(ProfexConfig::from_file(&default_path)?)
    } else {
        Ok(ProfexConfig::default())
    }
}
