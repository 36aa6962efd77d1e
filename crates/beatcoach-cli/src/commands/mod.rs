//! CLI command implementations.

pub mod config;
pub mod simulate;
pub mod timeline;

use std::path::Path;

use anyhow::{Context, Result};
use beatcoach_core::{EngineConfig, LevelConfig};
use tracing::info;

/// Load the engine configuration, or the defaults when no path is given.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)
                .with_context(|| format!("Failed to load engine config from {}", path.display()))?;
            info!("Loaded engine config from {}", path.display());
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

pub fn load_level(path: &Path) -> Result<LevelConfig> {
    LevelConfig::load(path).with_context(|| format!("Failed to load level from {}", path.display()))
}
