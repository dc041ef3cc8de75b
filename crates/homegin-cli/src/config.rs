//! Config - Configuration File Handling
//!
//! Reads `homegin.toml`: `[experiment]` hyperparameters, `[layout]`
//! directories and `[dataset]` activities, merges, houses and ranges.
//! Missing sections and keys fall back to the defaults.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::{Path, PathBuf};

use homegin::{DataLayout, ExperimentConfig};
use homegin_data::DatasetConfig;
use serde::{Deserialize, Serialize};

use crate::cli::LayoutArgs;
use crate::error::{CliError, CliResult};

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "homegin.toml";

// =============================================================================
// Project Configuration
// =============================================================================

/// Project configuration (homegin.toml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Training hyperparameters
    pub experiment: ExperimentConfig,

    /// Input and output directories
    pub layout: DataLayout,

    /// Activities, merges, houses and ranges
    pub dataset: DatasetConfig,
}

impl ProjectConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        let config: ProjectConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CliResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CliError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads `explicit` if given, else `homegin.toml` when present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Applies command-line directory overrides.
    pub fn apply_layout(&mut self, args: &LayoutArgs) {
        if let Some(dir) = &args.data_dir {
            self.layout.data_dir.clone_from(dir);
        }
        if let Some(dir) = &args.logs_dir {
            self.layout.logs_dir.clone_from(dir);
        }
        if let Some(dir) = &args.output_dir {
            self.layout.output_dir.clone_from(dir);
        }
        if let Some(dir) = &args.embedding_mirror_dir {
            self.layout.embedding_mirror_dir = Some(dir.clone());
        }
    }
}
