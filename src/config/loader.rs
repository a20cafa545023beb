//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! settings and seed data from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, SeedConfig};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml   # Token, request and server settings (required)
/// └── seed.yaml     # Employees and periods to bootstrap (optional)
/// ```
///
/// # Example
///
/// ```no_run
/// use leave_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// println!("Tokens live {} hours", loader.engine().tokens.ttl_hours);
/// # Ok::<(), leave_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    engine: EngineConfig,
    seed: SeedConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns `ConfigNotFound` when `engine.yaml` is missing and
    /// `ConfigParseError` when either file is malformed or a token setting is
    /// out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let engine_path = path.join("engine.yaml");
        let engine = Self::load_yaml::<EngineConfig>(&engine_path)?;
        engine
            .tokens
            .validate()
            .map_err(|message| EngineError::ConfigParseError {
                path: engine_path.display().to_string(),
                message,
            })?;

        let seed_path = path.join("seed.yaml");
        let seed = if seed_path.exists() {
            Self::load_yaml::<SeedConfig>(&seed_path)?
        } else {
            SeedConfig::default()
        };

        Ok(Self { engine, seed })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the engine settings.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns the seed data.
    pub fn seed(&self) -> &SeedConfig {
        &self.seed
    }

    /// Splits the loader into its parts.
    pub fn into_parts(self) -> (EngineConfig, SeedConfig) {
        (self.engine, self.seed)
    }
}
