//! MergeService: orchestrates sources and deserializes to CentipedeConfig.

use crate::config::sources::{environment, file};
use crate::config::CentipedeConfig;
use config::{Config, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from an optional file that may be missing.
    /// Precedence: serde defaults (lowest) -> file -> environment (highest).
    pub fn load(optional_file: Option<&Path>) -> Result<CentipedeConfig, ConfigError> {
        let builder = Config::builder();
        let builder = match optional_file {
            Some(path) => file::add_to_builder(builder, path, false)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific file, which must exist, with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<CentipedeConfig, ConfigError> {
        let builder = file::add_to_builder(Config::builder(), path, true)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}
