//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::CentipedeConfig;
use config::ConfigError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Platform config file (`<config dir>/centipede.toml`), if the platform has one.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "centipede", "centipede")
            .map(|dirs| dirs.config_dir().join("centipede.toml"))
    }

    /// Load configuration from an explicit file, or the platform default when absent.
    pub fn load(path: Option<&Path>) -> Result<CentipedeConfig, ConfigError> {
        match path {
            Some(path) => MergeService::load_from_file(path),
            None => MergeService::load(Self::default_config_path().as_deref()),
        }
    }

    /// Create default configuration.
    pub fn default() -> CentipedeConfig {
        CentipedeConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centipede.toml");
        std::fs::write(
            &path,
            r#"
[listing]
sort_entries = false

[logging]
level = "debug"
output = "stderr"

[[tasks]]
type = "copy"
target = "/publish/{baseName}"
filter_types = ["image"]

[[tasks]]
type = "createVersion"
target = "{sourceDirectory}"

[tasks.options]
verify_inputs = true
"#,
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert!(!config.listing.sort_entries);
        assert!(config.listing.include_hidden);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.tasks.len(), 2);
        assert_eq!(config.tasks[0].task_type, "copy");
        assert_eq!(config.tasks[0].filter_types, vec!["image".to_string()]);
        assert_eq!(
            config.tasks[1].options["verify_inputs"],
            serde_json::json!(true)
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(ConfigLoader::load(Some(&path)).is_err());
    }

    #[test]
    fn test_defaults_without_any_file() {
        let config = MergeService::load(None).unwrap();
        assert!(config.tasks.is_empty());
        assert_eq!(config.listing, super::super::ListingConfig::default());
    }
}
