//! Module for application configuration settings.
//!
//! User configurations may be specified in a configuration file. Without one, the defaults
//! browse the `default` bucket under the current directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const APP_DIR: &str = "bucket-fs";

fn default_bucket() -> String {
    "default".to_owned()
}

fn default_store_root() -> PathBuf {
    PathBuf::from(".")
}

/// Where bucket contents come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Local directory whose subdirectories are buckets.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

/// Directory listing behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingConfig {
    /// Maximum keys requested per listing page. The store's default when unset.
    pub page_size: Option<u32>,
}

/// Application configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Bucket to browse.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    /// Open files as seekable handles.
    #[serde(default)]
    pub seekable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            store: StoreConfig::default(),
            listing: ListingConfig::default(),
            seekable: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation errors: {0:?}")]
    ValidationErrors(Vec<String>),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Config {
    /// Validate the correctness of the configuration.
    ///
    /// Returns:
    /// - `Ok(())` if the configuration is valid.
    /// - `Err(Vec<String>)` containing a list of validation error messages otherwise.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.bucket.is_empty() {
            errors.push("Bucket name must not be empty.".to_owned());
        } else if self.bucket.contains('/') || matches!(self.bucket.as_str(), "." | "..") {
            errors.push(format!("Bucket name '{}' is not valid.", self.bucket));
        }

        if self.listing.page_size == Some(0) {
            errors.push("Listing page size must be at least 1.".to_owned());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns config file paths in descending priority order.
    /// On macOS, skips `dirs::config_dir()` (resolves to ~/Library/Application Support/).
    fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(not(target_os = "macos"))]
        if let Some(xdg) = dirs::config_dir() {
            paths.push(xdg.join(APP_DIR).join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join(APP_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from("/etc").join(APP_DIR).join("config.toml"));

        paths
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::config_search_paths().into_iter().find(|p| p.exists())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = ?path, "Loading configuration file.");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads and validates configuration from the external path if given, else the first
    /// config file found. Falls back to defaults when there is none.
    pub fn load(external_config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let found = external_config_path
            .map(Path::to_path_buf)
            .or_else(Self::find_config_file);

        let config = match found {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults.");
                Self::default()
            }
        };

        config.validate().map_err(ConfigError::ValidationErrors)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write as _;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config = Config::from_toml(
            r#"
            bucket = "photos"
            seekable = true

            [store]
            root = "/srv/buckets"

            [listing]
            page-size = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket, "photos");
        assert!(config.seekable);
        assert_eq!(config.store.root, PathBuf::from("/srv/buckets"));
        assert_eq!(config.listing.page_size, Some(50));
    }

    #[test]
    fn validation_collects_every_problem() {
        let config = Config {
            bucket: "a/b".to_owned(),
            listing: ListingConfig { page_size: Some(0) },
            ..Config::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn explicit_path_is_loaded_and_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bucket = \"\"").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationErrors(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bucket = \"logs\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.bucket, "logs");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            Config::from_toml("bucket = ["),
            Err(ConfigError::DeserializationError(_))
        ));
    }
}
