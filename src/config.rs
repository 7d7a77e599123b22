//! Run configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::CaptureOrder;

/// The mapping file name looked up in the working directory.
pub const DEFAULT_MAPPING_FILE: &str = "mapping.txt";

/// Where the code decompiler writes its sources, relative to the project.
pub const DEFAULT_SOURCE_DIR: &str = "app/src/main/java";

/// An error loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config")]
    Io(#[from] io::Error),
    /// The file is not a valid config.
    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),
}

/// Settings for a deobfuscation run.
///
/// Missing fields take their default value, so a config file only needs to
/// name what it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The mapping file, relative to the current working directory.
    pub mapping_file: PathBuf,
    /// The decompiled source root, relative to the project directory.
    pub source_dir: PathBuf,
    /// How class lines are read.
    pub capture_order: CaptureOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mapping_file: PathBuf::from(DEFAULT_MAPPING_FILE),
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            capture_order: CaptureOrder::default(),
        }
    }
}

impl Config {
    /// Loads a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Resolves the mapping file against the current working directory.
    pub fn mapping_path(&self) -> io::Result<PathBuf> {
        Ok(std::env::current_dir()?.join(&self.mapping_file))
    }

    /// Resolves the source root against `project_dir`.
    pub fn source_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.source_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"capture_order": "conventional"}"#).unwrap();
        assert_eq!(config.capture_order, CaptureOrder::Conventional);
        assert_eq!(config.mapping_file, PathBuf::from("mapping.txt"));
        assert_eq!(config.source_dir, PathBuf::from("app/src/main/java"));
    }

    #[test]
    fn unknown_order_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apksource.json");
        fs::write(&path, r#"{"capture_order": "sideways"}"#).unwrap();
        assert!(matches!(Config::from_path(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn source_root_joins_project() {
        let config = Config::default();
        assert_eq!(
            config.source_root(Path::new("MyApp")),
            Path::new("MyApp/app/src/main/java")
        );
    }
}
