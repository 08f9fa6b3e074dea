//! Pipeline configuration loading.
//!
//! The user config lives in the OS config dir (via confy). An explicit path
//! bypasses it entirely.

use std::fs;
use std::path::{Path, PathBuf};

use liveparse_types::PipelineConfig;
use thiserror::Error;

pub const APP_NAME: &str = "liveparse";
pub const CONFIG_NAME: &str = "pipeline";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error(transparent)]
    Confy(#[from] confy::ConfyError),
}

/// Load the user's pipeline config, creating it with defaults on first run.
pub fn load_user_config() -> Result<PipelineConfig, ConfigError> {
    Ok(confy::load(APP_NAME, CONFIG_NAME)?)
}

/// Load a config from a specific TOML file.
pub fn load_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn save_file(path: &Path, config: &PipelineConfig) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    fs::write(path, contents).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Explicit file if given, else the user config. A broken user config falls
/// back to defaults with a warning; a broken explicit file is an error.
pub fn resolve(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    if let Some(path) = path {
        return load_file(path);
    }
    match load_user_config() {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load user config, using defaults");
            Ok(PipelineConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveparse_types::DecodeMode;

    #[test]
    fn test_save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let config = PipelineConfig {
            mode: DecodeMode::Parallel,
            workers: 6,
            encounter_uid: Some("f00d".to_string()),
            ..Default::default()
        };

        save_file(&path, &config).unwrap();
        let loaded = load_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file(Path::new("/nonexistent/liveparse/pipeline.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, "mode = \"sideways\"\n").unwrap();
        let err = load_file(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, "workers = 9\n").unwrap();
        let config = resolve(Some(&path)).unwrap();

        assert_eq!(config.workers, 9);
        assert_eq!(config.mode, DecodeMode::Inline);
    }
}
