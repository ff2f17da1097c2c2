//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::env::EnvError;
use crate::config::schema::BootConfig;
use crate::config::validation::ValidationError;

/// Dotenv file loaded when none is configured explicitly.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Error type for configuration loading and resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid environment: {}", join(.0))]
    Environment(Vec<EnvError>),

    #[error("cannot load env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("cannot build DATABASE_URL: {0}")]
    DatabaseUrl(String),
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse the config file if one is given, otherwise start from defaults.
///
/// Validation is left to the caller so that CLI overrides can be applied first.
pub fn load_or_default(path: Option<&Path>) -> Result<BootConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(BootConfig::default());
    };
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a dotenv file into the process environment.
///
/// Variables already set in the environment win over file entries. An
/// explicit path must exist; the default `.env` is optional. Returns the
/// path that was loaded, if any.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_ENV_FILE);
            if !default.is_file() {
                return Ok(None);
            }
            default
        }
    };

    dotenvy::from_path(&path).map_err(|source| ConfigError::EnvFile {
        path: path.clone(),
        source,
    })?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProbeMode;
    use crate::config::validation::validate_config;

    #[test]
    fn loads_file_with_valid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootgate.toml");
        fs::write(
            &path,
            r#"
            [readiness]
            mode = "tcp"
            interval_ms = 500
            max_interval_ms = 500
            "#,
        )
        .unwrap();

        let config = load_or_default(Some(&path)).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.readiness.mode, ProbeMode::Tcp);
        assert_eq!(config.readiness.interval_ms, 500);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootgate.toml");
        fs::write(&path, "[readiness]\ninterval_ms = 0\n").unwrap();

        let config = load_or_default(Some(&path)).unwrap();
        let err = ConfigError::Validation(validate_config(&config).unwrap_err());
        assert!(err.to_string().contains("readiness.interval_ms"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[readiness\n").unwrap();

        let err = load_or_default(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn no_file_means_defaults() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.readiness.interval_ms, 2_000);
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.env");
        let err = load_env_file(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }

    #[test]
    fn env_file_does_not_override_existing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.env");
        fs::write(
            &path,
            "BOOTGATE_LOADER_TEST_NEW=from-file\nBOOTGATE_LOADER_TEST_SET=from-file\n",
        )
        .unwrap();
        std::env::set_var("BOOTGATE_LOADER_TEST_SET", "from-process");

        let loaded = load_env_file(Some(&path)).unwrap();
        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(std::env::var("BOOTGATE_LOADER_TEST_NEW").unwrap(), "from-file");
        assert_eq!(std::env::var("BOOTGATE_LOADER_TEST_SET").unwrap(), "from-process");
    }
}
