//! Provisioning environment
//!
//! The agent describes where a handler must read its settings from and write
//! its status to in `HandlerEnvironment.json`, and identifies the request being
//! processed by a sequence number: either `ConfigSequenceNumber` in the process
//! environment or the highest `<N>.settings` file in the config folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::HandlerConfig;
use crate::telemetry::LogContext;

pub const HANDLER_ENVIRONMENT_FILE: &str = "HandlerEnvironment.json";
pub const SEQUENCE_NUMBER_VAR: &str = "ConfigSequenceNumber";
const SETTINGS_EXTENSION: &str = "settings";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} contains no handler environment")]
    Empty { path: PathBuf },

    #[error("invalid ConfigSequenceNumber value {0:?}")]
    InvalidSequenceNumber(String),

    #[error("no .settings file found in {0}")]
    NoSettings(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerEnvironment {
    pub log_folder: PathBuf,
    pub config_folder: PathBuf,
    pub status_folder: PathBuf,
    #[serde(default)]
    pub heartbeat_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandlerEnvironmentEntry {
    handler_environment: HandlerEnvironment,
}

impl HandlerEnvironment {
    pub fn load(path: &Path) -> Result<Self, EnvironmentError> {
        let raw = fs::read_to_string(path).map_err(|source| EnvironmentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<HandlerEnvironmentEntry> =
            serde_json::from_str(&raw).map_err(|source| EnvironmentError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        entries
            .into_iter()
            .next()
            .map(|entry| entry.handler_environment)
            .ok_or_else(|| EnvironmentError::Empty {
                path: path.to_path_buf(),
            })
    }
}

/// Everything one invocation needs to know about the request it serves
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub seq: u64,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub status_file: PathBuf,
    pub settings_file: PathBuf,
    pub environment: HandlerEnvironment,
}

/// Resolve the invocation context from the provisioning environment.
///
/// `sequence_override` is the raw value of `ConfigSequenceNumber`, if set.
pub fn resolve(
    config: &HandlerConfig,
    sequence_override: Option<String>,
    log: &LogContext,
) -> Result<InvocationContext, EnvironmentError> {
    let _span = log.span().entered();

    let env_path = config
        .handler_environment
        .clone()
        .unwrap_or_else(|| PathBuf::from(HANDLER_ENVIRONMENT_FILE));
    debug!(file = ?env_path, "Loading handler environment");
    let environment = HandlerEnvironment::load(&env_path)?;

    let seq = match sequence_override {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| EnvironmentError::InvalidSequenceNumber(raw))?,
        None => highest_settings_sequence(&environment.config_folder)?,
    };

    info!(seq, config_folder = ?environment.config_folder, "Resolved handler environment");

    Ok(InvocationContext {
        seq,
        data_dir: config.data_dir.clone(),
        download_dir: config.download_dir(seq),
        status_file: environment.status_folder.join(format!("{seq}.status")),
        settings_file: environment
            .config_folder
            .join(format!("{seq}.{SETTINGS_EXTENSION}")),
        environment,
    })
}

/// Highest N among the `N.settings` files of `config_folder`
pub fn highest_settings_sequence(config_folder: &Path) -> Result<u64, EnvironmentError> {
    let entries = fs::read_dir(config_folder).map_err(|source| EnvironmentError::Io {
        path: config_folder.to_path_buf(),
        source,
    })?;

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension()? != SETTINGS_EXTENSION {
                return None;
            }
            path.file_stem()?.to_str()?.parse::<u64>().ok()
        })
        .max()
        .ok_or_else(|| EnvironmentError::NoSettings(config_folder.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_environment(root: &Path) -> PathBuf {
        for folder in ["config", "status", "log"] {
            fs::create_dir_all(root.join(folder)).unwrap();
        }
        let path = root.join(HANDLER_ENVIRONMENT_FILE);
        let doc = serde_json::json!([{
            "name": "CustomScript",
            "version": 1.0,
            "handlerEnvironment": {
                "logFolder": root.join("log"),
                "configFolder": root.join("config"),
                "statusFolder": root.join("status"),
                "heartbeatFile": root.join("heartbeat.log"),
            }
        }]);
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    fn config_for(root: &Path, env_path: PathBuf) -> HandlerConfig {
        HandlerConfig {
            data_dir: root.join("data"),
            handler_environment: Some(env_path),
            ..HandlerConfig::default()
        }
    }

    #[test]
    fn test_resolves_highest_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let env_path = write_environment(root);
        for name in ["0.settings", "2.settings", "10.settings", "11.status", "x.settings"] {
            fs::write(root.join("config").join(name), "{}").unwrap();
        }

        let ctx = resolve(&config_for(root, env_path), None, &LogContext::default()).unwrap();

        assert_eq!(ctx.seq, 10);
        assert_eq!(ctx.status_file, root.join("status").join("10.status"));
        assert_eq!(ctx.settings_file, root.join("config").join("10.settings"));
        assert_eq!(ctx.download_dir, root.join("data").join("download").join("10"));
    }

    #[test]
    fn test_sequence_variable_wins() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let env_path = write_environment(root);
        fs::write(root.join("config").join("3.settings"), "{}").unwrap();

        let ctx = resolve(
            &config_for(root, env_path),
            Some("7".to_string()),
            &LogContext::default(),
        )
        .unwrap();

        assert_eq!(ctx.seq, 7);
    }

    #[test]
    fn test_invalid_sequence_variable() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let env_path = write_environment(root);

        let err = resolve(
            &config_for(root, env_path),
            Some("-1".to_string()),
            &LogContext::default(),
        )
        .unwrap_err();

        assert!(matches!(err, EnvironmentError::InvalidSequenceNumber(_)));
    }

    #[test]
    fn test_missing_handler_environment() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let err = resolve(
            &config_for(root, root.join(HANDLER_ENVIRONMENT_FILE)),
            None,
            &LogContext::default(),
        )
        .unwrap_err();

        assert!(matches!(err, EnvironmentError::Io { .. }));
    }

    #[test]
    fn test_empty_handler_environment() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(HANDLER_ENVIRONMENT_FILE);
        fs::write(&path, "[]").unwrap();

        assert!(matches!(
            HandlerEnvironment::load(&path),
            Err(EnvironmentError::Empty { .. })
        ));
    }

    #[test]
    fn test_malformed_handler_environment() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(HANDLER_ENVIRONMENT_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            HandlerEnvironment::load(&path),
            Err(EnvironmentError::Parse { .. })
        ));
    }

    #[test]
    fn test_no_settings_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let env_path = write_environment(root);

        let err = resolve(&config_for(root, env_path), None, &LogContext::default()).unwrap_err();

        assert!(matches!(err, EnvironmentError::NoSettings(_)));
    }
}
