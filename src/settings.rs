//! Handler settings delivered by the agent in `<seq>.settings`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::telemetry::LogContext;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings {0} contain no runtime settings")]
    NoRuntimeSettings(PathBuf),

    #[error("commandToExecute is not specified")]
    MissingCommand,
}

/// Public settings of the extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    #[serde(default)]
    pub file_uris: Vec<String>,
    #[serde(default)]
    pub command_to_execute: String,
}

impl PublicSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.command_to_execute.trim().is_empty() {
            return Err(SettingsError::MissingCommand);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument {
    #[serde(default)]
    runtime_settings: Vec<RuntimeSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeSettings {
    handler_settings: HandlerSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandlerSettings {
    #[serde(default)]
    public_settings: Option<PublicSettings>,
    #[serde(default)]
    protected_settings: Option<String>,
}

/// Load the public settings of the first runtime settings entry in `path`.
pub fn load(path: &Path, log: &LogContext) -> Result<PublicSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: SettingsDocument =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let handler = document
        .runtime_settings
        .into_iter()
        .next()
        .ok_or_else(|| SettingsError::NoRuntimeSettings(path.to_path_buf()))?
        .handler_settings;

    if handler.protected_settings.is_some_and(|p| !p.is_empty()) {
        let _span = log.span().entered();
        warn!("Ignoring protectedSettings, only publicSettings are supported");
    }

    Ok(handler.public_settings.unwrap_or_default())
}
