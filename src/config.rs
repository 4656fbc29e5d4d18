use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "custom-script-handler.toml";

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "CUSTOM_SCRIPT";

/// Handler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Where the sequence checkpoint and downloaded payloads live
    pub data_dir: PathBuf,
    /// Explicit path of HandlerEnvironment.json (defaults to the working directory)
    pub handler_environment: Option<PathBuf>,
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Shell used to run commandToExecute
    pub shell: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/azure/custom-script"),
            handler_environment: None,
            log_level: "info".to_string(),
            shell: "/bin/sh".to_string(),
        }
    }
}

impl HandlerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (custom-script-handler.toml)
    /// 3. Environment variables (prefixed with CUSTOM_SCRIPT_)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE), ENV_PREFIX)
    }

    pub fn load_from(file: &Path, env_prefix: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Directory holding payloads and output of request `seq`
    pub fn download_dir(&self, seq: u64) -> PathBuf {
        self.data_dir.join("download").join(seq.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_sources() {
        let temp_dir = TempDir::new().unwrap();
        let config = HandlerConfig::load_from(
            &temp_dir.path().join("absent.toml"),
            "CUSTOM_SCRIPT_TEST_DEFAULTS",
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/azure/custom-script"));
        assert_eq!(config.handler_environment, None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.shell, "/bin/sh");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("handler.toml");
        std::fs::write(&file, "data_dir = \"/tmp/cse\"\nlog_level = \"debug\"\n").unwrap();

        let config = HandlerConfig::load_from(&file, "CUSTOM_SCRIPT_TEST_FILE").unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/cse"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.shell, "/bin/sh");
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("handler.toml");
        std::fs::write(&file, "data_dir = \"/tmp/from-file\"\n").unwrap();
        std::env::set_var("CUSTOM_SCRIPT_TEST_ENV_DATA_DIR", "/tmp/from-env");

        let config = HandlerConfig::load_from(&file, "CUSTOM_SCRIPT_TEST_ENV").unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/from-env"));
    }

    #[test]
    fn test_download_dir_is_namespaced_by_sequence() {
        let config = HandlerConfig {
            data_dir: PathBuf::from("/data"),
            ..HandlerConfig::default()
        };
        assert_eq!(config.download_dir(12), PathBuf::from("/data/download/12"));
    }
}
