/*
[INPUT]:  Optional YAML file + SECPROBE__SECTION__KEY environment variables
[OUTPUT]: ConsoleConfig (engine, auth, polling, logging)
[POS]:    Configuration layer - shared by the binary and embedding callers
[UPDATE]: When adding configuration options
*/

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File, FileFormat};
use secprobe_adapter::{ClientConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::poller::PollCadence;

const ENV_PREFIX: &str = "SECPROBE";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration for the console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub engine: EngineSettings,
    pub auth: AuthSettings,
    pub polling: PollingSettings,
    pub logging: LoggingSettings,
}

/// Where the execution engine lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Credentials injected into the engine client. Tokens win over a password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Single-task detail cadence
    pub detail_interval_ms: u64,
    /// Task list cadence
    pub list_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            detail_interval_ms: 3_000,
            list_interval_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// EnvFilter directive, e.g. "info" or "secprobe_console=debug"
    pub level: String,
    /// Daily rolling log files are written here when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// `$XDG_CONFIG_HOME/secprobe/config.yaml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("secprobe").join("config.yaml"))
}

impl ConsoleConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; without one the default location is used
    /// if present. Environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`ConsoleConfig::load`] with the environment replaced by `env`
    /// when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(
                        File::from(default_path.as_path())
                            .format(FileFormat::Yaml)
                            .required(false),
                    );
                }
            }
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);
        builder = builder.add_source(environment);

        let config: Self = builder
            .build()
            .context("failed to read configuration sources")?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.base_url.trim().is_empty() {
            bail!("engine.base_url must not be empty");
        }
        if self.engine.timeout_secs == 0 || self.engine.connect_timeout_secs == 0 {
            bail!("engine timeouts must be greater than zero");
        }
        if self.polling.detail_interval_ms == 0 || self.polling.list_interval_ms == 0 {
            bail!("polling intervals must be greater than zero");
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize config to YAML")
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.engine.timeout_secs),
            connect_timeout: Duration::from_secs(self.engine.connect_timeout_secs),
        }
    }

    pub fn cadence(&self) -> PollCadence {
        PollCadence::from_millis(
            self.polling.detail_interval_ms,
            self.polling.list_interval_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = ConsoleConfig::load_with_env(
            Some(yaml_file("{}\n").path()),
            Some(HashMap::new()),
        )
        .expect("load");
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.engine.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.cadence(), PollCadence::default());
        assert_eq!(config.client_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_file_values_with_partial_sections() {
        let file = yaml_file(
            "engine:\n  base_url: http://engine.internal:9000\npolling:\n  detail_interval_ms: 1500\nauth:\n  username: ops\n",
        );
        let config = ConsoleConfig::load_with_env(Some(file.path()), Some(HashMap::new())).expect("load");
        assert_eq!(config.engine.base_url, "http://engine.internal:9000");
        assert_eq!(config.engine.timeout_secs, 30);
        assert_eq!(config.polling.detail_interval_ms, 1500);
        assert_eq!(config.polling.list_interval_ms, 5000);
        assert_eq!(config.auth.username.as_deref(), Some("ops"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = yaml_file("polling:\n  list_interval_ms: 8000\n");
        let env = HashMap::from([
            ("SECPROBE__POLLING__LIST_INTERVAL_MS".to_string(), "2500".to_string()),
            ("SECPROBE__LOGGING__LEVEL".to_string(), "debug".to_string()),
        ]);
        let config = ConsoleConfig::load_with_env(Some(file.path()), Some(env)).expect("load");
        assert_eq!(config.polling.list_interval_ms, 2500);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let file = yaml_file("polling:\n  detail_interval_ms: 0\n");
        assert!(ConsoleConfig::load_with_env(Some(file.path()), Some(HashMap::new())).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/secprobe/config.yaml");
        assert!(ConsoleConfig::load_with_env(Some(missing), Some(HashMap::new())).is_err());
    }

    #[test]
    fn test_yaml_round_trip_skips_empty_credentials() {
        let yaml = ConsoleConfig::default().to_yaml().expect("yaml");
        assert!(!yaml.contains("password"));
        let parsed: ConsoleConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(parsed, ConsoleConfig::default());
    }
}
