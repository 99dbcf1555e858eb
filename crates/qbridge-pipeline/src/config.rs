//! Pipeline configuration.
//!
//! Loaded from YAML; every field has a default so a partial file (or no
//! file) is valid. Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use qbridge_eval::{DEFAULT_THRESHOLD, DEFAULT_TOLERANCE};
use qbridge_hal::CredentialResolver;
use qbridge_hal::credential::{DEFAULT_CONFIG_FILE, DEFAULT_SENTINELS, TOKEN_ENV_VAR};

use crate::error::ConfigError;

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Shots per circuit.
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Per-execution timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Handshake timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Remote job poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How many online backends to try, in provider order, before the simulator.
    #[serde(default = "default_max_remote_backends")]
    pub max_remote_backends: usize,

    /// Skip credentials and discovery entirely.
    #[serde(default)]
    pub local_only: bool,

    /// Fixed simulator seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Provider API endpoint; the transport's default when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// IBM Cloud instance CRN. When set, the access token is an IBM Cloud
    /// API key exchanged through IAM rather than a direct bearer.
    #[serde(default)]
    pub service_crn: Option<String>,

    /// Validation limits.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Credential sources.
    #[serde(default)]
    pub credential: CredentialConfig,
}

/// Limits for the Bell and GHZ checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum correlated fraction.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Maximum anti-correlated fraction.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

/// Where to look for the access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Environment variable holding the token.
    #[serde(default = "default_env_var")]
    pub env_var: String,
    /// `KEY=value` file consulted after the environment.
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    /// Key looked up in the file.
    #[serde(default = "default_env_var")]
    pub key: String,
    /// Values treated as unset.
    #[serde(default = "default_sentinels")]
    pub sentinels: Vec<String>,
}

fn default_shots() -> u32 {
    1000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_remote_backends() -> usize {
    1
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_env_var() -> String {
    TOKEN_ENV_VAR.to_string()
}

fn default_config_file() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn default_sentinels() -> Vec<String> {
    DEFAULT_SENTINELS.iter().map(|s| (*s).to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shots: default_shots(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_remote_backends: default_max_remote_backends(),
            local_only: false,
            seed: None,
            endpoint: None,
            service_crn: None,
            validation: ValidationConfig::default(),
            credential: CredentialConfig::default(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            env_var: default_env_var(),
            config_file: default_config_file(),
            key: default_env_var(),
            sentinels: default_sentinels(),
        }
    }
}

impl CredentialConfig {
    /// The environment-then-file resolver these settings describe.
    pub fn resolver(&self) -> CredentialResolver {
        CredentialResolver::standard(&self.env_var, self.config_file.clone(), &self.key)
            .with_sentinels(self.sentinels.iter().cloned())
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shots == 0 {
            return Err(ConfigError::ValidationError(
                "shots must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("timeout_ms", self.timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        for (name, value) in [
            ("validation.threshold", self.validation.threshold),
            ("validation.tolerance", self.validation.tolerance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Per-execution timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Handshake timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Remote poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
