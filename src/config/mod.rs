use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;

pub use loader::ConfigLoader;

use crate::policy::format::{validate_template, FormatError};
use crate::policy::{FormattingPolicy, OutputSpec};
use crate::supervisor::DEFAULT_TAG;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {field} format: {source}")]
    InvalidFormat {
        field: &'static str,
        #[source]
        source: FormatError,
    },
}

/// Get the global directory holding `config.toml`
pub fn get_global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "procstream", "procstream").map(|dirs| dirs.config_dir().to_path_buf())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_tag: String,
    pub log_level: Option<String>,
    pub stdout: StreamConfig,
    pub stderr: StreamConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub format: String,
    /// Defaults to the stream's own descriptor when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

/// Where a formatted stream is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Stdout,
    Stderr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_TAG.to_string(),
            log_level: Some("info".to_string()),
            stdout: StreamConfig::default(),
            stderr: StreamConfig::default(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            format: "{}".to_string(),
            target: None,
        }
    }
}

impl StreamConfig {
    pub fn to_output_spec(&self, fallback: Target) -> Result<OutputSpec, FormatError> {
        match self.target.unwrap_or(fallback) {
            Target::Stdout => OutputSpec::stdout(self.format.clone()),
            Target::Stderr => OutputSpec::stderr(self.format.clone()),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_template(&self.stdout.format).map_err(|source| ConfigError::InvalidFormat {
            field: "stdout",
            source,
        })?;
        validate_template(&self.stderr.format).map_err(|source| ConfigError::InvalidFormat {
            field: "stderr",
            source,
        })?;
        Ok(())
    }

    /// Apply `PROCSTREAM_*` overrides read through `lookup`.
    pub fn merge_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tag) = lookup("PROCSTREAM_DEFAULT_TAG") {
            self.default_tag = tag;
        }
        if let Some(level) = lookup("PROCSTREAM_LOG_LEVEL") {
            self.log_level = Some(level);
        }
        if let Some(format) = lookup("PROCSTREAM_STDOUT_FORMAT") {
            self.stdout.format = format;
        }
        if let Some(format) = lookup("PROCSTREAM_STDERR_FORMAT") {
            self.stderr.format = format;
        }
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_with(|key| std::env::var(key).ok());
    }

    pub fn formatting_policy(&self) -> Result<FormattingPolicy, ConfigError> {
        self.validate()?;
        let stdout = self
            .stdout
            .to_output_spec(Target::Stdout)
            .map_err(|source| ConfigError::InvalidFormat {
                field: "stdout",
                source,
            })?;
        let stderr = self
            .stderr
            .to_output_spec(Target::Stderr)
            .map_err(|source| ConfigError::InvalidFormat {
                field: "stderr",
                source,
            })?;
        Ok(FormattingPolicy::new(stdout, stderr))
    }
}
