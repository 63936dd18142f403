//! CLI configuration file.
//!
//! Read from `--config <path>` or, when present, `~/.config/linerpc/config.toml`.
//! Values are layered: built-in defaults, then the file, then CLI flags.
//!
//! ```toml
//! [host]
//! command = "linerpc"
//! args = ["serve"]
//! malformed_lines = "reply"
//! skip_blank_lines = true
//! ```

use std::path::{Path, PathBuf};

use linerpc_host::{HostConfig, MalformedLinePolicy};
use serde::{Deserialize, Serialize};

use crate::client::HostCommand;

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub host: HostSection,
}

/// `[host]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    /// Program spawned by `linerpc call`.
    pub command: Option<String>,

    /// Arguments passed to `command`.
    #[serde(default)]
    pub args: Vec<String>,

    /// Malformed-line policy used by `linerpc serve`.
    pub malformed_lines: Option<MalformedLinePolicy>,

    /// Whether `linerpc serve` skips whitespace-only lines.
    pub skip_blank_lines: Option<bool>,
}

/// Errors that can occur when loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("[host] command must not be empty")]
    EmptyCommand,
}

impl CliConfig {
    /// Default config file path (`~/.config/linerpc/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/linerpc/config.toml"))
    }

    /// Load `explicit` if given (it must exist), otherwise the default path
    /// if it exists, otherwise built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load the configuration from a specific path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse the configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: CliConfig = toml::from_str(content)?;
        if matches!(config.host.command.as_deref(), Some(command) if command.trim().is_empty()) {
            return Err(ConfigError::EmptyCommand);
        }
        Ok(config)
    }

    /// Host configuration, with CLI flags taking precedence over the file.
    pub fn host_config(
        &self,
        malformed_lines: Option<MalformedLinePolicy>,
        skip_blank_lines: Option<bool>,
    ) -> HostConfig {
        let defaults = HostConfig::default();
        HostConfig {
            malformed_lines: malformed_lines
                .or(self.host.malformed_lines)
                .unwrap_or(defaults.malformed_lines),
            skip_blank_lines: skip_blank_lines
                .or(self.host.skip_blank_lines)
                .unwrap_or(defaults.skip_blank_lines),
        }
    }

    /// Command used to spawn a host: the CLI argv if given, else the file's
    /// `[host]` command, else `fallback`.
    pub fn host_command(&self, argv: &[String], fallback: HostCommand) -> HostCommand {
        if let Some(command) = HostCommand::from_argv(argv) {
            return command;
        }
        match &self.host.command {
            Some(program) => HostCommand {
                program: program.clone(),
                args: self.host.args.clone(),
            },
            None => fallback,
        }
    }
}
