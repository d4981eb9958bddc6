//! Configuration for the client binary.
//!
//! The configuration lives in `goban-config.yaml` next to the binary. Every
//! field has a default, so a missing file or a partial one is fine.
//!
//! ```yaml
//! share_base_url: "https://goban.example/play"
//! board_size: 9
//! demo:
//!   moves: ["2-2", "6-6", "2-6"]
//!   step_delay_ms: 200
//! store:
//!   read_requires_auth: false
//!   write_requires_auth: true
//! ```

use std::path::Path;

use goban_store::{Access, Rules};
use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of share links; the game id is appended.
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,

    /// Side length of boards created by the client.
    #[serde(default = "default_board_size")]
    pub board_size: u32,

    /// Scripted demo game.
    #[serde(default)]
    pub demo: DemoConfig,

    /// Access rules of the in-process store.
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            share_base_url: default_share_base_url(),
            board_size: default_board_size(),
            demo: DemoConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `GOBAN_SHARE_BASE_URL` overrides `share_base_url`
    /// - `GOBAN_BOARD_SIZE` overrides `board_size`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GOBAN_SHARE_BASE_URL") {
            self.share_base_url = val;
        }
        if let Ok(val) = std::env::var("GOBAN_BOARD_SIZE") {
            match val.parse() {
                Ok(size) => self.board_size = size,
                Err(err) => warn!(value = val, error = %err, "ignoring invalid GOBAN_BOARD_SIZE"),
            }
        }
    }
}

/// The scripted game played by the demo.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Goban keys (`"x-y"`) clicked in turn, black first.
    #[serde(default = "default_moves")]
    pub moves: Vec<String>,

    /// Pause between scripted moves, in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            moves: default_moves(),
            step_delay_ms: default_step_delay_ms(),
        }
    }
}

/// Who may read and write the in-process store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Reads need a signed-in connection.
    #[serde(default)]
    pub read_requires_auth: bool,

    /// Writes need a signed-in connection.
    #[serde(default = "default_true")]
    pub write_requires_auth: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            read_requires_auth: false,
            write_requires_auth: true,
        }
    }
}

impl StoreConfig {
    /// Store rules matching this configuration.
    pub const fn rules(self) -> Rules {
        const fn access(requires_auth: bool) -> Access {
            if requires_auth {
                Access::Authenticated
            } else {
                Access::Public
            }
        }
        Rules::with_defaults(access(self.read_requires_auth), access(self.write_requires_auth))
    }
}

fn default_share_base_url() -> String {
    "http://localhost:8080/game".to_owned()
}

const fn default_board_size() -> u32 {
    9
}

fn default_moves() -> Vec<String> {
    ["2-2", "6-6", "2-6", "6-2", "4-4"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

const fn default_step_delay_ms() -> u64 {
    100
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.board_size, 9);
        assert_eq!(config.demo.moves.len(), 5);
        assert!(!config.store.read_requires_auth);
        assert!(config.store.write_requires_auth);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
share_base_url: "https://goban.example/play"
board_size: 13
demo:
  moves: ["0-0", "12-12"]
  step_delay_ms: 5
store:
  read_requires_auth: true
  write_requires_auth: false
"#;
        let config = ClientConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.share_base_url, "https://goban.example/play");
        assert_eq!(config.board_size, 13);
        assert_eq!(config.demo.moves, vec!["0-0", "12-12"]);
        assert_eq!(config.demo.step_delay_ms, 5);
        assert!(config.store.read_requires_auth);
        assert!(!config.store.write_requires_auth);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = ClientConfig::parse("board_size: 19\n").unwrap_or_default();
        assert_eq!(config.board_size, 19);
        assert_eq!(config.demo, DemoConfig::default());
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = ClientConfig::parse("board_size: [nine]\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
