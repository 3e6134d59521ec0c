// ABOUTME: Loads TOML configuration for the power-limit daemon.
// ABOUTME: Provides defaults for the node path, saved-state persistence and bus selection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use powerlimit_ipc::BusKind;

use crate::node::DEFAULT_NODE_PATH;

const DEFAULT_CONFIG_PATH: &str = "/etc/powerlimit/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_state_path")]
    pub state_path: String,
    /// Re-apply the last accepted value to the node at startup.
    #[serde(default)]
    pub restore_on_start: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default)]
    pub kind: BusKind,
}

fn default_node_path() -> String {
    DEFAULT_NODE_PATH.to_string()
}

fn default_state_path() -> String {
    "/var/lib/powerlimit/state".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            path: default_node_path(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            restore_on_start: false,
        }
    }
}

impl Config {
    /// Load configuration from the standard config file location.
    /// Falls back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config_path = Self::config_file_path();
        if !config_path.exists() {
            tracing::info!("No config at {}, using defaults", config_path.display());
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(&config_path)?;
        Self::load_from_str(&contents)
    }

    fn load_from_str(contents: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(toml::from_str(contents)?)
    }

    fn config_file_path() -> PathBuf {
        std::env::var("POWERLIMIT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Resolve the node path, respecting POWERLIMIT_NODE_PATH env var override.
    pub fn node_path(&self) -> PathBuf {
        if let Ok(override_path) = std::env::var("POWERLIMIT_NODE_PATH") {
            return PathBuf::from(override_path);
        }
        PathBuf::from(&self.node.path)
    }

    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(&self.persistence.state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_empty_toml_gives_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.node.path, "/sys/kernel/cpu_power_toggle/limit_mode");
        assert_eq!(config.persistence.state_path, "/var/lib/powerlimit/state");
        assert!(!config.persistence.restore_on_start);
        assert_eq!(config.bus.kind, BusKind::System);
    }

    #[test]
    fn load_full_config() {
        let toml = r#"
[node]
path = "/tmp/limit_mode"

[persistence]
state_path = "/tmp/powerlimit-state"
restore_on_start = true

[bus]
kind = "session"
"#;
        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.node.path, "/tmp/limit_mode");
        assert_eq!(config.state_path(), PathBuf::from("/tmp/powerlimit-state"));
        assert!(config.persistence.restore_on_start);
        assert_eq!(config.bus.kind, BusKind::Session);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml = r#"
[persistence]
restore_on_start = true
"#;
        let config = Config::load_from_str(toml).unwrap();
        assert!(config.persistence.restore_on_start);
        assert_eq!(config.persistence.state_path, "/var/lib/powerlimit/state");
        assert_eq!(config.node.path, "/sys/kernel/cpu_power_toggle/limit_mode");
    }

    #[test]
    fn unknown_bus_kind_is_rejected() {
        let toml = r#"
[bus]
kind = "user"
"#;
        assert!(Config::load_from_str(toml).is_err());
    }

    // Sole test that sets POWERLIMIT_CONFIG and POWERLIMIT_NODE_PATH.
    #[test]
    fn load_and_node_path_follow_environment() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        unsafe {
            std::env::set_var("POWERLIMIT_CONFIG", &missing);
            std::env::set_var("POWERLIMIT_NODE_PATH", "/tmp/other_limit_mode");
        }

        let config = Config::load().unwrap();
        assert_eq!(config.node.path, DEFAULT_NODE_PATH);
        assert_eq!(config.bus.kind, BusKind::System);
        assert_eq!(config.node_path(), PathBuf::from("/tmp/other_limit_mode"));

        let present = dir.path().join("config.toml");
        std::fs::write(&present, "[node]\npath = \"/tmp/file_limit_mode\"\n").unwrap();
        unsafe {
            std::env::set_var("POWERLIMIT_CONFIG", &present);
            std::env::remove_var("POWERLIMIT_NODE_PATH");
        }

        let config = Config::load().unwrap();
        assert_eq!(config.node.path, "/tmp/file_limit_mode");
        assert_eq!(config.node_path(), PathBuf::from("/tmp/file_limit_mode"));

        unsafe {
            std::env::remove_var("POWERLIMIT_CONFIG");
        }
    }

    #[test]
    fn config_serializes_back_to_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::load_from_str(&text).unwrap();
        assert_eq!(parsed.node.path, config.node.path);
        assert_eq!(parsed.bus.kind, config.bus.kind);
    }
}
