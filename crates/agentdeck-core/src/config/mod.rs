//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Agentdeck configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the orchestrator backend. May carry a sub-path prefix
    /// when the backend sits behind a reverse proxy or ingress.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of decisions kept in the rolling window
    pub decision_window: usize,
    /// Initial reconnect delay after a WebSocket drop
    pub reconnect_floor_secs: u64,
    /// Reconnect delay ceiling for exponential backoff
    pub reconnect_ceiling_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 10,
            },
            sync: SyncConfig {
                decision_window: 50,
                reconnect_floor_secs: 1,
                reconnect_ceiling_secs: 30,
            },
        }
    }
}

impl ServerConfig {
    /// Resolve the backend base URL, preferring the environment override
    pub fn resolved_base_url(&self) -> String {
        env::var("AGENTDECK_BASE_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("AGENTDECK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("agentdeck")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.base_url.trim().is_empty() {
            return Err(anyhow!("server.base_url must not be empty"));
        }
        if self.sync.decision_window == 0 {
            return Err(anyhow!("sync.decision_window must be at least 1"));
        }
        if self.sync.reconnect_floor_secs == 0 {
            return Err(anyhow!("sync.reconnect_floor_secs must be at least 1"));
        }
        if self.sync.reconnect_ceiling_secs < self.sync.reconnect_floor_secs {
            return Err(anyhow!(
                "sync.reconnect_ceiling_secs must be >= sync.reconnect_floor_secs"
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "server.base_url" => Ok(self.server.base_url.clone()),
            "server.timeout_secs" => Ok(self.server.timeout_secs.to_string()),
            "sync.decision_window" => Ok(self.sync.decision_window.to_string()),
            "sync.reconnect_floor_secs" => Ok(self.sync.reconnect_floor_secs.to_string()),
            "sync.reconnect_ceiling_secs" => Ok(self.sync.reconnect_ceiling_secs.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `agentdeck config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "server.base_url" => {
                self.server.base_url = value.trim_end_matches('/').to_string();
            }
            "server.timeout_secs" => {
                self.server.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }
            "sync.decision_window" => {
                let window: usize = value
                    .parse()
                    .with_context(|| format!("Invalid decision_window value: {}", value))?;
                if window == 0 {
                    return Err(anyhow!("Decision window must be at least 1"));
                }
                self.sync.decision_window = window;
            }
            "sync.reconnect_floor_secs" => {
                self.sync.reconnect_floor_secs = value
                    .parse()
                    .with_context(|| format!("Invalid reconnect_floor_secs value: {}", value))?;
            }
            "sync.reconnect_ceiling_secs" => {
                self.sync.reconnect_ceiling_secs = value
                    .parse()
                    .with_context(|| format!("Invalid reconnect_ceiling_secs value: {}", value))?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `agentdeck config list` to see available keys.",
                    key
                ));
            }
        }
        self.validate()
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "server.base_url",
            "server.timeout_secs",
            "sync.decision_window",
            "sync.reconnect_floor_secs",
            "sync.reconnect_ceiling_secs",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.server.timeout_secs, 10);
        assert_eq!(config.sync.decision_window, 50);
        assert_eq!(config.sync.reconnect_floor_secs, 1);
        assert_eq!(config.sync.reconnect_ceiling_secs, 30);
    }

    #[test]
    fn test_config_get_set_roundtrip() {
        let mut config = Config::default();
        config
            .set("server.base_url", "http://ha.local:8123/api/hassio_ingress/x/")
            .unwrap();
        assert_eq!(
            config.get("server.base_url").unwrap(),
            "http://ha.local:8123/api/hassio_ingress/x"
        );

        config.set("sync.decision_window", "20").unwrap();
        assert_eq!(config.get("sync.decision_window").unwrap(), "20");
    }

    #[test]
    fn test_config_rejects_zero_window() {
        let mut config = Config::default();
        assert!(config.set("sync.decision_window", "0").is_err());
    }

    #[test]
    fn test_config_rejects_inverted_backoff_bounds() {
        let mut config = Config::default();
        config.set("sync.reconnect_floor_secs", "60").unwrap_err();
    }

    #[test]
    fn test_config_unknown_key() {
        let config = Config::default();
        assert!(config.get("nonsense.key").is_err());
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        // Not parallel-safe with other env-dependent tests, so scope the var
        // to this test's own serialized block.
        unsafe {
            std::env::set_var("AGENTDECK_CONFIG_DIR", dir.path());
        }

        let mut config = Config::default();
        config.set("server.base_url", "http://box:9000").unwrap();
        config.save().unwrap();

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.server.base_url, "http://box:9000");

        unsafe {
            std::env::remove_var("AGENTDECK_CONFIG_DIR");
        }
    }
}
