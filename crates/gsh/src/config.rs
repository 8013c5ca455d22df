//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use gsh_core::OutputMode;
use gsh_exec::target::DEFAULT_PORT;
use serde::{Deserialize, Serialize};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "GSH_CONFIG";

/// Defaults read from `~/.gsh/config.toml`
///
/// Every field is optional in the file; command-line flags win over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default remote user
    pub user: Option<String>,
    /// Batch timeout in seconds
    pub timeout: u64,
    /// Buffer and prefix output instead of streaming it
    pub buffer: bool,
    /// SSH port
    pub port: u16,
    /// Per-host connect timeout in seconds, off when unset
    pub connect_timeout: Option<u64>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            timeout: gsh_core::DEFAULT_TIMEOUT.as_secs(),
            buffer: false,
            port: DEFAULT_PORT,
            connect_timeout: None,
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `explicit`, else `$GSH_CONFIG`, else `~/.gsh/config.toml`, else defaults
    ///
    /// # Errors
    /// Returns error if a named file is missing or any file fails to parse
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(&PathBuf::from(path));
        }

        if let Some(path) = dirs::home_dir().map(|p| p.join(".gsh/config.toml")) {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Config::default())
    }

    /// Output mode selected by the file
    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        if self.buffer {
            OutputMode::Buffered
        } else {
            OutputMode::Streaming
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.timeout, 90);
        assert_eq!(config.port, 22);
        assert_eq!(config.output_mode(), OutputMode::Streaming);
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            user = "deploy"
            buffer = true
            connect_timeout = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.user.as_deref(), Some("deploy"));
        assert_eq!(config.output_mode(), OutputMode::Buffered);
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<Config, _> = toml::from_str("timeut = 5");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let path = std::env::temp_dir().join("gsh_no_such_config.toml");
        assert!(Config::load_default(Some(&path)).is_err());
    }
}
