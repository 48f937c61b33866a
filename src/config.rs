use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHANNEL: &str = "#ansible";
pub const DEFAULT_TERSE_CHANNEL: &str = "#fluffy-clouds";
pub const DEFAULT_USERNAME: &str = "ansible";
pub const DEFAULT_ICON_URL: &str = "http://cdn2.hubspot.net/hub/330046/file-449187601-png/ansible_badge.png";

pub const ENV_WEBHOOK_URL: &str = "ACTIONABLE_SLACK_WEBHOOK_URL";
pub const ENV_CHANNEL: &str = "ACTIONABLE_SLACK_CHANNEL";
pub const ENV_TERSE_CHANNEL: &str = "ACTIONABLE_SLACK_TERSE_CHANNEL";
pub const ENV_USERNAME: &str = "ACTIONABLE_SLACK_USERNAME";

/// Hide everything after the host so tokens in the path stay out of logs and terminals
pub fn redact_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let host = rest.split('/').next().unwrap_or(rest);
    if scheme.is_empty() {
        format!("{}/…", host)
    } else {
        format!("{}://{}/…", scheme, host)
    }
}

/// Log verbosity, used when RUST_LOG is not set
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Incoming webhook URL; the router stays disabled without it
    pub webhook_url: Option<String>,
    /// Verbose per-event channel
    pub channel: String,
    /// Low-noise channel, paged at most once per run
    pub terse_channel: String,
    /// Display name to post as
    pub username: String,
    /// Branding icon shown next to each message
    pub icon_url: String,
    pub log_level: LogLevel,
    /// Append logs here instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            channel: DEFAULT_CHANNEL.to_string(),
            terse_channel: DEFAULT_TERSE_CHANNEL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            icon_url: DEFAULT_ICON_URL.to_string(),
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply env overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        if let Ok(env_path) = std::env::var("ACTIONABLE_NOTIFY_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from ACTIONABLE_NOTIFY_CONFIG: {}", e);
                    }
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("actionable-notify").join("config.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("actionable-notify.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Environment wins over the config file. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_WEBHOOK_URL) {
            self.webhook_url = Some(url);
        }
        if let Some(channel) = lookup(ENV_CHANNEL) {
            self.channel = channel;
        }
        if let Some(channel) = lookup(ENV_TERSE_CHANNEL) {
            self.terse_channel = channel;
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.username = username;
        }
    }

    /// Webhook URL, treating a blank value as unset
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.webhook_url.is_none());
        assert_eq!(config.channel, "#ansible");
        assert_eq!(config.terse_channel, "#fluffy-clouds");
        assert_eq!(config.username, "ansible");
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            webhook_url: Some("https://hooks.example.com/from-file".to_string()),
            channel: "#from-file".to_string(),
            ..Config::default()
        };

        config.apply_env_overrides(env_from(&[
            (ENV_WEBHOOK_URL, "https://hooks.example.com/from-env"),
            (ENV_TERSE_CHANNEL, "#pager"),
        ]));

        assert_eq!(config.webhook_url(), Some("https://hooks.example.com/from-env"));
        assert_eq!(config.channel, "#from-file");
        assert_eq!(config.terse_channel, "#pager");
        assert_eq!(config.username, "ansible");
    }

    #[test]
    fn test_blank_env_value_is_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(env_from(&[(ENV_WEBHOOK_URL, "  "), (ENV_USERNAME, "")]));
        assert!(config.webhook_url().is_none());
        assert_eq!(config.username, "ansible");
    }

    #[test]
    fn test_blank_webhook_url_counts_as_unset() {
        let config = Config {
            webhook_url: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.webhook_url().is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "webhook_url: https://hooks.example.com/T000\nchannel: \"#deploys\"\nlog_level: debug\n";
        let config: Config = serde_yaml::from_str(yaml).expect("Failed to parse");
        assert_eq!(config.webhook_url(), Some("https://hooks.example.com/T000"));
        assert_eq!(config.channel, "#deploys");
        assert_eq!(config.terse_channel, DEFAULT_TERSE_CHANNEL);
        assert_eq!(config.icon_url, DEFAULT_ICON_URL);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yaml");
        fs::write(&path, "username: deploybot\n").expect("write config");

        let config = Config::load_from_file(&path).expect("load");
        assert_eq!(config.username, "deploybot");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load_file_chain(Some(&PathBuf::from("/nonexistent/actionable-notify.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_redact_url_keeps_host_only() {
        assert_eq!(
            redact_url("https://hooks.slack.com/services/T000/B000/secret"),
            "https://hooks.slack.com/…"
        );
        assert_eq!(redact_url("hooks.example.com/abc"), "hooks.example.com/…");
    }

    #[test]
    fn test_expand_path_no_expansion() {
        let path = PathBuf::from("/var/log/notify.log");
        assert_eq!(Config::expand_path(&path), PathBuf::from("/var/log/notify.log"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(&PathBuf::from("~/notify.log"));
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("notify.log"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let yaml_str = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = serde_yaml::from_str(&yaml_str).expect("Failed to deserialize");
        assert_eq!(parsed.channel, config.channel);
        assert_eq!(parsed.log_level, config.log_level);
    }
}
