//! Watcher configuration.
//!
//! All knobs are supplied at startup: environment variables take precedence
//! over an optional TOML profile file, which falls back to built-in defaults
//! field by field. There is no runtime reconfiguration.

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Environment variable names.
mod env {
    pub const CONFIG_FILE: &str = "LIQWATCH_CONFIG";
    pub const NODE_WS_URL: &str = "LIQWATCH_NODE_WS_URL";
    pub const CHAIN_ID: &str = "LIQWATCH_CHAIN_ID";
    pub const SLACK_TOKEN: &str = "LIQWATCH_SLACK_TOKEN";
    pub const SLACK_CHANNEL: &str = "LIQWATCH_SLACK_CHANNEL";
    pub const REPAY_THRESHOLD: &str = "LIQWATCH_REPAY_THRESHOLD";
    pub const JOURNAL_PATH: &str = "LIQWATCH_JOURNAL_PATH";
    pub const EXPLORER_BASE: &str = "LIQWATCH_EXPLORER_BASE";
    pub const RECONNECT_DELAY_SECS: &str = "LIQWATCH_RECONNECT_DELAY_SECS";
}

/// Full configuration surface of the watcher.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Node stream endpoint.
    #[serde(default = "default_node_ws_url")]
    pub node_ws_url: String,

    /// Chain identifier sent with the subscription request.
    #[serde(default = "default_chain_id")]
    pub chain_id: String,

    /// Slack bearer token. Secret; never logged.
    #[serde(default)]
    pub slack_token: String,

    /// Target notification channel.
    #[serde(default = "default_slack_channel")]
    pub slack_channel: String,

    /// Significance threshold in standard units (exclusive).
    #[serde(default = "default_repay_threshold")]
    pub repay_threshold: f64,

    /// Append-only journal destination.
    #[serde(default = "default_journal_path")]
    pub journal_path: String,

    /// Explorer base for derived transaction links.
    #[serde(default = "default_explorer_base")]
    pub explorer_base: String,

    /// Fixed delay between a close and the next connect attempt.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_node_ws_url() -> String {
    "wss://observer.terra.dev".to_string()
}
fn default_chain_id() -> String {
    "columbus-5".to_string()
}
fn default_slack_channel() -> String {
    "#liquidation-log".to_string()
}
fn default_repay_threshold() -> f64 {
    100.0
}
fn default_journal_path() -> String {
    "liquidation.log".to_string()
}
fn default_explorer_base() -> String {
    "https://finder.extraterrestrial.money/mainnet".to_string()
}
fn default_reconnect_delay_secs() -> u64 {
    1
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            node_ws_url: default_node_ws_url(),
            chain_id: default_chain_id(),
            slack_token: String::new(),
            slack_channel: default_slack_channel(),
            repay_threshold: default_repay_threshold(),
            journal_path: default_journal_path(),
            explorer_base: default_explorer_base(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

impl WatcherConfig {
    /// Resolve the startup configuration: optional profile file, then
    /// environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(env::CONFIG_FILE) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML profile. Missing keys fall back to defaults field by
    /// field.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        let get = |name: &str| std::env::var(name).ok();

        if let Some(v) = get(env::NODE_WS_URL) {
            self.node_ws_url = v;
        }
        if let Some(v) = get(env::CHAIN_ID) {
            self.chain_id = v;
        }
        if let Some(v) = get(env::SLACK_TOKEN) {
            self.slack_token = v;
        }
        if let Some(v) = get(env::SLACK_CHANNEL) {
            self.slack_channel = v;
        }
        if let Some(v) = get(env::JOURNAL_PATH) {
            self.journal_path = v;
        }
        if let Some(v) = get(env::EXPLORER_BASE) {
            self.explorer_base = v;
        }
        if let Some(v) = get(env::REPAY_THRESHOLD) {
            self.repay_threshold = v
                .parse()
                .with_context(|| format!("invalid {}: {v:?}", env::REPAY_THRESHOLD))?;
        }
        if let Some(v) = get(env::RECONNECT_DELAY_SECS) {
            self.reconnect_delay_secs = v
                .parse()
                .with_context(|| format!("invalid {}: {v:?}", env::RECONNECT_DELAY_SECS))?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.slack_token.is_empty(),
            "missing Slack token: set {}",
            env::SLACK_TOKEN
        );
        ensure!(!self.node_ws_url.is_empty(), "node stream URL is empty");
        ensure!(!self.chain_id.is_empty(), "chain id is empty");
        ensure!(
            self.repay_threshold.is_finite(),
            "repay threshold must be finite"
        );
        Ok(())
    }

    /// Log the non-secret configuration surface at startup.
    pub fn log_config(&self) {
        info!(
            node_ws_url = %self.node_ws_url,
            chain_id = %self.chain_id,
            slack_channel = %self.slack_channel,
            slack_token_set = !self.slack_token.is_empty(),
            repay_threshold = self.repay_threshold,
            journal_path = %self.journal_path,
            explorer_base = %self.explorer_base,
            reconnect_delay_secs = self.reconnect_delay_secs,
            "Watcher configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    // Process environment is global; tests that touch it take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_reference_deployment() {
        let config = WatcherConfig::default();
        assert_eq!(config.node_ws_url, "wss://observer.terra.dev");
        assert_eq!(config.chain_id, "columbus-5");
        assert_eq!(config.slack_channel, "#liquidation-log");
        assert_eq!(config.repay_threshold, 100.0);
        assert_eq!(config.journal_path, "liquidation.log");
        assert_eq!(
            config.explorer_base,
            "https://finder.extraterrestrial.money/mainnet"
        );
        assert_eq!(config.reconnect_delay_secs, 1);
    }

    #[test]
    fn toml_profile_overrides_selectively() {
        let config: WatcherConfig = toml::from_str(
            r#"
            chain_id = "bombay-12"
            repay_threshold = 250.0
            "#,
        )
        .unwrap();

        assert_eq!(config.chain_id, "bombay-12");
        assert_eq!(config.repay_threshold, 250.0);
        // Untouched fields keep their defaults.
        assert_eq!(config.node_ws_url, "wss://observer.terra.dev");
        assert_eq!(config.reconnect_delay_secs, 1);
    }

    #[test]
    fn validation_requires_a_token() {
        let mut config = WatcherConfig::default();
        assert!(config.validate().is_err());

        config.slack_token = "xoxb-test".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_win() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(env::REPAY_THRESHOLD, "500");
        std::env::set_var(env::CHAIN_ID, "phoenix-1");

        let mut config = WatcherConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.repay_threshold, 500.0);
        assert_eq!(config.chain_id, "phoenix-1");

        std::env::remove_var(env::REPAY_THRESHOLD);
        std::env::remove_var(env::CHAIN_ID);
    }

    #[test]
    fn bad_numeric_override_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(env::RECONNECT_DELAY_SECS, "soon");

        let mut config = WatcherConfig::default();
        assert!(config.apply_env_overrides().is_err());

        std::env::remove_var(env::RECONNECT_DELAY_SECS);
    }
}
