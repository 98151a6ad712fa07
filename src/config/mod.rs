//! Configuration Management
//!
//! Loads sg-cli settings from a TOML file and the environment.
//! Configuration includes:
//! - Platform endpoints (API base URL, dashboard URL)
//! - API token used for the `Authorization: apikey ...` header
//! - Request timeout and retry policy
//! - Polling for `stack create --wait`
//! - Output settings

use crate::errors::SgError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.app.stackguardian.io";
pub const DEFAULT_DASHBOARD_URL: &str = "https://app.stackguardian.io/orchestrator";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
    pub api_token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub wait: WaitSettings,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Retry policy for API requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Stack status polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitSettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_wait_timeout")]
    pub timeout_secs: u64,
}

/// Terminal output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Colorize success and error lines
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            dashboard_url: default_dashboard_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout(),
            retry: RetrySettings::default(),
            wait: WaitSettings::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_wait_timeout(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_dashboard_url() -> String {
    DEFAULT_DASHBOARD_URL.to_string()
}
fn default_request_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8000
}
fn default_poll_interval() -> u64 {
    5
}
fn default_wait_timeout() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config from {}", p))?;
                toml::from_str(&content).context("Failed to parse config")?
            }
            None => {
                let mut default_paths = vec![std::path::PathBuf::from("sg-cli.toml")];
                if let Some(home) = dirs::home_dir() {
                    default_paths.push(home.join(".config/sg-cli/config.toml"));
                }

                let mut loaded = None;
                for p in &default_paths {
                    if let Ok(content) = std::fs::read_to_string(p) {
                        debug!("Loading config from {}", p.display());
                        loaded = Some(toml::from_str(&content).context("Failed to parse config")?);
                        break;
                    }
                }
                loaded.unwrap_or_else(|| {
                    debug!("No config file found, using defaults");
                    Self::default()
                })
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from `SG_*` variables as returned by `lookup`.
    ///
    /// Empty values are ignored, so an exported but blank `SG_BASE_URL`
    /// keeps the default endpoint.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = var("SG_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(dashboard_url) = var("SG_DASHBOARD_URL") {
            self.dashboard_url = dashboard_url;
        }
        if let Some(token) = var("SG_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(timeout) = var("SG_TIMEOUT") {
            if let Ok(t) = timeout.parse::<u64>() {
                self.request_timeout_secs = t;
            }
        }
    }

    /// The API token, or a configuration error telling the user where to set it.
    pub fn require_token(&self) -> std::result::Result<&str, SgError> {
        self.api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SgError::Config(
                    "no API token provided; set SG_API_TOKEN or api_token in the config file"
                        .to_string(),
                )
            })
    }

    /// Dashboard URL without a trailing slash.
    pub fn dashboard_base(&self) -> &str {
        self.dashboard_url.trim_end_matches('/')
    }
}
