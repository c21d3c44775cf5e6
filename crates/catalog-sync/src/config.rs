//! # Partner Configuration
//!
//! Configuration for the partner integration: where the partner lives,
//! which credential to refresh with, and how the refresh loop and the
//! reconciler behave.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BASE_URL=https://partner.example.com/api                           │
//! │     REFRESH_TOKEN=...                                                  │
//! │     CATALOG_UPSTREAM_POLICY=fail                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/catalog-service/partner.toml (Linux)                     │
//! │     ~/Library/Application Support/com.catalog.catalog-service/...      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5 min checks, 5 min freshness, 1 s initial backoff                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # partner.toml
//! [partner]
//! base_url = "https://partner.example.com/api"
//! refresh_token = "long-lived-credential"
//! request_timeout_secs = 30
//!
//! [token]
//! file = "/var/lib/catalog/token.json"
//! refresh_check_secs = 300
//! freshness_secs = 300
//! initial_backoff_ms = 1000
//! max_backoff_secs = 60
//!
//! [sync]
//! upstream_policy = "degrade"  # degrade | fail
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Upstream Failure Policy
// =============================================================================

/// What the reconciler does when the partner fails in an unexpected way.
///
/// ## Policies
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  DEGRADE (default)                                                      │
/// │  └── Log the failure, answer from the offers already stored locally    │
/// │                                                                         │
/// │  FAIL                                                                   │
/// │  └── Surface the outage to the caller (HTTP 502)                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// A 404 from the partner is never a failure: it means "no offers".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamFailurePolicy {
    /// Log and continue with local data.
    #[default]
    Degrade,

    /// Return an error to the caller.
    Fail,
}

impl std::fmt::Display for UpstreamFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamFailurePolicy::Degrade => write!(f, "degrade"),
            UpstreamFailurePolicy::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for UpstreamFailurePolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(UpstreamFailurePolicy::Degrade),
            "fail" => Ok(UpstreamFailurePolicy::Fail),
            _ => Err(SyncError::InvalidConfig(format!(
                "Unknown upstream policy '{}'. Valid values: degrade, fail",
                s
            ))),
        }
    }
}

// =============================================================================
// Configuration Sections
// =============================================================================

/// Where the partner lives and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerSettings {
    /// Base URL every partner endpoint is joined onto.
    #[serde(default)]
    pub base_url: String,

    /// Long-lived credential exchanged for access tokens.
    #[serde(default)]
    pub refresh_token: String,

    /// Upper bound on every outbound request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for PartnerSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            refresh_token: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Access-token lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Optional token record file, loaded at startup and rewritten on refresh.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Sleep between refresh checks.
    #[serde(default = "default_refresh_check")]
    pub refresh_check_secs: u64,

    /// A token younger than this is not refreshed.
    #[serde(default = "default_freshness")]
    pub freshness_secs: u64,

    /// First delay after a 400 from `/auth`.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Cap on the delay between 400 retries.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_refresh_check() -> u64 {
    300
}
fn default_freshness() -> u64 {
    300
}
fn default_initial_backoff() -> u64 {
    1000
}
fn default_max_backoff() -> u64 {
    60
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            file: None,
            refresh_check_secs: default_refresh_check(),
            freshness_secs: default_freshness(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub upstream_policy: UpstreamFailurePolicy,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete partner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartnerConfig {
    #[serde(default)]
    pub partner: PartnerSettings,

    #[serde(default)]
    pub token: TokenSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl PartnerConfig {
    /// Loads configuration from the file (if any), then the environment,
    /// then validates it.
    ///
    /// ## Arguments
    /// * `config_path` - Explicit file; the platform config dir is used when `None`
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading partner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = &self.partner.base_url;
        if url.is_empty() {
            return Err(SyncError::InvalidConfig(
                "BASE_URL must be set".into(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::InvalidUrl(format!(
                "Partner URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.partner.refresh_token.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "REFRESH_TOKEN must be set".into(),
            ));
        }

        if self.partner.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.token.refresh_check_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "refresh_check_secs must be greater than 0".into(),
            ));
        }

        if freshness_window(self.token.freshness_secs).is_none() {
            return Err(SyncError::InvalidConfig(format!(
                "freshness_secs is out of range: {}",
                self.token.freshness_secs
            )));
        }

        if self.token.initial_backoff_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "initial_backoff_ms must be greater than 0".into(),
            ));
        }

        if self.max_backoff() < self.initial_backoff() {
            return Err(SyncError::InvalidConfig(
                "max_backoff_secs must not be below initial_backoff_ms".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from the process environment.
    fn apply_env_overrides(&mut self) -> SyncResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup.
    ///
    /// Numeric values that fail to parse are configuration errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL") {
            debug!(url = %url, "Overriding partner URL from environment");
            self.partner.base_url = url;
        }

        if let Some(token) = lookup("REFRESH_TOKEN") {
            self.partner.refresh_token = token;
        }

        if let Some(file) = lookup("CATALOG_TOKEN_FILE") {
            debug!(file = %file, "Overriding token file from environment");
            self.token.file = Some(PathBuf::from(file));
        }

        if let Some(v) = lookup("CATALOG_REFRESH_CHECK_SECS") {
            self.token.refresh_check_secs = parse_number("CATALOG_REFRESH_CHECK_SECS", &v)?;
        }

        if let Some(v) = lookup("CATALOG_TOKEN_FRESHNESS_SECS") {
            self.token.freshness_secs = parse_number("CATALOG_TOKEN_FRESHNESS_SECS", &v)?;
        }

        if let Some(v) = lookup("CATALOG_INITIAL_BACKOFF_MS") {
            self.token.initial_backoff_ms = parse_number("CATALOG_INITIAL_BACKOFF_MS", &v)?;
        }

        if let Some(v) = lookup("CATALOG_MAX_BACKOFF_SECS") {
            self.token.max_backoff_secs = parse_number("CATALOG_MAX_BACKOFF_SECS", &v)?;
        }

        if let Some(v) = lookup("CATALOG_REQUEST_TIMEOUT_SECS") {
            self.partner.request_timeout_secs = parse_number("CATALOG_REQUEST_TIMEOUT_SECS", &v)?;
        }

        if let Some(policy) = lookup("CATALOG_UPSTREAM_POLICY") {
            self.sync.upstream_policy = policy.parse()?;
            debug!(policy = %self.sync.upstream_policy, "Overriding upstream policy from environment");
        }

        Ok(())
    }

    /// Gets the default config file path for the current platform.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "catalog", "catalog-service")
            .map(|dirs| dirs.config_dir().join("partner.toml"))
    }

    // =========================================================================
    // Typed Accessors
    // =========================================================================

    /// Sleep between refresh checks.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.token.refresh_check_secs)
    }

    /// Maximum token age that still counts as fresh.
    pub fn freshness(&self) -> chrono::Duration {
        freshness_window(self.token.freshness_secs).unwrap_or(chrono::Duration::MAX)
    }

    /// First 400-retry delay.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.token.initial_backoff_ms)
    }

    /// Cap on the 400-retry delay.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.token.max_backoff_secs)
    }

    /// Timeout applied to every partner request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.partner.request_timeout_secs)
    }
}

/// `None` when the value does not fit a `chrono::Duration`.
fn freshness_window(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

fn parse_number(key: &str, value: &str) -> SyncResult<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        SyncError::InvalidConfig(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
