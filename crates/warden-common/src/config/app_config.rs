//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).
//! Every section is resolved once at startup and passed into constructors.

use chrono::Duration as ChronoDuration;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub scheduler: SchedulerSettings,
    pub moderation: ModerationSettings,
    pub telemetry: TelemetrySettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Override for the migrations directory; the crate's own is used when unset
    #[serde(default)]
    pub migrations_dir: Option<String>,
}

/// Expiry sweep configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_reversal_timeout_ms")]
    pub reversal_timeout_ms: u64,
}

impl SchedulerSettings {
    /// Longest sweep interval that still feels immediate to moderators
    pub const MAX_SWEEP_INTERVAL_MS: u64 = 5_000;

    /// Sweep interval, clamped to `1..=MAX_SWEEP_INTERVAL_MS`
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.clamp(1, Self::MAX_SWEEP_INTERVAL_MS))
    }

    #[must_use]
    pub fn reversal_timeout(&self) -> Duration {
        Duration::from_millis(self.reversal_timeout_ms.max(1))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval_ms(),
            reversal_timeout_ms: default_reversal_timeout_ms(),
        }
    }
}

/// Ban reconciliation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    /// Trailing window in which a platform ban is matched to a recorded one; 0 = unbounded
    #[serde(default = "default_ban_dedup_window_secs")]
    pub ban_dedup_window_secs: u64,
    /// Delay before reconciling a platform ban, letting a racing bot ban commit first
    #[serde(default = "default_ban_settle_secs")]
    pub ban_settle_secs: u64,
}

impl ModerationSettings {
    /// `None` means any earlier ban matches
    #[must_use]
    pub fn ban_dedup_window(&self) -> Option<ChronoDuration> {
        if self.ban_dedup_window_secs == 0 {
            return None;
        }
        i64::try_from(self.ban_dedup_window_secs)
            .ok()
            .and_then(ChronoDuration::try_seconds)
    }

    #[must_use]
    pub fn ban_settle_delay(&self) -> Duration {
        Duration::from_secs(self.ban_settle_secs)
    }
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            ban_dedup_window_secs: default_ban_dedup_window_secs(),
            ban_settle_secs: default_ban_settle_secs(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetrySettings {
    /// Force JSON output; production always logs JSON
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_app_name() -> String {
    "warden".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_sweep_interval_ms() -> u64 {
    500
}

fn default_reversal_timeout_ms() -> u64 {
    5_000
}

fn default_ban_dedup_window_secs() -> u64 {
    3_600 // 1 hour
}

fn default_ban_settle_secs() -> u64 {
    5
}

/// Parse an optional variable, failing on values that are present but malformed
fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable is malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_name = match lookup("APP_ENV") {
            Some(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            None => default_env(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: env_name,
            },
            database: DatabaseSettings {
                url: lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
                migrations_dir: lookup("WARDEN_MIGRATIONS_DIR"),
            },
            scheduler: SchedulerSettings {
                sweep_interval_ms: parse_var(&lookup, "WARDEN_SWEEP_INTERVAL_MS")?
                    .unwrap_or_else(default_sweep_interval_ms),
                reversal_timeout_ms: parse_var(&lookup, "WARDEN_REVERSAL_TIMEOUT_MS")?
                    .unwrap_or_else(default_reversal_timeout_ms),
            },
            moderation: ModerationSettings {
                ban_dedup_window_secs: parse_var(&lookup, "WARDEN_BAN_DEDUP_WINDOW_SECS")?
                    .unwrap_or_else(default_ban_dedup_window_secs),
                ban_settle_secs: parse_var(&lookup, "WARDEN_BAN_SETTLE_SECS")?
                    .unwrap_or_else(default_ban_settle_secs),
            },
            telemetry: TelemetrySettings {
                json: parse_var(&lookup, "LOG_JSON")?.unwrap_or(false),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
