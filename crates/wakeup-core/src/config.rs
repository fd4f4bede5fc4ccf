use crate::error::{Result, WakeupError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Deployment profile. Picks the retry budget when `cycle` leaves it unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl Profile {
    pub fn default_max_rounds(self) -> u32 {
        match self {
            Profile::Development => 1,
            Profile::Production => 2,
        }
    }

    pub fn default_wait_seconds(self) -> u64 {
        match self {
            Profile::Development => 60,
            Profile::Production => 300,
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Development => write!(f, "development"),
            Profile::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = WakeupError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(WakeupError::InvalidConfig(format!("unknown profile '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// CycleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_granularity")]
    pub slot_granularity_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_seconds: Option<u64>,
}

fn default_granularity() -> u32 {
    60
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: default_granularity(),
            max_rounds: None,
            wait_seconds: None,
        }
    }
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Resolved, validated knobs handed to the cycle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    pub slot_granularity_minutes: u32,
    pub max_rounds: u32,
    pub wait: Duration,
}

impl CycleSettings {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            slot_granularity_minutes: default_granularity(),
            max_rounds: profile.default_max_rounds(),
            wait: Duration::from_secs(profile.default_wait_seconds()),
        }
    }
}

// ---------------------------------------------------------------------------
// CallbackConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Public base URL of the web app; callback paths are appended to it.
    #[serde(default = "default_web_root")]
    pub web_root: String,
}

fn default_web_root() -> String {
    "http://localhost:8000/".to_string()
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            web_root: default_web_root(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_number: String,
}

fn default_provider_url() -> String {
    "https://api.twilio.com".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationConfig {
    /// Record notifications in the log only.
    #[default]
    Log,
    /// POST rendered e-mails to a transactional mail API.
    Mail {
        endpoint: String,
        #[serde(default)]
        api_key: String,
        sender: String,
    },
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub callbacks: CallbackConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(profile: Profile) -> Self {
        Self {
            version: default_version(),
            profile,
            cycle: CycleConfig::default(),
            callbacks: CallbackConfig::default(),
            provider: ProviderConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(WakeupError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Write the config through a tempfile in the same directory so a crash
    /// never leaves a truncated file behind.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Resolve the cycle knobs, filling gaps from the profile.
    ///
    /// Fails on values the controller cannot run with; softer problems are
    /// reported by [`Config::validate`].
    pub fn cycle_settings(&self) -> Result<CycleSettings> {
        let granularity = self.cycle.slot_granularity_minutes;
        if granularity == 0 {
            return Err(WakeupError::InvalidConfig(
                "cycle.slot_granularity_minutes must be at least 1".into(),
            ));
        }
        if MINUTES_PER_DAY % granularity != 0 {
            return Err(WakeupError::InvalidConfig(format!(
                "cycle.slot_granularity_minutes={granularity} does not divide a day"
            )));
        }
        let max_rounds = self
            .cycle
            .max_rounds
            .unwrap_or_else(|| self.profile.default_max_rounds());
        if max_rounds == 0 {
            return Err(WakeupError::InvalidConfig(
                "cycle.max_rounds must be at least 1".into(),
            ));
        }
        let wait_seconds = self
            .cycle
            .wait_seconds
            .unwrap_or_else(|| self.profile.default_wait_seconds());
        Ok(CycleSettings {
            slot_granularity_minutes: granularity,
            max_rounds,
            wait: Duration::from_secs(wait_seconds),
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        let granularity = self.cycle.slot_granularity_minutes;
        if granularity == 0 {
            push(
                WarnLevel::Error,
                "cycle.slot_granularity_minutes is 0".to_string(),
            );
        } else if MINUTES_PER_DAY % granularity != 0 {
            push(
                WarnLevel::Error,
                format!(
                    "cycle.slot_granularity_minutes={granularity} does not divide a day; \
                     slots would drift from one day to the next"
                ),
            );
        }

        if self.cycle.max_rounds == Some(0) {
            push(WarnLevel::Error, "cycle.max_rounds is 0".to_string());
        } else if let Some(rounds) = self.cycle.max_rounds {
            if rounds > 10 {
                push(
                    WarnLevel::Warning,
                    format!("cycle.max_rounds={rounds} (>10 is unusual)"),
                );
            }
        }

        if self.cycle.wait_seconds == Some(0) {
            push(
                WarnLevel::Warning,
                "cycle.wait_seconds is 0: answers will only be seen by the next round".to_string(),
            );
        }

        if !self.callbacks.web_root.ends_with('/') {
            push(
                WarnLevel::Warning,
                format!(
                    "callbacks.web_root '{}' has no trailing '/'; callback paths are appended verbatim",
                    self.callbacks.web_root
                ),
            );
        }

        if self.provider.account_sid.is_empty() || self.provider.auth_token.is_empty() {
            push(
                WarnLevel::Warning,
                "provider credentials are empty; calls will be logged instead of placed".to_string(),
            );
        }
        if self.provider.from_number.is_empty() {
            push(
                WarnLevel::Warning,
                "provider.from_number is empty".to_string(),
            );
        }

        if let NotificationConfig::Mail { endpoint, .. } = &self.notifications {
            if endpoint.trim().is_empty() {
                push(
                    WarnLevel::Error,
                    "notifications.endpoint is empty".to_string(),
                );
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
