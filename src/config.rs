//! Runtime configuration
//!
//! Non-secret settings live in `airglow.toml`; every field has a default so a
//! partial (or missing) file works. API keys only ever come from the
//! environment via [`Credentials::from_env`].

use crate::error::AirglowError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PURPLEAIR_KEY_VAR: &str = "PURPLEAIR_API_KEY";
pub const LIFX_KEY_VAR: &str = "LIFX_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirglowConfig {
    pub purpleair: PurpleAirConfig,
    pub lifx: LifxConfig,
    pub metadata: MetadataConfig,
    pub status: StatusConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurpleAirConfig {
    pub sensors: Vec<i64>,
    pub api_base: String,
    pub max_age_minutes: u32,
}

impl Default for PurpleAirConfig {
    fn default() -> Self {
        Self {
            sensors: vec![123421],
            api_base: "https://api.purpleair.com/v1".to_string(),
            max_age_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifxConfig {
    pub device_id: String,
    pub duration_sec: u32,
    pub api_base: String,
}

impl Default for LifxConfig {
    fn default() -> Self {
        Self {
            device_id: "d073d568e6e8".to_string(),
            duration_sec: 60,
            api_base: "https://api.lifx.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// CSV with sensor names and positions; enrichment is skipped when unset
    pub csv_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub path: PathBuf,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("status").join("status.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 20 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AirglowConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, AirglowError> {
        let config: AirglowConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AirglowError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AirglowError::Config(format!("failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// First config file present in the usual locations
    pub fn locate() -> Option<PathBuf> {
        [
            PathBuf::from("airglow.toml"),
            PathBuf::from("config").join("airglow.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> Result<(), AirglowError> {
        if self.lifx.device_id.trim().is_empty() {
            return Err(AirglowError::Config("lifx.device_id is empty".to_string()));
        }
        if self.http.timeout_secs == 0 {
            return Err(AirglowError::Config(
                "http.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// API keys for the two upstream services
#[derive(Clone)]
pub struct Credentials {
    pub purpleair_api_key: String,
    pub lifx_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("purpleair_api_key", &"<redacted>")
            .field("lifx_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read both keys from the process environment
    pub fn from_env() -> Result<Self, AirglowError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both keys through `lookup`; empty values count as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AirglowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(AirglowError::MissingCredential(name))
        };
        Ok(Self {
            purpleair_api_key: get(PURPLEAIR_KEY_VAR)?,
            lifx_api_key: get(LIFX_KEY_VAR)?,
        })
    }
}
