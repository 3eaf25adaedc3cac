//! Core types for the airglow pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the raw PurpleAir table, normalized sensor readings, the light
//! decision, and the status snapshot written at the end of each run.

use serde::{Deserialize, Serialize};

/// Column-oriented sensor table as returned by the PurpleAir `/sensors` endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorTable {
    /// Column names, in row order
    #[serde(default)]
    pub fields: Vec<String>,
    /// One row per sensor
    #[serde(default)]
    pub data: Vec<Vec<serde_json::Value>>,
}

/// Which branch of the best-reading policy produced `pm25_best_raw`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPath {
    ChannelA,
    ChannelB,
    OutlierARejected,
    OutlierBRejected,
    ChannelsDiverge,
    ChannelsDisagree,
    NetworkAverage,
    Fallback,
}

/// Normalized per-sensor reading for a single poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// PurpleAir sensor index
    pub sensor_index: i64,
    /// Last time the sensor reported (epoch seconds)
    pub last_seen: Option<i64>,
    /// `last_seen` as RFC 3339 UTC
    pub last_seen_iso: Option<String>,
    /// Relative humidity (percent)
    pub humidity: Option<f64>,
    /// Network-provided average of both channels
    #[serde(rename = "pm2.5_atm")]
    pub pm25_atm: Option<f64>,
    /// Channel A
    #[serde(rename = "pm2.5_atm_a")]
    pub pm25_atm_a: Option<f64>,
    /// Channel B
    #[serde(rename = "pm2.5_atm_b")]
    pub pm25_atm_b: Option<f64>,
    /// Most trustworthy raw PM2.5 value
    pub pm25_best_raw: Option<f64>,
    /// Branch of the selection policy that produced `pm25_best_raw`
    pub pm25_selection: SelectionPath,
    /// Humidity-corrected PM2.5; only set for fresh readings with a best value
    pub pm25_corr: Option<f64>,
    /// Whether `last_seen` is within the configured max age
    pub is_fresh: bool,
}

impl SensorReading {
    /// Whether this reading can contribute to the light decision
    pub fn is_usable(&self) -> bool {
        self.is_fresh && self.pm25_corr.is_some()
    }
}

/// Static sensor metadata loaded from the optional CSV
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorMetadata {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geometry: Option<String>,
}

/// A reading with its metadata flattened alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSensor {
    #[serde(flatten)]
    pub reading: SensorReading,
    #[serde(flatten)]
    pub metadata: SensorMetadata,
}

/// How the light decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NoSensorsConfigured,
    NoneAvailable,
    AverageFreshSensors,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NoSensorsConfigured => "no_sensors_configured",
            Strategy::NoneAvailable => "none_available",
            Strategy::AverageFreshSensors => "average_fresh_sensors",
        }
    }
}

/// Outcome of the aggregation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDecision {
    pub lifx_device_id: String,
    pub strategy: Strategy,
    pub used_sensor_indices: Vec<i64>,
    pub used_pm25_corr: Option<f64>,
    pub color_hex: Option<String>,
    pub duration_sec: u32,
}

impl LightDecision {
    /// Color to push to the bulb, if any
    pub fn color(&self) -> Option<&str> {
        self.color_hex.as_deref()
    }
}

/// Producer metadata embedded in the status file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub version: String,
}

/// Status file contents, rebuilt from scratch every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub generated_at: String,
    pub generator: Generator,
    pub max_age_minutes: u32,
    pub sensors: Vec<EnrichedSensor>,
    pub light: LightDecision,
}
