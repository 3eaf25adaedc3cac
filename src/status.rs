//! Status snapshot encoding
//!
//! Builds the per-run status document and writes it to a fixed path,
//! overwriting whatever the previous run left there.

use crate::error::AirglowError;
use crate::types::{EnrichedSensor, Generator, LightDecision, StatusSnapshot};
use crate::{AIRGLOW_VERSION, PRODUCER_NAME};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use std::fs;
use std::path::Path;

impl StatusSnapshot {
    /// Assemble a snapshot for a run that started at `generated_at`
    pub fn build(
        generated_at: DateTime<Utc>,
        max_age_minutes: u32,
        sensors: Vec<EnrichedSensor>,
        light: LightDecision,
    ) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            generator: Generator {
                name: PRODUCER_NAME.to_string(),
                version: AIRGLOW_VERSION.to_string(),
            },
            max_age_minutes,
            sensors,
            light,
        }
    }

    pub fn to_json(&self) -> Result<String, AirglowError> {
        serde_json::to_string_pretty(self).map_err(AirglowError::Json)
    }
}

/// Write the snapshot as pretty JSON, creating parent directories as needed
pub fn write_status(snapshot: &StatusSnapshot, path: &Path) -> Result<(), AirglowError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut json = snapshot.to_json()?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Write the snapshot, logging instead of failing. Returns whether the write succeeded.
pub fn persist_status(snapshot: &StatusSnapshot, path: &Path) -> bool {
    match write_status(snapshot, path) {
        Ok(()) => {
            info!("Wrote status to {}", path.display());
            true
        }
        Err(e) => {
            warn!("Could not write status to {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SelectionPath, SensorMetadata, SensorReading, Strategy};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("airglow-status-{}-{name}", std::process::id()))
            .join("nested")
            .join("status.json")
    }

    fn snapshot() -> StatusSnapshot {
        let reading = SensorReading {
            sensor_index: 123421,
            last_seen: Some(1_700_000_000),
            last_seen_iso: Some("2023-11-14T22:13:20Z".to_string()),
            humidity: Some(50.0),
            pm25_atm: Some(12.4),
            pm25_atm_a: Some(12.0),
            pm25_atm_b: Some(12.8),
            pm25_best_raw: Some(12.4),
            pm25_selection: SelectionPath::NetworkAverage,
            pm25_corr: Some(10.0),
            is_fresh: true,
        };
        StatusSnapshot::build(
            Utc.timestamp_opt(1_700_000_060, 0).unwrap(),
            60,
            vec![EnrichedSensor {
                reading,
                metadata: SensorMetadata {
                    name: Some("Spruce Grove".to_string()),
                    ..Default::default()
                },
            }],
            LightDecision {
                lifx_device_id: "d073d568e6e8".to_string(),
                strategy: Strategy::AverageFreshSensors,
                used_sensor_indices: vec![123421],
                used_pm25_corr: Some(10.0),
                color_hex: Some("#01cbff".to_string()),
                duration_sec: 60,
            },
        )
    }

    #[test]
    fn test_json_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&snapshot().to_json().unwrap()).unwrap();

        assert_eq!(value["generated_at"], "2023-11-14T22:14:20Z");
        assert_eq!(value["generator"]["name"], "airglow");
        assert_eq!(value["max_age_minutes"], 60);
        assert_eq!(value["light"]["lifx_device_id"], "d073d568e6e8");
        assert_eq!(value["light"]["strategy"], "average_fresh_sensors");
        assert_eq!(value["light"]["used_pm25_corr"], 10.0);
        assert_eq!(value["light"]["used_sensor_indices"][0], 123421);
        assert_eq!(value["light"]["color_hex"], "#01cbff");
        assert_eq!(value["light"]["duration_sec"], 60);

        let sensor = &value["sensors"][0];
        assert_eq!(sensor["sensor_index"], 123421);
        assert_eq!(sensor["name"], "Spruce Grove");
        assert_eq!(sensor["pm2.5_atm_a"], 12.0);
        assert_eq!(sensor["pm25_selection"], "network_average");
        assert!(sensor["latitude"].is_null());
    }

    #[test]
    fn test_write_creates_parent_and_round_trips() {
        let path = temp_path("write");
        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());

        let snap = snapshot();
        write_status(&snap, &path).unwrap();
        let read: StatusSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, snap);

        fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).unwrap();
    }

    #[test]
    fn test_persist_failure_is_not_fatal() {
        // A path whose parent is a regular file cannot be created
        let blocker = std::env::temp_dir().join(format!("airglow-blocker-{}", std::process::id()));
        fs::write(&blocker, "x").unwrap();
        let path = blocker.join("status.json");

        assert!(!persist_status(&snapshot(), &path));

        fs::remove_file(&blocker).unwrap();
    }
}
