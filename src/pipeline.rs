//! Pipeline orchestration
//!
//! This module provides the public entry points for a run: from the sensor API
//! response to a bulb color and a status file.
//!
//! Run stages:
//! 1. Metadata fetch (optional, failures recovered)
//! 2. Sensor fetch (failures abort the run)
//! 3. Normalizer - select, correct and check freshness per sensor
//! 4. Aggregation - average usable sensors and pick a color
//! 5. Bulb update (failures abort before the status write)
//! 6. Status write (failures logged)

use crate::aggregation::decide_light;
use crate::clients::{
    BulbController, CsvMetadataClient, LifxClient, MetadataSource, PurpleAirClient, SensorSource,
};
use crate::config::{AirglowConfig, Credentials};
use crate::error::AirglowError;
use crate::metadata::{enrich, parse_metadata_csv};
use crate::normalizer::Normalizer;
use crate::status::persist_status;
use crate::types::{SensorMetadata, StatusSnapshot};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;

/// Per-invocation switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute the decision without touching the bulb or the status file
    pub dry_run: bool,
}

/// What a completed run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub snapshot: StatusSnapshot,
    pub bulb_updated: bool,
    pub status_written: bool,
}

/// External collaborators for one run
pub struct Sources<'a> {
    pub sensors: &'a dyn SensorSource,
    pub metadata: Option<&'a dyn MetadataSource>,
}

/// Execute one full run.
///
/// A sensor fetch error or a bulb error is returned as `Err`; in either case the
/// status file is not written. Metadata and status-write problems are only logged.
pub fn run_once(
    config: &AirglowConfig,
    sources: &Sources<'_>,
    bulb: &dyn BulbController,
    now: DateTime<Utc>,
    options: RunOptions,
) -> Result<RunReport, AirglowError> {
    let sensor_ids = &config.purpleair.sensors;
    let max_age = config.purpleair.max_age_minutes;

    let (metadata, readings) = if sensor_ids.is_empty() {
        warn!("No PurpleAir sensors configured; skipping fetch");
        (HashMap::new(), Vec::new())
    } else {
        let metadata = sources.metadata.map(load_metadata).unwrap_or_default();
        let table = sources.sensors.fetch_sensors(sensor_ids)?;
        (metadata, Normalizer::normalize_table(&table, now, max_age))
    };

    let light = decide_light(
        sensor_ids.len(),
        &readings,
        &config.lifx.device_id,
        config.lifx.duration_sec,
    );
    info!(
        "Decision: strategy={} sensors={:?} pm25_corr={:?} color={:?}",
        light.strategy.as_str(),
        light.used_sensor_indices,
        light.used_pm25_corr,
        light.color_hex
    );

    let snapshot = StatusSnapshot::build(now, max_age, enrich(readings, &metadata), light);

    if options.dry_run {
        info!("Dry run: leaving bulb and status file untouched");
        return Ok(RunReport {
            snapshot,
            bulb_updated: false,
            status_written: false,
        });
    }

    let bulb_updated = match snapshot.light.color() {
        Some(color) => {
            bulb.set_color(color, snapshot.light.duration_sec)?;
            true
        }
        None => {
            info!("No usable PM2.5 data; not changing light");
            false
        }
    };

    let status_written = persist_status(&snapshot, &config.status.path);

    Ok(RunReport {
        snapshot,
        bulb_updated,
        status_written,
    })
}

/// Push a literal color to the bulb, bypassing all sensor logic. No status file is written.
pub fn apply_manual_color(
    bulb: &dyn BulbController,
    color: &str,
    duration_sec: u32,
) -> Result<(), AirglowError> {
    info!("Manual override: setting color {color}");
    bulb.set_color(color, duration_sec)
}

fn load_metadata(source: &dyn MetadataSource) -> HashMap<i64, SensorMetadata> {
    match source.fetch_metadata().and_then(|text| parse_metadata_csv(&text)) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Skipping sensor metadata: {e}");
            HashMap::new()
        }
    }
}

/// Config plus live HTTP collaborators, ready to run.
pub struct AirglowProcessor {
    config: AirglowConfig,
    sensors: Box<dyn SensorSource>,
    metadata: Option<Box<dyn MetadataSource>>,
    bulb: Box<dyn BulbController>,
}

impl AirglowProcessor {
    /// Build HTTP clients for PurpleAir, LIFX and (if configured) the metadata CSV
    pub fn new(config: AirglowConfig, credentials: &Credentials) -> Result<Self, AirglowError> {
        config.validate()?;
        let timeout = config.http.timeout();

        let sensors = PurpleAirClient::new(
            &config.purpleair.api_base,
            &credentials.purpleair_api_key,
            timeout,
        )?;
        let bulb = LifxClient::new(
            &config.lifx.api_base,
            &credentials.lifx_api_key,
            &config.lifx.device_id,
            timeout,
        )?;
        let metadata = match &config.metadata.csv_url {
            Some(url) => {
                let client = CsvMetadataClient::new(url, timeout)?;
                Some(Box::new(client) as Box<dyn MetadataSource>)
            }
            None => None,
        };

        Ok(Self::with_sources(
            config,
            Box::new(sensors),
            metadata,
            Box::new(bulb),
        ))
    }

    /// Build a processor around arbitrary collaborators
    pub fn with_sources(
        config: AirglowConfig,
        sensors: Box<dyn SensorSource>,
        metadata: Option<Box<dyn MetadataSource>>,
        bulb: Box<dyn BulbController>,
    ) -> Self {
        Self {
            config,
            sensors,
            metadata,
            bulb,
        }
    }

    pub fn config(&self) -> &AirglowConfig {
        &self.config
    }

    /// Run the pipeline at the current time
    pub fn run(&self, options: RunOptions) -> Result<RunReport, AirglowError> {
        let metadata: Option<&dyn MetadataSource> = match &self.metadata {
            Some(source) => Some(source.as_ref()),
            None => None,
        };
        let sources = Sources {
            sensors: self.sensors.as_ref(),
            metadata,
        };
        run_once(&self.config, &sources, self.bulb.as_ref(), Utc::now(), options)
    }

    /// Set a literal color using the configured fade duration
    pub fn set_color(&self, color: &str) -> Result<(), AirglowError> {
        apply_manual_color(self.bulb.as_ref(), color, self.config.lifx.duration_sec)
    }
}
