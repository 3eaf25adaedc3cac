//! Reading normalization
//!
//! This module turns rows of the PurpleAir sensor table into typed readings.
//! - Null, absent, NaN and unparsable values become `None`
//! - Freshness is computed against the poll instant
//! - The best raw value is selected and humidity-corrected for fresh sensors

use crate::humidity::rh_correct_pm25;
use crate::selector::select_best_pm;
use crate::types::{SensorReading, SensorTable};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

pub const FIELD_SENSOR_INDEX: &str = "sensor_index";
pub const FIELD_LAST_SEEN: &str = "last_seen";
pub const FIELD_HUMIDITY: &str = "humidity";
pub const FIELD_PM25_ATM: &str = "pm2.5_atm";
pub const FIELD_PM25_ATM_A: &str = "pm2.5_atm_a";
pub const FIELD_PM25_ATM_B: &str = "pm2.5_atm_b";

/// Fields requested from the sensor API, in request order
pub const SENSOR_FIELDS: [&str; 6] = [
    FIELD_SENSOR_INDEX,
    FIELD_LAST_SEEN,
    FIELD_HUMIDITY,
    FIELD_PM25_ATM,
    FIELD_PM25_ATM_A,
    FIELD_PM25_ATM_B,
];

/// Normalizer for converting raw table rows to sensor readings
pub struct Normalizer;

impl Normalizer {
    /// Normalize every row of a sensor table. Rows without a sensor index are dropped.
    pub fn normalize_table(
        table: &SensorTable,
        now: DateTime<Utc>,
        max_age_minutes: u32,
    ) -> Vec<SensorReading> {
        table
            .data
            .iter()
            .filter_map(|row| Self::normalize_row(&table.fields, row, now, max_age_minutes))
            .collect()
    }

    /// Normalize a single row given its column names
    pub fn normalize_row(
        fields: &[String],
        row: &[Value],
        now: DateTime<Utc>,
        max_age_minutes: u32,
    ) -> Option<SensorReading> {
        let record: HashMap<&str, &Value> = fields
            .iter()
            .map(String::as_str)
            .zip(row.iter())
            .collect();
        let get = |key: &str| parse_number(record.get(key).copied());

        let sensor_index = get(FIELD_SENSOR_INDEX)
            .filter(|v| v.fract() == 0.0)
            .and_then(to_i64);
        let Some(sensor_index) = sensor_index else {
            warn!("Skipping sensor row without a usable sensor_index: {row:?}");
            return None;
        };

        let last_seen = get(FIELD_LAST_SEEN).map(f64::trunc).and_then(to_i64);
        let humidity = get(FIELD_HUMIDITY);
        let pm25_atm = get(FIELD_PM25_ATM);
        let pm25_atm_a = get(FIELD_PM25_ATM_A);
        let pm25_atm_b = get(FIELD_PM25_ATM_B);

        let is_fresh = is_fresh(last_seen, now, max_age_minutes);
        let selection = select_best_pm(pm25_atm_a, pm25_atm_b, pm25_atm);
        let pm25_best_raw = selection.value();
        let pm25_corr = if is_fresh {
            pm25_best_raw.map(|raw| rh_correct_pm25(raw, humidity))
        } else {
            None
        };

        debug!(
            "sensor {sensor_index}: a={pm25_atm_a:?} b={pm25_atm_b:?} avg={pm25_atm:?} -> {:?} {pm25_best_raw:?}, rh={humidity:?}, fresh={is_fresh}, corr={pm25_corr:?}",
            selection.path()
        );

        Some(SensorReading {
            sensor_index,
            last_seen,
            last_seen_iso: last_seen.and_then(epoch_to_iso),
            humidity,
            pm25_atm,
            pm25_atm_a,
            pm25_atm_b,
            pm25_best_raw,
            pm25_selection: selection.path(),
            pm25_corr,
            is_fresh,
        })
    }
}

/// Interpret a JSON cell as a finite float. Numeric strings are accepted.
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Whether a sensor last seen at `last_seen` is within `max_age_minutes` of `now`.
/// The boundary is inclusive; an unknown `last_seen` is never fresh.
pub fn is_fresh(last_seen: Option<i64>, now: DateTime<Utc>, max_age_minutes: u32) -> bool {
    let max_age_secs = i64::from(max_age_minutes) * 60;
    last_seen
        .and_then(|ts| now.timestamp().checked_sub(ts))
        .is_some_and(|age| age <= max_age_secs)
}

/// `v` as an i64, or `None` when it does not fit
fn to_i64(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the open upper bound
    (v >= i64::MIN as f64 && v < i64::MAX as f64).then(|| v as i64)
}

fn epoch_to_iso(ts: i64) -> Option<String> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
