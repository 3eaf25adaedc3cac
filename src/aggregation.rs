//! Aggregation and freshness policy
//!
//! Combines the readings of one run into a single light decision: the
//! unweighted mean of every fresh, corrected reading, mapped to a color.

use crate::color::pm25_color;
use crate::types::{LightDecision, SensorReading, Strategy};

/// Decide which color (if any) the bulb should show.
///
/// `configured_sensors` is the number of sensors in the config, not the number
/// of rows the API returned.
pub fn decide_light(
    configured_sensors: usize,
    readings: &[SensorReading],
    device_id: &str,
    duration_sec: u32,
) -> LightDecision {
    let mut decision = LightDecision {
        lifx_device_id: device_id.to_string(),
        strategy: Strategy::NoSensorsConfigured,
        used_sensor_indices: Vec::new(),
        used_pm25_corr: None,
        color_hex: None,
        duration_sec,
    };

    if configured_sensors == 0 {
        return decision;
    }

    let usable: Vec<(i64, f64)> = readings
        .iter()
        .filter(|r| r.is_usable())
        .filter_map(|r| r.pm25_corr.map(|v| (r.sensor_index, v)))
        .collect();

    if usable.is_empty() {
        decision.strategy = Strategy::NoneAvailable;
        return decision;
    }

    let mean = usable.iter().map(|(_, v)| v).sum::<f64>() / usable.len() as f64;

    decision.strategy = Strategy::AverageFreshSensors;
    decision.used_sensor_indices = usable.iter().map(|(id, _)| *id).collect();
    decision.used_pm25_corr = Some(mean);
    decision.color_hex = Some(pm25_color(mean).to_string());
    decision
}
