//! Relative-humidity correction for raw PM2.5
//!
//! Optical counters over-read in humid air as particles take up water. The raw
//! value is divided by a growth factor derived from RH, clamped to the 30-70%
//! range.

/// RH assumed when the sensor did not report one
pub const DEFAULT_RH: f64 = 50.0;

const RH_FLOOR: f64 = 30.0;
const RH_CEILING: f64 = 70.0;
const GROWTH_COEFFICIENT: f64 = 0.24;

/// Denominator applied to raw PM2.5 for the given relative humidity
pub fn correction_denominator(rh: Option<f64>) -> f64 {
    let rh = rh.filter(|v| v.is_finite()).unwrap_or(DEFAULT_RH);
    let effective = if rh < RH_FLOOR {
        RH_FLOOR
    } else if rh < RH_CEILING {
        rh
    } else {
        RH_CEILING
    };
    1.0 + GROWTH_COEFFICIENT / (100.0 / effective - 1.0)
}

/// Humidity-corrected PM2.5
pub fn rh_correct_pm25(pm25_raw: f64, rh: Option<f64>) -> f64 {
    pm25_raw / correction_denominator(rh)
}
