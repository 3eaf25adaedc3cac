//! Upstream service clients
//!
//! The pipeline talks to three collaborators through these traits: the
//! PurpleAir sensor API, an optional metadata CSV, and the LIFX bulb API.
//! The HTTP implementations use blocking reqwest with a fixed timeout and no
//! retries.

mod csv_source;
mod lifx;
mod purpleair;

pub use csv_source::CsvMetadataClient;
pub use lifx::{LifxClient, LifxStateRequest};
pub use purpleair::PurpleAirClient;

use crate::error::AirglowError;
use crate::types::SensorTable;
use reqwest::blocking::{Client, Response};
use std::time::Duration;

/// Source of latest sensor readings
pub trait SensorSource {
    /// Fetch the latest row for each of `sensor_ids`
    fn fetch_sensors(&self, sensor_ids: &[i64]) -> Result<SensorTable, AirglowError>;
}

/// Source of the raw metadata CSV
pub trait MetadataSource {
    fn fetch_metadata(&self) -> Result<String, AirglowError>;
}

/// Something that can change a bulb's color
pub trait BulbController {
    fn set_color(&self, color: &str, duration_sec: u32) -> Result<(), AirglowError>;
}

fn build_http_client(timeout: Duration) -> Result<Client, AirglowError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("airglow/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Status code and body of a non-2xx response
fn error_parts(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    (status, body)
}
