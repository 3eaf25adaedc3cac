//! PurpleAir sensor API client

use super::{build_http_client, error_parts, SensorSource};
use crate::error::AirglowError;
use crate::normalizer::SENSOR_FIELDS;
use crate::types::SensorTable;
use log::debug;
use reqwest::blocking::Client;
use std::time::Duration;

/// Blocking client for `GET /sensors`
pub struct PurpleAirClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl PurpleAirClient {
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Result<Self, AirglowError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn sensors_url(&self) -> String {
        format!("{}/sensors", self.api_base)
    }
}

/// Query parameters selecting our fields for the given sensors
pub(crate) fn sensors_query(sensor_ids: &[i64]) -> Vec<(&'static str, String)> {
    let show_only = sensor_ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    vec![
        ("fields", SENSOR_FIELDS.join(",")),
        ("show_only", show_only),
    ]
}

impl SensorSource for PurpleAirClient {
    fn fetch_sensors(&self, sensor_ids: &[i64]) -> Result<SensorTable, AirglowError> {
        debug!("Fetching PurpleAir sensors {sensor_ids:?}");
        let response = self
            .client
            .get(self.sensors_url())
            .query(&sensors_query(sensor_ids))
            .header("X-API-Key", &self.api_key)
            .send()?;

        if !response.status().is_success() {
            let (status, body) = error_parts(response);
            return Err(AirglowError::SensorApi { status, body });
        }

        Ok(response.json::<SensorTable>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sensors_query() {
        assert_eq!(
            sensors_query(&[123421, 77]),
            vec![
                (
                    "fields",
                    "sensor_index,last_seen,humidity,pm2.5_atm,pm2.5_atm_a,pm2.5_atm_b".to_string()
                ),
                ("show_only", "123421,77".to_string()),
            ]
        );
    }

    #[test]
    fn test_sensors_url_trims_slash() {
        let client =
            PurpleAirClient::new("https://api.purpleair.com/v1/", "key", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.sensors_url(), "https://api.purpleair.com/v1/sensors");
    }

    #[test]
    fn test_sensor_table_deserializes_with_extra_keys() {
        let table: SensorTable = serde_json::from_str(
            r#"{
                "api_version": "V1.0.11",
                "time_stamp": 1700000000,
                "fields": ["sensor_index", "pm2.5_atm"],
                "data": [[123421, 4.5], [77, null]]
            }"#,
        )
        .unwrap();
        assert_eq!(table.fields, vec!["sensor_index", "pm2.5_atm"]);
        assert_eq!(table.data.len(), 2);
        assert!(table.data[1][1].is_null());
    }
}
