//! LIFX HTTP API client

use super::{build_http_client, error_parts, BulbController};
use crate::error::AirglowError;
use log::info;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use std::time::Duration;

/// Body of `PUT /lights/{selector}/state`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifxStateRequest<'a> {
    pub color: &'a str,
    pub duration: u32,
    pub fast: bool,
}

/// Blocking client targeting a single bulb by id
pub struct LifxClient {
    client: Client,
    api_base: String,
    api_key: String,
    device_id: String,
}

impl LifxClient {
    pub fn new(
        api_base: &str,
        api_key: &str,
        device_id: &str,
        timeout: Duration,
    ) -> Result<Self, AirglowError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            device_id: device_id.to_string(),
        })
    }

    fn state_url(&self) -> String {
        format!("{}/lights/id:{}/state", self.api_base, self.device_id)
    }
}

impl BulbController for LifxClient {
    fn set_color(&self, color: &str, duration_sec: u32) -> Result<(), AirglowError> {
        let request = LifxStateRequest {
            color,
            duration: duration_sec,
            fast: false,
        };
        let response = self
            .client
            .put(self.state_url())
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let (status, body) = error_parts(response);
            return Err(AirglowError::BulbApi { status, body });
        }

        info!("LIFX {} set to {color} over {duration_sec}s", self.device_id);
        Ok(())
    }
}
