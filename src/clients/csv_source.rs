//! Metadata CSV fetched over HTTP

use super::{build_http_client, error_parts, MetadataSource};
use crate::error::AirglowError;
use reqwest::blocking::Client;
use std::time::Duration;

pub struct CsvMetadataClient {
    client: Client,
    url: String,
}

impl CsvMetadataClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AirglowError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            url: url.to_string(),
        })
    }
}

impl MetadataSource for CsvMetadataClient {
    fn fetch_metadata(&self) -> Result<String, AirglowError> {
        let response = self.client.get(&self.url).send()?;
        if !response.status().is_success() {
            let (status, body) = error_parts(response);
            return Err(AirglowError::Metadata(format!(
                "GET {} returned {status}: {body}",
                self.url
            )));
        }
        Ok(response.text()?)
    }
}
