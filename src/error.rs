//! Error types for airglow

use thiserror::Error;

/// Errors that can abort a run (or be recovered from by the pipeline)
#[derive(Debug, Error)]
pub enum AirglowError {
    #[error("Missing required credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PurpleAir API error {status}: {body}")]
    SensorApi { status: u16, body: String },

    #[error("LIFX API error {status}: {body}")]
    BulbApi { status: u16, body: String },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AirglowError {
    /// Whether this error came from one of the upstream HTTP services
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AirglowError::Http(_) | AirglowError::SensorApi { .. } | AirglowError::BulbApi { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status_and_body() {
        let err = AirglowError::BulbApi {
            status: 401,
            body: "bad token".to_string(),
        };
        assert_eq!(err.to_string(), "LIFX API error 401: bad token");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_missing_credential_is_not_upstream() {
        let err = AirglowError::MissingCredential("LIFX_API_KEY");
        assert!(!err.is_upstream());
        assert!(err.to_string().contains("LIFX_API_KEY"));
    }
}
