//! Error types for the gateway crate

use thiserror::Error;

/// Gateway-level errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("payload serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Serialization(e.to_string())
    }
}
