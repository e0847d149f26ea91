//! REST API request/response data transfer objects

use serde::{Deserialize, Serialize};

/// Predict response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
}

/// Update API key form. Fields are optional so missing ones map to 400
/// instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApiKeyForm {
    pub key_name: Option<String>,
    pub key_value: Option<String>,
}

/// Confirmation message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
    pub classifier: String,
    pub labels: Vec<String>,
    pub uptime_seconds: u64,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
