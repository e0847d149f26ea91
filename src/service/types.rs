//! Service layer types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::upload::SavedUpload;
use crate::engine::Prediction;

/// Result of classifying one upload
#[derive(Debug, Clone)]
pub struct ClassifiedUpload {
    pub upload: SavedUpload,
    pub prediction: Prediction,
    pub inference_time_ms: u64,
}

/// Failure after an upload passed validation
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Bytes could not be decoded as an image
    #[error("Invalid image")]
    InvalidImage(#[from] image::ImageError),
    #[error("Failed to store upload: {0}")]
    Storage(std::io::Error),
    #[error("Inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl ClassifyError {
    /// True when the caller sent something unusable, as opposed to a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClassifyError::InvalidImage(_))
    }
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResult {
    pub healthy: bool,
    pub version: String,
    pub classifier: String,
    pub labels: Vec<String>,
}
