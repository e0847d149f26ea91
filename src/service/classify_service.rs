//! Classify Service - Core business logic
//!
//! Orchestrates upload persistence, decoding and inference.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::engine::{preprocess::decode_image, Classifier, Prediction};

use super::types::*;
use super::upload::{UploadStore, ValidatedUpload};

/// Leaf classification service
pub struct ClassifyService {
    classifier: Arc<dyn Classifier>,
    uploads: UploadStore,
}

impl ClassifyService {
    pub fn new(classifier: Arc<dyn Classifier>, uploads: UploadStore) -> Self {
        Self { classifier, uploads }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Save a validated upload, then classify the saved file
    pub async fn classify_upload(
        &self,
        upload: ValidatedUpload,
    ) -> Result<ClassifiedUpload, ClassifyError> {
        let start = Instant::now();

        let saved = self
            .uploads
            .save(&upload)
            .await
            .map_err(ClassifyError::Storage)?;
        let prediction = self.classify_file(&saved.path).await?;

        let inference_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Classified {} as {} ({:.2}%) in {}ms",
            saved.file_name, prediction.label, prediction.confidence, inference_time_ms
        );

        Ok(ClassifiedUpload {
            upload: saved,
            prediction,
            inference_time_ms,
        })
    }

    /// Decode and classify an image file on disk
    pub async fn classify_file(&self, path: &Path) -> Result<Prediction, ClassifyError> {
        let data = tokio::fs::read(path).await.map_err(ClassifyError::Storage)?;
        self.classify_bytes(data).await
    }

    /// Decode and classify encoded image bytes on the blocking pool
    pub async fn classify_bytes(&self, data: Vec<u8>) -> Result<Prediction, ClassifyError> {
        let classifier = self.classifier.clone();

        tokio::task::spawn_blocking(move || {
            let image = decode_image(&data)?;
            classifier.classify(&image).map_err(ClassifyError::Inference)
        })
        .await
        .map_err(|e| ClassifyError::Inference(e.into()))?
    }

    pub fn health(&self) -> HealthResult {
        HealthResult {
            healthy: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            classifier: self.classifier.kind().as_str().to_string(),
            labels: self
                .classifier
                .labels()
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}


