//! Shared fixtures for unit tests

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use tempfile::TempDir;

use crate::api::AppState;
use crate::engine::{Classifier, PipelineClassifier, PipelineWeights};
use crate::service::{ClassifyService, UploadStore};
use crate::storage::SqliteStorage;

/// Pipeline classifier that always favours `blast`
pub fn blast_classifier() -> Arc<dyn Classifier> {
    let weights = PipelineWeights::with_intercept(vec![4.0, 0.0, 0.0, 0.0]);
    Arc::new(PipelineClassifier::from_weights(weights).unwrap())
}

/// Solid green PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([60, 140, 40])));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// App state backed by a fresh database and upload directory inside `dir`
pub async fn test_state(dir: &TempDir) -> Arc<AppState<SqliteStorage>> {
    test_state_with_limit(dir, 16 * 1024 * 1024).await
}

pub async fn test_state_with_limit(
    dir: &TempDir,
    body_limit_bytes: usize,
) -> Arc<AppState<SqliteStorage>> {
    let db_path = dir.path().join("api_key.db");
    let storage = SqliteStorage::new(db_path.to_str().unwrap()).await.unwrap();

    let uploads = UploadStore::new(dir.path().join("uploads"));
    uploads.ensure_dir().await.unwrap();

    Arc::new(AppState {
        service: Arc::new(ClassifyService::new(blast_classifier(), uploads)),
        storage: Arc::new(storage),
        body_limit_bytes,
        start_time: Instant::now(),
    })
}
