//! Service layer module

pub mod classify_service;
pub mod types;
pub mod upload;

pub use classify_service::ClassifyService;
pub use types::*;
pub use upload::{ImageUpload, SavedUpload, UploadError, UploadStore, ValidatedUpload};
