//! Upload validation and persistence

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::utils::filename::{allowed_extension, secure_filename};

/// Public URL prefix under which the upload directory is served
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";

/// Client input errors. Messages are returned to the caller verbatim.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file part")]
    MissingFile,
    #[error("No selected file")]
    EmptyFilename,
    #[error("Invalid file")]
    DisallowedExtension,
}

/// Raw `file` field as received from the form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// An upload that passed validation and carries its sanitized name
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub file_name: String,
    pub extension: String,
    pub data: Vec<u8>,
}

impl ValidatedUpload {
    /// Check presence, filename and extension, in that order
    pub fn validate(upload: Option<ImageUpload>) -> Result<Self, UploadError> {
        let upload = upload.ok_or(UploadError::MissingFile)?;

        if upload.file_name.is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        let extension =
            allowed_extension(&upload.file_name).ok_or(UploadError::DisallowedExtension)?;

        // An allowed extension always survives sanitization, so the name is never empty
        Ok(Self {
            file_name: secure_filename(&upload.file_name),
            extension,
            data: upload.data,
        })
    }
}

/// An upload written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedUpload {
    pub file_name: String,
    /// Lowercase extension, one of the allowed ones
    pub extension: String,
    pub path: PathBuf,
    /// URL the saved file is served under
    pub url: String,
}

/// Flat upload directory. Same-name uploads overwrite each other.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if needed
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub async fn save(&self, upload: &ValidatedUpload) -> std::io::Result<SavedUpload> {
        let path = self.dir.join(&upload.file_name);
        tokio::fs::write(&path, &upload.data).await?;
        debug!(
            "Saved {} upload {} ({} bytes)",
            upload.extension,
            path.display(),
            upload.data.len()
        );

        Ok(SavedUpload {
            file_name: upload.file_name.clone(),
            extension: upload.extension.clone(),
            url: format!("{}/{}", UPLOAD_URL_PREFIX, upload.file_name),
            path,
        })
    }
}


