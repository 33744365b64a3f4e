//! Image storage.
//!
//! Uploaded images are kept in named buckets; records store the image as a
//! `data:image/png;base64,...` URL so readers never need the bucket.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::RwLock;

use crate::error::BoardError;

/// Bucket holding workspace and project images.
pub const IMAGES_BUCKET: &str = "images";

/// Prefix of every stored image URL.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("file {file_id} not found in bucket {bucket}")]
    NotFound { bucket: String, file_id: String },
}

/// In-memory file storage.
#[derive(Debug, Default)]
pub struct ImageStore {
    buckets: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl ImageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` and returns the new file id.
    pub fn store(&self, bucket: &str, bytes: Vec<u8>) -> String {
        let file_id = crate::store::new_document_id();
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(file_id.clone(), bytes);
        file_id
    }

    /// Returns a copy of a stored file.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::NotFound`] for an unknown bucket or file id.
    pub fn fetch_bytes(&self, bucket: &str, file_id: &str) -> Result<Vec<u8>, ImageError> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|files| files.get(file_id))
            .cloned()
            .ok_or_else(|| ImageError::NotFound {
                bucket: bucket.to_string(),
                file_id: file_id.to_string(),
            })
    }

    /// Stores an uploaded image and returns its data URL.
    ///
    /// `image` is base64, optionally already wrapped in a data URL. `None`
    /// and the empty string mean "no image".
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] if `image` is not valid base64.
    pub fn upload(&self, image: Option<&str>) -> Result<Option<String>, BoardError> {
        let Some(encoded) = image.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let payload = encoded
            .split_once(";base64,")
            .filter(|(head, _)| head.starts_with("data:"))
            .map_or(encoded, |(_, body)| body);
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| BoardError::validation(format!("image is not valid base64: {e}")))?;

        let file_id = self.store(IMAGES_BUCKET, bytes);
        let stored = self
            .fetch_bytes(IMAGES_BUCKET, &file_id)
            .map_err(|e| BoardError::validation(e.to_string()))?;
        tracing::debug!(file_id, size = stored.len(), "image stored");
        Ok(Some(image_data_url(&stored)))
    }
}

/// Encodes image bytes as a PNG data URL.
#[must_use]
pub fn image_data_url(bytes: &[u8]) -> String {
    format!("{DATA_URL_PREFIX}{}", STANDARD.encode(bytes))
}
