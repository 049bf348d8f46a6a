//! User-authored uploads: an ordered, locally stored gallery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{keys, Store, StoreError};

/// A user-authored meme: the image as a data URI plus its caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMeme {
    pub url: String,
    pub caption: String,
    /// Absent on records written by older sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Ordered list of uploads, deletable by index.
#[derive(Clone)]
pub struct UploadGallery {
    store: Store,
}

impl UploadGallery {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All uploads in upload order, default empty.
    pub async fn uploads(&self) -> Result<Vec<UploadedMeme>, StoreError> {
        self.store.get_json_or_default(keys::UPLOADED_MEMES).await
    }

    /// Append an upload. An empty image is rejected as a no-op (returns
    /// `false`); no partial state is written.
    pub async fn add(&self, url: &str, caption: &str) -> Result<bool, StoreError> {
        if url.is_empty() {
            tracing::debug!("Rejected upload with no image data");
            return Ok(false);
        }

        let mut uploads = self.uploads().await?;
        uploads.push(UploadedMeme {
            url: url.to_string(),
            caption: caption.to_string(),
            uploaded_at: Some(Utc::now()),
        });
        self.store.set_json(keys::UPLOADED_MEMES, &uploads).await?;
        Ok(true)
    }

    /// Delete the upload at `index`. Out-of-range is a no-op; returns
    /// whether anything was removed.
    pub async fn delete_at(&self, index: usize) -> Result<bool, StoreError> {
        let mut uploads = self.uploads().await?;
        if index >= uploads.len() {
            return Ok(false);
        }
        uploads.remove(index);
        self.store.set_json(keys::UPLOADED_MEMES, &uploads).await?;
        Ok(true)
    }
}
