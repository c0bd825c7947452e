//! Upload handling: validation, blob persistence and catalog entry creation.
//!
//! Checks run in a fixed order. A missing attachment, a non-image content
//! type and an oversized payload are rejected before anything reaches the
//! disk. Title and description are only checked after the blob was written,
//! and a failure there removes the blob again before reporting the error.

use chrono::Utc;

use crate::blob::{self, BlobDir};
use crate::catalog::{CatalogStore, ImageEntry};
use crate::{Error, Result};

/// File part of an upload request.
#[derive(Clone, Debug, Default)]
pub struct Attachment {
    pub content_type: String,
    /// Client side filename, used for the extension only.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct UploadRequest {
    pub attachment: Option<Attachment>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UploadLimits {
    /// Maximum attachment size in bytes.
    pub max_size: usize,
    /// Maximum size of a single text field in bytes.
    pub max_text_size: usize,
    /// Public prefix the blob directory is served under.
    pub url_prefix: String,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_size: crate::config::DEFAULT_MAX_UPLOAD_SIZE,
            max_text_size: crate::config::DEFAULT_MAX_TEXT_SIZE,
            url_prefix: "/uploads".to_string(),
        }
    }
}

impl From<&crate::config::Upload> for UploadLimits {
    fn from(c: &crate::config::Upload) -> Self {
        Self {
            max_size: c.max_size,
            max_text_size: c.max_text_size,
            url_prefix: c.url_prefix.clone(),
        }
    }
}

impl UploadLimits {
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), filename)
    }

    pub fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_size {
            return Err(Error::bad_input(format!(
                "File too large, the limit is {} bytes",
                self.max_size
            )));
        }
        Ok(())
    }

    pub fn check_text_size(&self, field: &str, size: usize) -> Result<()> {
        if size > self.max_text_size {
            return Err(Error::bad_input(format!(
                "The {field} is too long, the limit is {} bytes",
                self.max_text_size
            )));
        }
        Ok(())
    }
}

/// Accepts only content types of the `image/*` family.
pub fn check_content_type(content_type: &str) -> Result<()> {
    match content_type.parse::<mime::Mime>() {
        Ok(m) if m.type_() == mime::IMAGE => Ok(()),
        _ => Err(Error::bad_input("Only image files are allowed")),
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Validates the request, stores the blob and inserts the new entry at the
/// front of the catalog.
pub fn accept(
    store: &mut CatalogStore,
    blobs: &BlobDir,
    limits: &UploadLimits,
    request: UploadRequest,
) -> Result<ImageEntry> {
    let Some(attachment) = request.attachment else {
        return Err(Error::bad_input("No image file provided"));
    };
    check_content_type(&attachment.content_type)?;
    limits.check_size(attachment.bytes.len())?;

    let now = Utc::now();
    let id = store.next_id(now)?;
    let filename = blob::generate_name(now, attachment.file_name.as_deref());
    blobs.write(&filename, &attachment.bytes)?;

    if !present(&request.title) || !present(&request.description) {
        if let Err(e) = blobs.remove(&filename) {
            tracing::warn!("failed removing rejected upload {filename}: {e}");
        }
        return Err(Error::bad_input("Title and description are required"));
    }

    let entry = ImageEntry {
        id,
        title: request.title.unwrap_or_default(),
        description: request.description.unwrap_or_default(),
        date: now,
        is_favorite: false,
        url: limits.url_for(&filename),
        filename,
    };
    store.insert(entry.clone())?;

    tracing::info!(id = entry.id, filename = %entry.filename, "image uploaded");

    Ok(entry)
}
