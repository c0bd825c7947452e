use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::routing::post;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::upload::{self, Attachment, UploadLimits, UploadRequest};
use crate::{Error, Result};

use super::{with_store, BlobsExt, ConfigExt, Router, StoreExt};

pub fn router() -> Router {
    // Size ceilings are enforced per part while streaming, the default body
    // limit would cut uploads off well below the image ceiling.
    Router::new().route(
        "/api/upload",
        post(upload).layer(DefaultBodyLimit::disable()),
    )
}

/// Accepts a multipart form with an `image` file part and `title` and
/// `description` text parts.
pub async fn upload(
    Extension(store): StoreExt,
    Extension(blobs): BlobsExt,
    Extension(config): ConfigExt,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let limits = UploadLimits::from(&config.upload);
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                if request.attachment.is_some() {
                    return Err(Error::bad_input("Only one image file is allowed"));
                }
                request.attachment = Some(read_attachment(field, &limits).await?);
            }
            Some("title") => request.title = Some(read_text(field, &limits).await?),
            Some("description") => {
                request.description = Some(read_text(field, &limits).await?)
            }
            other => tracing::trace!("ignoring multipart field {other:?}"),
        }
    }

    let entry = with_store(&store, move |store| {
        upload::accept(store, &blobs, &limits, request)
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "image": entry,
        "message": "Image uploaded successfully",
    })))
}

/// Reads the file part, checking the content type before the first byte is
/// read and the size after every chunk.
async fn read_attachment(mut field: Field<'_>, limits: &UploadLimits) -> Result<Attachment> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    upload::check_content_type(&content_type)?;
    let file_name = field.file_name().map(str::to_owned);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        limits.check_size(bytes.len() + chunk.len())?;
        bytes.extend_from_slice(&chunk);
    }

    Ok(Attachment {
        content_type,
        file_name,
        bytes,
    })
}

/// Reads a text part, giving up as soon as it grows past the text ceiling.
async fn read_text(mut field: Field<'_>, limits: &UploadLimits) -> Result<String> {
    let name = field.name().unwrap_or_default().to_string();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        limits.check_text_size(&name, bytes.len() + chunk.len())?;
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| Error::bad_input(format!("The {name} is not valid UTF-8")))
}
