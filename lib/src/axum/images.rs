use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::routing::{delete, get, post};
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::{Error, ImageEntry, ImageId, Result, Stats};

use super::{with_store, BlobsExt, Router, StoreExt};

pub fn router() -> Router {
    Router::new()
        .route("/api/images", get(list))
        .route("/api/images/:id", delete(remove))
        .route("/api/stats", get(stats))
        .route("/api/favorite/:id", post(favorite))
}

pub async fn list(Extension(store): StoreExt) -> Json<Vec<ImageEntry>> {
    Json(store.lock().await.images().to_vec())
}

pub async fn stats(Extension(store): StoreExt) -> Json<Stats> {
    Json(store.lock().await.stats().clone())
}

pub async fn favorite(
    id: std::result::Result<Path<ImageId>, PathRejection>,
    Extension(store): StoreExt,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    match with_store(&store, move |store| store.toggle_favorite(id)).await? {
        Some(is_favorite) => Ok(Json(json!({
            "success": true,
            "isFavorite": is_favorite,
        }))),
        None => Err(Error::not_found("Image not found")),
    }
}

/// Deletes the entry, then its blob. A blob that can't be removed is logged
/// and left behind, the entry stays deleted either way.
pub async fn remove(
    id: std::result::Result<Path<ImageId>, PathRejection>,
    Extension(store): StoreExt,
    Extension(blobs): BlobsExt,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    let Some(entry) = with_store(&store, move |store| store.delete(id)).await? else {
        return Err(Error::not_found("Image not found"));
    };

    if let Err(e) = blobs.remove(&entry.filename) {
        tracing::warn!(id, "failed removing blob {}: {e}", entry.filename);
    }

    Ok(Json(json!({
        "success": true,
        "message": "Image deleted successfully",
    })))
}
