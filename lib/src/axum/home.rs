use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use axum::response::Html;
use axum::routing::get;
use axum::Extension;

use crate::Result;

use super::{with_store, ConfigExt, Router, StoreExt};

/// Served when the assets directory has no `index.html`.
const FALLBACK_PAGE: &str = "<!doctype html>\n<html><head><title>Storyboard</title></head>\
<body><h1>Storyboard</h1></body></html>\n";

pub fn router() -> Router {
    Router::new().route("/", get(home))
}

/// Landing page. Every view bumps the visit counter.
pub async fn home(Extension(store): StoreExt, Extension(config): ConfigExt) -> Result<Html<String>> {
    let visits = with_store(&store, |store| store.record_visit()).await?;
    tracing::debug!(visits, "landing page visit");

    let index = Path::new(&config.assets.path).join("index.html");
    let page = match tokio::fs::read_to_string(&index).await {
        Ok(page) => page,
        Err(e) if e.kind() == IoErrorKind::NotFound => FALLBACK_PAGE.to_string(),
        Err(e) => return Err(e.into()),
    };
    Ok(Html(page))
}
