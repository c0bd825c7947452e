//! HTTP surface built on `axum`.

pub mod auth;
pub mod error;
pub mod home;
pub mod images;
pub mod upload;

use std::sync::Arc;

use axum::body::Body;
use axum::Extension;
use http::Request;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::CredentialCheck;
use crate::db::JsonFile;
use crate::{reconcile, BlobDir, CatalogStore, Config, ErrorKind, Result};

pub type Router = axum::Router;

pub type ConfigExt = Extension<Arc<Config>>;
pub type StoreExt = Extension<Arc<Mutex<CatalogStore>>>;
pub type BlobsExt = Extension<Arc<BlobDir>>;
pub type AuthExt = Extension<Arc<dyn CredentialCheck>>;

/// Everything the handlers share.
///
/// The catalog store sits behind an async mutex so that mutations are
/// applied one at a time, in the order requests acquire the lock. Store and
/// blob writes are plain blocking `std::fs` calls made while the lock is
/// held, handlers run them through [`with_store`] so they happen on the
/// blocking pool instead of a runtime worker.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<Mutex<CatalogStore>>,
    pub blobs: Arc<BlobDir>,
    pub auth: Arc<dyn CredentialCheck>,
}

impl AppState {
    pub fn new(config: Config, store: CatalogStore, blobs: BlobDir) -> Self {
        let auth: Arc<dyn CredentialCheck> = Arc::from(crate::auth::from_config(&config.auth));
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
            blobs: Arc::new(blobs),
            auth,
        }
    }

    /// Opens the document and blob directory pointed to by the config.
    pub fn open(config: Config) -> Result<Self> {
        let store = CatalogStore::load(JsonFile::new(&config.storage.document));
        let blobs = BlobDir::create(&config.storage.blobs)?;
        Ok(Self::new(config, store, blobs))
    }
}

/// Runs `f` against the locked store on the blocking thread pool.
///
/// The lock is held until `f` returns, so mutations stay serialized.
pub async fn with_store<T, F>(store: &Arc<Mutex<CatalogStore>>, f: F) -> Result<T>
where
    F: FnOnce(&mut CatalogStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let mut guard = store.clone().lock_owned().await;
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(|| f(&mut *guard)))
        .await
        .map_err(|e| ErrorKind::Other(format!("store task failed: {e}")))?
}

/// Builds the application router with all routes and shared state attached.
pub fn app(state: AppState) -> Router {
    let prefix = match state.config.upload.url_prefix.trim_end_matches('/') {
        "" => "/uploads".to_string(),
        p if p.starts_with('/') => p.to_string(),
        p => format!("/{p}"),
    };

    let mut router = Router::new()
        .merge(home::router())
        .merge(images::router())
        .merge(upload::router())
        .merge(auth::router())
        .nest_service(&prefix, ServeDir::new(state.blobs.root()));

    if state.config.assets.serve {
        router = router.fallback_service(ServeDir::new(&state.config.assets.path));
    }

    router
        .layer(Extension(state.config))
        .layer(Extension(state.store))
        .layer(Extension(state.blobs))
        .layer(Extension(state.auth))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

/// Initializes tracing and application state and starts the web server.
pub async fn start(config: Config) -> Result<()> {
    crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
    });

    start_with(AppState::open(config)?).await
}

pub async fn start_with(state: AppState) -> Result<()> {
    let report = reconcile::reconcile(&*state.store.lock().await, &state.blobs)?;
    if !report.is_clean() {
        tracing::warn!(
            orphaned = report.orphaned_blobs.len(),
            missing = report.missing_blobs.len(),
            "catalog and blob directory disagree, see `storyboard reconcile`"
        );
    }

    let addr = state.config.address;
    let router = app(state);

    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed listening for shutdown signal: {e}");
            }
        })
        .await?;

    Ok(())
}
