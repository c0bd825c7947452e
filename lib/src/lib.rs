//! Backend for an image storyboard gallery.
//!
//! Images are uploaded together with a title and a description, listed
//! newest first, flagged as favorites and deleted. The whole catalog lives in
//! a single JSON document rewritten on every mutation, while image bytes are
//! kept as plain files in a blob directory.

#[macro_use]
extern crate serde_derive;

pub mod auth;
pub mod blob;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod reconcile;
pub mod tracing;
pub mod upload;

#[cfg(feature = "axum")]
pub mod axum;

pub use blob::BlobDir;
pub use catalog::{Catalog, CatalogStore, ImageEntry, ImageId, Stats};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};

#[cfg(feature = "axum")]
pub use crate::axum::{app, start, AppState};
