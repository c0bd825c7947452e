use anyhow::Result;

use storyboard::db::JsonFile;
use storyboard::{BlobDir, CatalogStore, Config};

/// Opens the catalog document pointed to by the config. Nothing is written
/// unless the caller mutates the store.
pub fn open_store(config: &Config) -> CatalogStore {
    CatalogStore::load(JsonFile::new(&config.storage.document))
}

pub fn open_blobs(config: &Config) -> Result<BlobDir> {
    Ok(BlobDir::create(&config.storage.blobs)?)
}
