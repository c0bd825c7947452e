//! The catalog aggregate and the store owning it.
//!
//! The store is the only thing allowed to mutate the catalog. Every mutation
//! recomputes the derived counters from a full scan of the images and then
//! rewrites the whole document through the injected [`Storage`] port before
//! returning.

use chrono::{DateTime, Utc};

use crate::db::Storage;
use crate::{ErrorKind, Result};

/// Creation-time-derived identifier, unix milliseconds.
pub type ImageId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub id: ImageId,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
    /// Generated name of the blob file, never derived from user input.
    pub filename: String,
    /// Public path under which the blob is served.
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_visits: u64,
    pub total_images: usize,
    pub total_favorites: usize,
}

/// Images ordered newest first, plus aggregate statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub images: Vec<ImageEntry>,
    pub stats: Stats,
}

impl Catalog {
    /// Recomputes the derived counters from the image list.
    pub fn recount(&mut self) {
        self.stats.total_images = self.images.len();
        self.stats.total_favorites = self.images.iter().filter(|i| i.is_favorite).count();
    }

    fn position(&self, id: ImageId) -> Option<usize> {
        self.images.iter().position(|i| i.id == id)
    }
}

pub struct CatalogStore {
    catalog: Catalog,
    storage: Box<dyn Storage>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    /// Loads the catalog from storage.
    ///
    /// A missing document starts an empty catalog. So does a document that
    /// can't be read or parsed, in which case a warning is logged and the
    /// broken document gets overwritten by the next mutation.
    pub fn load(storage: impl Storage + 'static) -> Self {
        let mut catalog = match storage.load() {
            Ok(Some(catalog)) => catalog,
            Ok(None) => {
                tracing::debug!("no catalog document found, starting empty");
                Catalog::default()
            }
            Err(e) => {
                tracing::warn!("failed loading catalog document, starting empty: {e}");
                Catalog::default()
            }
        };
        catalog.recount();

        tracing::info!(
            images = catalog.stats.total_images,
            favorites = catalog.stats.total_favorites,
            "catalog loaded"
        );

        Self {
            catalog,
            storage: Box::new(storage),
        }
    }

    /// Images in display order, newest first.
    pub fn images(&self) -> &[ImageEntry] {
        &self.catalog.images
    }

    pub fn stats(&self) -> &Stats {
        &self.catalog.stats
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageEntry> {
        self.catalog.images.iter().find(|i| i.id == id)
    }

    /// Returns an id for an entry created at `now`.
    ///
    /// The id is the creation time in milliseconds unless that would not be
    /// greater than the newest existing id, in which case it's bumped past
    /// it. Fails once the newest id is `i64::MAX`.
    pub fn next_id(&self, now: DateTime<Utc>) -> Result<ImageId> {
        let candidate = now.timestamp_millis();
        match self.catalog.images.iter().map(|i| i.id).max() {
            Some(newest) if newest >= candidate => newest.checked_add(1).ok_or_else(|| {
                ErrorKind::Other(format!("no image id left after {newest}")).into()
            }),
            _ => Ok(candidate),
        }
    }

    /// Puts a new entry at the front of the list and persists.
    pub fn insert(&mut self, entry: ImageEntry) -> Result<()> {
        self.catalog.images.insert(0, entry);
        self.catalog.recount();
        self.persist()
    }

    /// Flips the favorite flag of the entry with given id.
    ///
    /// Returns the new flag value, or `None` if there is no such entry in
    /// which case nothing is changed or written.
    pub fn toggle_favorite(&mut self, id: ImageId) -> Result<Option<bool>> {
        let Some(idx) = self.catalog.position(id) else {
            return Ok(None);
        };
        let entry = &mut self.catalog.images[idx];
        entry.is_favorite = !entry.is_favorite;
        let value = entry.is_favorite;
        self.catalog.recount();
        self.persist()?;
        Ok(Some(value))
    }

    /// Removes the entry with given id, returning it.
    ///
    /// The blob file is left alone, removing it is up to the caller.
    pub fn delete(&mut self, id: ImageId) -> Result<Option<ImageEntry>> {
        let Some(idx) = self.catalog.position(id) else {
            return Ok(None);
        };
        let entry = self.catalog.images.remove(idx);
        self.catalog.recount();
        self.persist()?;
        Ok(Some(entry))
    }

    /// Bumps the visit counter and persists. Returns the new count.
    pub fn record_visit(&mut self) -> Result<u64> {
        self.catalog.stats.total_visits += 1;
        self.persist()?;
        Ok(self.catalog.stats.total_visits)
    }

    fn persist(&self) -> Result<()> {
        self.storage.save(&self.catalog)
    }
}
