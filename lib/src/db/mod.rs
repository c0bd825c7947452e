//! Persistence port for the catalog document.
//!
//! The store only ever needs two things from its backend: read the whole
//! document once at startup and overwrite the whole document after a
//! mutation. Backends are picked by the caller, `JsonFile` for the real
//! thing and `Memory` for tests and throwaway catalogs.

mod json;
mod memory;

pub use json::JsonFile;
pub use memory::Memory;

use crate::catalog::Catalog;
use crate::Result;

pub trait Storage: Send + Sync {
    /// Reads the persisted catalog. `Ok(None)` means nothing was persisted
    /// yet.
    fn load(&self) -> Result<Option<Catalog>>;

    /// Replaces the persisted catalog with the given one.
    fn save(&self, catalog: &Catalog) -> Result<()>;
}

pub fn decode(bytes: &[u8]) -> Result<Catalog> {
    let catalog: Catalog = serde_json::from_slice(bytes)?;
    Ok(catalog)
}

pub fn encode(catalog: &Catalog) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec_pretty(catalog)?;
    Ok(bytes)
}
