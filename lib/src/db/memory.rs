use std::sync::{Arc, Mutex};

use crate::catalog::Catalog;
use crate::{ErrorKind, Result};

use super::Storage;

/// In-memory backend. Clones share the same document, which lets a test
/// hand one clone to the store and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    document: Option<Catalog>,
    saves: usize,
}

impl Memory {
    /// Creates a backend that already holds a persisted catalog.
    pub fn with(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                document: Some(catalog),
                saves: 0,
            })),
        }
    }

    /// Last saved catalog, if any.
    pub fn snapshot(&self) -> Option<Catalog> {
        self.inner.lock().ok().and_then(|i| i.document.clone())
    }

    /// Number of times `save` was called.
    pub fn saves(&self) -> usize {
        self.inner.lock().map(|i| i.saves).unwrap_or_default()
    }
}

impl Storage for Memory {
    fn load(&self) -> Result<Option<Catalog>> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        Ok(inner.document.clone())
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        inner.document = Some(catalog.clone());
        inner.saves += 1;
        Ok(())
    }
}
