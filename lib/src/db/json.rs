use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::Result;

use super::{decode, encode, Storage};

/// Catalog stored as a single JSON document on disk.
///
/// Each save truncates and rewrites the file in place. There is no atomic
/// replace, so a crash in the middle of a write leaves a broken document
/// behind which the next startup treats as an empty catalog.
#[derive(Clone, Debug)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFile {
    fn load(&self) -> Result<Option<Catalog>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(decode(&bytes)?))
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, encode(catalog)?)?;
        Ok(())
    }
}
