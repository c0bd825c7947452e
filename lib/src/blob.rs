//! Blob directory holding the uploaded image files.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{Error, Result};

/// Directory with one file per catalog entry, named by a generated filename.
#[derive(Clone, Debug)]
pub struct BlobDir {
    root: PathBuf,
}

impl BlobDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens the directory, creating it if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let dir = Self::new(root);
        std::fs::create_dir_all(&dir.root)?;
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the named blob.
    ///
    /// Only generated names are ever passed in here, anything that could
    /// escape the directory is refused.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == ".."
        {
            return Err(Error::bad_input(format!("invalid blob name: {name}")));
        }
        Ok(self.root.join(name))
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        std::fs::write(self.path(name)?, bytes)?;
        Ok(())
    }

    /// Removes the named blob. Removing a blob that doesn't exist is not an
    /// error.
    pub fn remove(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.path(name)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Names of all regular files in the directory, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        let mut names = vec![];
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Generates a blob name of the form `<unix-millis>-<random><.ext>`.
///
/// The only piece taken from the client is the extension of the original
/// filename, and only if it's short and alphanumeric.
pub fn generate_name(now: DateTime<Utc>, original: Option<&str>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = original.and_then(extension).unwrap_or_default();
    format!("{}-{}{}", now.timestamp_millis(), suffix, ext)
}

/// Extracts a sanitized, lowercased `.ext` from a client filename.
fn extension(original: &str) -> Option<String> {
    let name = original.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > 8
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
