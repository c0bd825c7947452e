//! Consistency check between the catalog document and the blob directory.
//!
//! The two are written independently, so they can drift apart: a crash
//! right after a blob was written leaves a file nobody references, and a
//! blob removal that failed during delete leaves a file behind as well.
//! Entries can also outlive their file if someone cleans the directory by
//! hand. Nothing here runs automatically, the server only reports.

use std::collections::HashSet;

use crate::blob::BlobDir;
use crate::catalog::{CatalogStore, ImageId};
use crate::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Blob files without a catalog entry.
    pub orphaned_blobs: Vec<String>,
    /// Entries whose blob file is gone.
    pub missing_blobs: Vec<ImageId>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.orphaned_blobs.is_empty() && self.missing_blobs.is_empty()
    }
}

pub fn reconcile(store: &CatalogStore, blobs: &BlobDir) -> Result<Report> {
    let on_disk = blobs.names()?.into_iter().collect::<HashSet<_>>();
    let referenced = store
        .images()
        .iter()
        .map(|i| i.filename.as_str())
        .collect::<HashSet<_>>();

    let mut orphaned_blobs = on_disk
        .iter()
        .filter(|name| !referenced.contains(name.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    orphaned_blobs.sort();

    let missing_blobs = store
        .images()
        .iter()
        .filter(|i| !on_disk.contains(&i.filename))
        .map(|i| i.id)
        .collect();

    Ok(Report {
        orphaned_blobs,
        missing_blobs,
    })
}

/// Deletes the orphaned blobs listed in the report. Returns how many were
/// removed; failures are logged and skipped.
pub fn prune(blobs: &BlobDir, report: &Report) -> usize {
    let mut removed = 0;
    for name in &report.orphaned_blobs {
        match blobs.remove(name) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("failed pruning orphaned blob {name}: {e}"),
        }
    }
    removed
}
