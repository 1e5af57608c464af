//! Catalog snapshot and report files.
//!
//! The snapshot is a JSON array of items in catalog order. Files are written
//! to a temporary sibling and renamed into place, so a crash mid-write never
//! leaves a truncated snapshot behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::error::CatalogError;
use super::item::{Catalog, CatalogItem};

/// Default snapshot file name.
pub const CATALOG_FILE: &str = "catalog.json";

/// Serializes `value` as pretty JSON and atomically replaces `path` with it.
///
/// # Errors
///
/// Returns [`CatalogError::Json`] if serialization fails and
/// [`CatalogError::Io`] if the file cannot be written or renamed.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), CatalogError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| CatalogError::json(path, e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CatalogError::io(parent, e))?;
    }

    let temp = temp_path(path);
    if let Err(error) = tokio::fs::write(&temp, &bytes).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(CatalogError::io(&temp, error));
    }
    if let Err(error) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(CatalogError::io(path, error));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "wrote JSON file");
    Ok(())
}

/// Writes the catalog snapshot.
///
/// # Errors
///
/// See [`write_json_atomic`].
#[instrument(skip(catalog), fields(items = catalog.len(), path = %path.display()))]
pub async fn save_catalog(catalog: &Catalog, path: &Path) -> Result<(), CatalogError> {
    write_json_atomic(path, catalog.items()).await
}

/// Reads a catalog snapshot.
///
/// Repeated identifiers keep their first record. Items without a name are
/// named after their id.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the file cannot be read,
/// [`CatalogError::Json`] if it is not a snapshot, and
/// [`CatalogError::MissingId`] for records with a blank id.
#[instrument(fields(path = %path.display()))]
pub async fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CatalogError::io(path, e))?;
    let items: Vec<CatalogItem> =
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::json(path, e))?;

    let mut catalog = Catalog::new();
    for (index, mut item) in items.into_iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(CatalogError::MissingId {
                path: path.to_path_buf(),
                index,
            });
        }
        if item.name.trim().is_empty() {
            item.name.clone_from(&item.id);
        }
        catalog.insert(item);
    }
    debug!(items = catalog.len(), "loaded catalog snapshot");
    Ok(catalog)
}

/// Reads the snapshot at `path` if there is one.
///
/// A missing file yields an empty catalog. So does an unreadable one, with a
/// warning.
pub async fn load_existing_catalog(path: &Path) -> Catalog {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Catalog::new();
    }
    match load_catalog(path).await {
        Ok(catalog) => catalog,
        Err(error) => {
            warn!(error = %error, "ignoring unreadable snapshot");
            Catalog::new()
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("snapshot"), OsString::from);
    name.push(".tmp");
    path.with_file_name(name)
}
