use crate::models::{Library, MediaItem};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CATALOG_SNAPSHOT_FILE: &str = "catalog_snapshot.json";

/// On-disk copy of the catalog's content lists, so a client can come up
/// with something to show before (or without) reaching the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub libraries: Vec<Library>,
    pub recent: Vec<MediaItem>,
    pub popular: Vec<MediaItem>,
}

/// Get the XDG cache directory for the application
fn get_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .context("failed to get cache directory")?
        .join("plexling");

    fs::create_dir_all(&cache_dir).context("failed to create cache directory")?;

    Ok(cache_dir)
}

/// Write data to a cache file
fn write_cache<T: Serialize>(filename: &str, data: &T) -> Result<()> {
    let cache_file = get_cache_dir()?.join(filename);

    let json = serde_json::to_string(data).context("failed to serialize cache data")?;

    fs::write(&cache_file, json)
        .with_context(|| format!("failed to write cache file: {}", cache_file.display()))?;

    tracing::debug!("wrote cache to {}", cache_file.display());
    Ok(())
}

/// Read data from a cache file
fn read_cache<T: for<'de> Deserialize<'de>>(filename: &str) -> Result<Option<T>> {
    let cache_file = get_cache_dir()?.join(filename);

    if !cache_file.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&cache_file)
        .with_context(|| format!("failed to read cache file: {}", cache_file.display()))?;

    let data: T = serde_json::from_str(&json).context("failed to deserialize cache data")?;

    tracing::debug!("read cache from {}", cache_file.display());
    Ok(Some(data))
}

/// Delete a cache file
fn clear_cache(filename: &str) -> Result<()> {
    let cache_file = get_cache_dir()?.join(filename);

    if cache_file.exists() {
        fs::remove_file(&cache_file)
            .with_context(|| format!("failed to remove cache file: {}", cache_file.display()))?;
        tracing::debug!("cleared cache file {}", cache_file.display());
    }

    Ok(())
}

/// Write the catalog snapshot to cache
pub fn write_snapshot(snapshot: &CatalogSnapshot) -> Result<()> {
    write_cache(CATALOG_SNAPSHOT_FILE, snapshot)
}

/// Read the catalog snapshot from cache
pub fn read_snapshot() -> Result<Option<CatalogSnapshot>> {
    read_cache(CATALOG_SNAPSHOT_FILE)
}

/// Clear the catalog snapshot
pub fn clear_snapshot() -> Result<()> {
    clear_cache(CATALOG_SNAPSHOT_FILE)
}
