//! File-based booking meta storage
//!
//! Rows are cached in memory and written through to a JSON file on every
//! change. Writes replace: one row per (booking_id, meta_key). A change whose
//! file write fails is rolled back out of the cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use super::model::{MetaEntry, MetaKey};
use crate::{Error, Result};

type RowKey = (i64, String);

/// Thread-safe meta store with file persistence
#[derive(Clone)]
pub struct FileMetaStore {
    rows: Arc<RwLock<HashMap<RowKey, MetaEntry>>>,
    file_path: PathBuf,
}

impl FileMetaStore {
    /// Create a new FileMetaStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        let rows = if file_path.exists() {
            let content = tokio::fs::read_to_string(&file_path)
                .await
                .map_err(|e| Error::Storage(format!("Failed to read meta file: {}", e)))?;
            let entries: Vec<MetaEntry> = serde_json::from_str(&content)
                .map_err(|e| Error::Storage(format!("Failed to parse meta file: {}", e)))?;
            entries
                .into_iter()
                .map(|entry| ((entry.booking_id, entry.meta_key.clone()), entry))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            rows: Arc::new(RwLock::new(rows)),
            file_path,
        })
    }

    pub async fn get(&self, booking_id: i64, key: MetaKey) -> Option<MetaEntry> {
        let rows = self.rows.read().await;
        rows.get(&(booking_id, key.as_key())).cloned()
    }

    /// Read a row and decode its value. Undecodable rows read as absent.
    pub async fn get_value<T: DeserializeOwned>(&self, booking_id: i64, key: MetaKey) -> Option<T> {
        let entry = self.get(booking_id, key).await?;
        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(booking_id, key = %key, "Ignoring undecodable meta value: {}", err);
                None
            }
        }
    }

    pub async fn contains(&self, booking_id: i64, key: MetaKey) -> bool {
        let rows = self.rows.read().await;
        rows.contains_key(&(booking_id, key.as_key()))
    }

    /// Insert or replace a row
    ///
    /// The cache only keeps the change once it is on disk.
    pub async fn replace<T: Serialize>(
        &self,
        booking_id: i64,
        key: MetaKey,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<MetaEntry> {
        let value = serde_json::to_value(value)?;
        let entry = MetaEntry {
            booking_id,
            meta_key: key.as_key(),
            value,
            created_at: now,
            updated_at: now,
        };
        let row_key = (booking_id, entry.meta_key.clone());

        let mut rows = self.rows.write().await;
        let previous = rows.insert(row_key.clone(), entry.clone());
        if let Err(err) = self.persist(&rows).await {
            match previous {
                Some(previous) => rows.insert(row_key, previous),
                None => rows.remove(&row_key),
            };
            return Err(err);
        }
        Ok(entry)
    }

    /// Remove a row; `false` when there was nothing to remove
    pub async fn delete(&self, booking_id: i64, key: MetaKey) -> Result<bool> {
        let row_key = (booking_id, key.as_key());
        let mut rows = self.rows.write().await;
        let Some(removed) = rows.remove(&row_key) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&rows).await {
            rows.insert(row_key, removed);
            return Err(err);
        }
        Ok(true)
    }

    /// Remove every row of a booking whose key starts with `prefix`
    pub async fn delete_prefixed(&self, booking_id: i64, prefix: &str) -> Result<usize> {
        let mut rows = self.rows.write().await;
        let doomed: Vec<RowKey> = rows
            .keys()
            .filter(|(row_booking, row_key)| {
                *row_booking == booking_id && row_key.starts_with(prefix)
            })
            .cloned()
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }
        let removed: Vec<(RowKey, MetaEntry)> = doomed
            .into_iter()
            .filter_map(|row_key| rows.remove(&row_key).map(|entry| (row_key, entry)))
            .collect();
        if let Err(err) = self.persist(&rows).await {
            rows.extend(removed);
            return Err(err);
        }
        Ok(removed.len())
    }

    /// All rows, across bookings, whose key starts with `prefix`
    pub async fn scan_prefixed(&self, prefix: &str) -> Vec<MetaEntry> {
        let rows = self.rows.read().await;
        let mut entries: Vec<MetaEntry> = rows
            .values()
            .filter(|entry| entry.meta_key.starts_with(prefix))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.booking_id
                .cmp(&b.booking_id)
                .then_with(|| a.meta_key.cmp(&b.meta_key))
        });
        entries
    }

    pub async fn list_for_booking(&self, booking_id: i64) -> Vec<MetaEntry> {
        let rows = self.rows.read().await;
        let mut entries: Vec<MetaEntry> = rows
            .values()
            .filter(|entry| entry.booking_id == booking_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.meta_key.cmp(&b.meta_key));
        entries
    }

    /// Persist the cache to disk
    ///
    /// Callers hold the write guard across the write, so snapshots reach the
    /// file in the order they were taken.
    async fn persist(&self, rows: &HashMap<RowKey, MetaEntry>) -> Result<()> {
        let mut entries: Vec<&MetaEntry> = rows.values().collect();
        entries.sort_by(|a, b| {
            a.booking_id
                .cmp(&b.booking_id)
                .then_with(|| a.meta_key.cmp(&b.meta_key))
        });
        let content = serde_json::to_string_pretty(&entries)?;

        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create meta directory: {}", e)))?;
        }

        tokio::fs::write(&self.file_path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write meta file: {}", e)))?;
        Ok(())
    }
}
