// Local store service
// Client-side cache of the working set, the trash and the tombstones

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::event::CalendarEvent;
use crate::models::trash::{TombstoneSet, TrashEntry};
use crate::services::database::Database;

pub const EVENTS_KEY: &str = "calendar_events";
pub const TRASH_KEY: &str = "calendar_trash";
pub const TOMBSTONES_KEY: &str = "calendar_tombstones";

/// JSON documents keyed by collection name in the `kv_store` table.
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn new(db: Database) -> Result<Self> {
        db.initialize_schema()?;
        Ok(Self { db })
    }

    /// Opens the cache file at `path`, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(Database::open(path)?)
    }

    /// Throwaway cache for tests and the offline demo.
    pub fn in_memory() -> Result<Self> {
        Self::new(Database::new(":memory:")?)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read '{}' from cache", key))?;

        raw.map(|text| {
            serde_json::from_str(&text)
                .with_context(|| format!("failed to deserialize '{}' from cache", key))
        })
        .transpose()
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)
            .with_context(|| format!("failed to serialize '{}'", key))?;
        self.db
            .connection()
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
                params![key, text],
            )
            .with_context(|| format!("Failed to write '{}' to cache", key))?;
        Ok(())
    }

    pub fn load_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.get_json(EVENTS_KEY)?.unwrap_or_default())
    }

    pub fn save_events(&self, events: &[CalendarEvent]) -> Result<()> {
        self.put_json(EVENTS_KEY, events)
    }

    pub fn load_trash(&self) -> Result<Vec<TrashEntry>> {
        Ok(self.get_json(TRASH_KEY)?.unwrap_or_default())
    }

    pub fn save_trash(&self, entries: &[TrashEntry]) -> Result<()> {
        self.put_json(TRASH_KEY, entries)
    }

    pub fn load_tombstones(&self) -> Result<TombstoneSet> {
        Ok(self
            .get_json::<TombstoneSet>(TOMBSTONES_KEY)?
            .unwrap_or_default()
            .reindexed())
    }

    pub fn save_tombstones(&self, tombstones: &TombstoneSet) -> Result<()> {
        self.put_json(TOMBSTONES_KEY, tombstones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::hm;
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    fn sample_event(title: &str) -> CalendarEvent {
        let date = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        CalendarEvent::timed(title, date, hm(9, 0), hm(10, 0))
    }

    #[test]
    fn test_empty_store_loads_defaults() {
        let store = LocalStore::in_memory().unwrap();
        assert!(store.load_events().unwrap().is_empty());
        assert!(store.load_trash().unwrap().is_empty());
        assert!(store.load_tombstones().unwrap().is_empty());
    }

    #[test]
    fn test_events_overwrite_previous_snapshot() {
        let store = LocalStore::in_memory().unwrap();
        let first = vec![sample_event("One"), sample_event("Two")];
        store.save_events(&first).unwrap();
        let second = vec![sample_event("Three")];
        store.save_events(&second).unwrap();

        assert_eq!(store.load_events().unwrap(), second);
    }

    #[test]
    fn test_trash_and_tombstones_persist_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let entry = TrashEntry::new(sample_event("Gone"), Utc::now());

        {
            let store = LocalStore::open(&path).unwrap();
            store.save_trash(std::slice::from_ref(&entry)).unwrap();
            let mut tombstones = TombstoneSet::new();
            tombstones.insert("srv-1", Utc::now());
            store.save_tombstones(&tombstones).unwrap();
        }

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.load_trash().unwrap(), vec![entry]);
        assert!(reopened.load_tombstones().unwrap().contains("srv-1"));
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let store = LocalStore::in_memory().unwrap();
        store.put_json(EVENTS_KEY, "not a list").unwrap();
        assert!(store.load_events().is_err());
    }
}
