// Trash module
// Soft-deleted events and the permanent-deletion tombstone list

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::CalendarEvent;

/// Default number of days a tombstone suppresses a resurrected id.
pub const TOMBSTONE_RETENTION_DAYS: i64 = 30;

/// An event sitting in the trash view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashEntry {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub trashed_at: DateTime<Utc>,
}

impl TrashEntry {
    pub fn new(event: CalendarEvent, trashed_at: DateTime<Utc>) -> Self {
        Self { event, trashed_at }
    }

    pub fn id(&self) -> &str {
        &self.event.id
    }

    /// Drops the trash-only metadata.
    pub fn into_event(self) -> CalendarEvent {
        self.event
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub id: String,
    /// Epoch milliseconds of the permanent deletion.
    pub deleted_at: i64,
}

/// Ids that were permanently deleted and must never be re-materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TombstoneSet {
    entries: Vec<Tombstone>,
    /// Epoch milliseconds of the last retention sweep.
    #[serde(default)]
    last_cleanup: Option<i64>,
    #[serde(skip)]
    index: HashSet<String>,
}

impl TombstoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the lookup index after deserialization.
    pub fn reindexed(mut self) -> Self {
        self.index = self.entries.iter().map(|t| t.id.clone()).collect();
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Records `id` as permanently deleted. Returns false if it already was.
    pub fn insert(&mut self, id: impl Into<String>, at: DateTime<Utc>) -> bool {
        let id = id.into();
        if !self.index.insert(id.clone()) {
            return false;
        }
        self.entries.push(Tombstone {
            id,
            deleted_at: at.timestamp_millis(),
        });
        true
    }

    /// True when the event's local id or its server id is tombstoned.
    pub fn suppresses(&self, event: &CalendarEvent) -> bool {
        self.contains(&event.id)
            || event
                .server_id
                .as_deref()
                .is_some_and(|server_id| self.contains(server_id))
    }

    /// Drops tombstones older than `retention_days` and stamps the sweep time.
    /// Returns the number of purged entries.
    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention_days: i64) -> usize {
        let cutoff = (now - Duration::days(retention_days)).timestamp_millis();
        let before = self.entries.len();
        self.entries.retain(|t| t.deleted_at >= cutoff);
        let purged = before - self.entries.len();
        if purged > 0 {
            self.index = self.entries.iter().map(|t| t.id.clone()).collect();
        }
        self.last_cleanup = Some(now.timestamp_millis());
        purged
    }

    pub fn last_cleanup(&self) -> Option<i64> {
        self.last_cleanup
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Tombstone] {
        &self.entries
    }
}
