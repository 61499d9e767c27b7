// Trash service
// Soft-deleted events, restore with rescheduling, and permanent deletion

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::event::{CalendarEvent, Mutation};
use crate::models::trash::{TombstoneSet, TrashEntry};

/// What emptying the trash produced: the removed entries and the server ids
/// that still need a remote delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmptiedTrash {
    pub removed: Vec<TrashEntry>,
    pub server_ids: Vec<String>,
}

/// Trashed events plus the tombstones of permanently deleted ones. Every id
/// lives in at most one of the two.
#[derive(Debug, Clone, Default)]
pub struct TrashBin {
    entries: Vec<TrashEntry>,
    tombstones: TombstoneSet,
}

impl TrashBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(entries: Vec<TrashEntry>, tombstones: TombstoneSet) -> Self {
        let mut bin = Self {
            entries: Vec::with_capacity(entries.len()),
            tombstones,
        };
        for entry in entries {
            if bin.tombstones.suppresses(&entry.event) || bin.contains(entry.id()) {
                log::debug!("Dropping cached trash entry {}", entry.id());
                continue;
            }
            bin.entries.push(entry);
        }
        bin
    }

    pub fn entries(&self) -> &[TrashEntry] {
        &self.entries
    }

    pub fn tombstones(&self) -> &TombstoneSet {
        &self.tombstones
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TrashEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Local and server ids of everything in the trash.
    pub fn trashed_ids(&self) -> HashSet<String> {
        self.entries
            .iter()
            .flat_map(|e| std::iter::once(e.event.id.clone()).chain(e.event.server_id.clone()))
            .collect()
    }

    pub fn is_tombstoned(&self, id: &str) -> bool {
        self.tombstones.contains(id)
    }

    /// True when the event must not be shown: it is tombstoned or trashed.
    pub fn hides(&self, event: &CalendarEvent) -> bool {
        self.tombstones.suppresses(event) || self.contains(&event.id)
    }

    /// Adds `event` to the trash. Returns false for stale ids (already
    /// trashed or tombstoned).
    pub fn add(&mut self, event: CalendarEvent, now: DateTime<Utc>) -> bool {
        if self.tombstones.suppresses(&event) || self.contains(&event.id) {
            return false;
        }
        self.entries.push(TrashEntry::new(event, now));
        true
    }

    /// Takes an entry out and rewrites it to start at `date` / `start_minutes`
    /// with its duration preserved; all-day entries stay all-day. A restored
    /// entry whose remote copy was deleted on trashing loses its server id and
    /// comes back pending, so the caller recreates it remotely.
    pub fn restore(&mut self, id: &str, date: NaiveDate, start_minutes: u32) -> Option<CalendarEvent> {
        let index = self.entries.iter().position(|e| e.id() == id)?;
        let mut event = self.entries.remove(index).into_event().moved_to(date, start_minutes);
        if event.server_id.take().is_some() {
            event.mutation = Mutation::Pending;
        }
        Some(event)
    }

    /// Records the server id of an event whose create finished after it was
    /// trashed. Returns false if the entry is gone.
    pub fn set_server_id(&mut self, id: &str, server_id: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id() == id) {
            Some(entry) => {
                entry.event.server_id = Some(server_id.to_string());
                entry.event.mutation = Mutation::Committed(server_id.to_string());
                true
            }
            None => false,
        }
    }

    pub fn tombstone(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.tombstones.insert(id, now)
    }

    /// Tombstones every entry (by id and server id) and clears the trash.
    pub fn empty(&mut self, now: DateTime<Utc>) -> EmptiedTrash {
        let removed: Vec<TrashEntry> = self.entries.drain(..).collect();
        let mut server_ids = Vec::new();
        for entry in &removed {
            self.tombstones.insert(entry.event.id.clone(), now);
            if let Some(server_id) = &entry.event.server_id {
                self.tombstones.insert(server_id.clone(), now);
                server_ids.push(server_id.clone());
            }
        }
        EmptiedTrash {
            removed,
            server_ids,
        }
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention_days: i64) -> usize {
        self.tombstones.purge_expired(now, retention_days)
    }
}
