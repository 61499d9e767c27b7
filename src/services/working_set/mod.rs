// Working set service
// Active events plus the bookkeeping for optimistic remote writes

use std::collections::{HashMap, HashSet};

use crate::models::event::{CalendarEvent, Mutation};
use crate::models::trash::TombstoneSet;
use crate::services::remote::RemoteError;

/// An update that has been applied locally and sent to the Event Service.
#[derive(Debug, Clone)]
struct PendingUpdate {
    seq: u64,
    /// Last state before the first of the in-flight edits.
    previous: CalendarEvent,
    rollback_on_failure: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResolution {
    Committed,
    /// The remote write failed and the event went back to `previous`.
    RolledBack { title: String, error: RemoteError },
    /// The remote write failed; the local edit stays, flagged as failed.
    KeptLocal { title: String, error: RemoteError },
    /// A newer edit is in flight; this result is ignored.
    Stale,
    /// The event left the working set in the meantime.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateResolution {
    Committed { server_id: String },
    Failed { title: String, error: RemoteError },
    /// The event is no longer active (trashed or purged since).
    NotActive,
}

/// Active events in insertion order.
#[derive(Debug, Default)]
pub struct WorkingSet {
    events: Vec<CalendarEvent>,
    pending: HashMap<String, PendingUpdate>,
    next_seq: u64,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<CalendarEvent>) -> Self {
        let mut set = Self::new();
        for event in events {
            set.upsert(event);
        }
        set
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Inserts `event`, replacing any event with the same id. Returns the
    /// replaced event.
    pub fn upsert(&mut self, event: CalendarEvent) -> Option<CalendarEvent> {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => Some(std::mem::replace(slot, event)),
            None => {
                self.events.push(event);
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<CalendarEvent> {
        let index = self.events.iter().position(|e| e.id == id)?;
        self.pending.remove(id);
        Some(self.events.remove(index))
    }

    pub fn has_pending_update(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Applies `updated` locally and, for server-backed events, records the
    /// write so its result can be reconciled. Returns the sequence number to
    /// send along, or `None` when there is nothing to send (unknown id or a
    /// client-only event).
    pub fn apply_update(&mut self, mut updated: CalendarEvent, rollback_on_failure: bool) -> Option<u64> {
        let previous = self.get(&updated.id)?.clone();
        if !previous.is_server_backed() {
            self.upsert(updated);
            return None;
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        let previous = self
            .pending
            .remove(&updated.id)
            .map(|p| p.previous)
            .unwrap_or(previous);
        updated.mutation = Mutation::Pending;
        self.pending.insert(
            updated.id.clone(),
            PendingUpdate {
                seq,
                previous,
                rollback_on_failure,
            },
        );
        self.upsert(updated);
        Some(seq)
    }

    pub fn resolve_update(&mut self, id: &str, seq: u64, result: Result<(), RemoteError>) -> UpdateResolution {
        let Some(pending) = self.pending.get(id) else {
            return if self.contains(id) {
                UpdateResolution::Stale
            } else {
                UpdateResolution::Unknown
            };
        };
        if pending.seq != seq {
            return UpdateResolution::Stale;
        }
        let Some(pending) = self.pending.remove(id) else {
            return UpdateResolution::Unknown;
        };
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            return UpdateResolution::Unknown;
        };

        match result {
            Ok(()) => {
                if let Some(server_id) = event.server_id.clone() {
                    event.mutation = Mutation::Committed(server_id);
                }
                UpdateResolution::Committed
            }
            Err(error) if pending.rollback_on_failure => {
                let title = event.title.clone();
                *event = pending.previous;
                UpdateResolution::RolledBack { title, error }
            }
            Err(error) => {
                event.mutation = Mutation::Failed(error.to_string());
                UpdateResolution::KeptLocal {
                    title: event.title.clone(),
                    error,
                }
            }
        }
    }

    /// Reconciles a create result onto the still-active event. A remote copy
    /// of the same event picked up by a fetch in the meantime is dropped.
    pub fn resolve_create(&mut self, local_id: &str, result: Result<String, RemoteError>) -> CreateResolution {
        if !self.contains(local_id) {
            return CreateResolution::NotActive;
        }
        match result {
            Ok(server_id) => {
                if server_id != local_id {
                    self.events.retain(|e| e.id != server_id);
                }
                if let Some(event) = self.events.iter_mut().find(|e| e.id == local_id) {
                    event.server_id = Some(server_id.clone());
                    event.mutation = Mutation::Committed(server_id.clone());
                }
                CreateResolution::Committed { server_id }
            }
            Err(error) => {
                let mut title = String::new();
                if let Some(event) = self.events.iter_mut().find(|e| e.id == local_id) {
                    event.mutation = Mutation::Failed(error.to_string());
                    title = event.title.clone();
                }
                CreateResolution::Failed { title, error }
            }
        }
    }

    /// Replaces the set with a fresh remote listing. Tombstoned and trashed
    /// events are filtered out; client-only events and events with an edit
    /// in flight keep their local version.
    pub fn replace_with_remote(
        &mut self,
        remote: Vec<CalendarEvent>,
        tombstones: &TombstoneSet,
        trashed_ids: &HashSet<String>,
    ) {
        let kept: Vec<CalendarEvent> = self
            .events
            .drain(..)
            .filter(|e| !e.is_server_backed() || self.pending.contains_key(&e.id))
            .collect();
        let claimed: HashSet<String> = kept
            .iter()
            .flat_map(|e| std::iter::once(e.id.clone()).chain(e.server_id.clone()))
            .collect();

        let before = remote.len();
        let fresh: Vec<CalendarEvent> = remote
            .into_iter()
            .filter(|e| !tombstones.suppresses(e))
            .filter(|e| !trashed_ids.contains(&e.id))
            .filter(|e| !e.server_id.as_ref().is_some_and(|s| trashed_ids.contains(s)))
            .filter(|e| !claimed.contains(&e.id))
            .collect();
        if fresh.len() < before {
            log::debug!(
                "Dropped {} remote events (tombstoned, trashed or edited locally)",
                before - fresh.len()
            );
        }

        self.events = fresh;
        for event in kept {
            self.upsert(event);
        }
    }
}
