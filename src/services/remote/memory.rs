use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde_json::{json, Value};

use super::{EventPatch, EventService, OutboundEvent, RemoteError};
use crate::utils::date::format_hhmm;

/// Event Service kept in process memory. Backs the offline demo and the
/// integration tests; every call is counted and the whole service can be
/// switched offline to simulate network failures.
#[derive(Default)]
pub struct InMemoryEventService {
    calendars: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl InMemoryEventService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw payload as if another client had created it. The payload
    /// keeps whatever shape it was given; `id` is required.
    pub fn seed(&self, calendar_id: &str, payload: Value) {
        let Some(id) = payload.get("id").map(|id| match id {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }) else {
            log::warn!("Ignoring seeded event without id");
            return;
        };
        if let Ok(mut calendars) = self.calendars.lock() {
            calendars
                .entry(calendar_id.to_string())
                .or_default()
                .insert(id, payload);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Ids passed to `delete_event`, in call order, including misses.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn contains(&self, calendar_id: &str, server_id: &str) -> bool {
        self.calendars
            .lock()
            .map(|c| c.get(calendar_id).is_some_and(|events| events.contains_key(server_id)))
            .unwrap_or(false)
    }

    pub fn stored(&self, calendar_id: &str, server_id: &str) -> Option<Value> {
        self.calendars
            .lock()
            .ok()?
            .get(calendar_id)?
            .get(server_id)
            .cloned()
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.is_offline() {
            Err(RemoteError::Transport("event service unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_calendar<T>(
        &self,
        calendar_id: &str,
        f: impl FnOnce(&mut BTreeMap<String, Value>) -> T,
    ) -> Result<T, RemoteError> {
        let mut calendars = self
            .calendars
            .lock()
            .map_err(|_| RemoteError::Transport("event store poisoned".to_string()))?;
        Ok(f(calendars.entry(calendar_id.to_string()).or_default()))
    }
}

fn apply_times(stored: &mut Value, start: &str, end: &str) -> Result<(), RemoteError> {
    let parse = |text: &str| {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|err| RemoteError::Status {
                code: 400,
                body: format!("invalid instant {}: {}", text, err),
            })
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if let Value::Object(fields) = stored {
        fields.insert("date".into(), json!(start.date_naive()));
        fields.insert("startTime".into(), json!(format_hhmm(start.time())));
        fields.insert("endTime".into(), json!(format_hhmm(end.time())));
    }
    Ok(())
}

impl EventService for InMemoryEventService {
    fn list_events(&self, calendar_id: &str) -> Result<Vec<Value>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.with_calendar(calendar_id, |events| events.values().cloned().collect())
    }

    fn create_event(&self, calendar_id: &str, event: &OutboundEvent) -> Result<String, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut payload =
            serde_json::to_value(event).map_err(|err| RemoteError::Decode(err.to_string()))?;
        if let Value::Object(fields) = &mut payload {
            fields.insert("id".into(), json!(id));
        }
        self.with_calendar(calendar_id, |events| events.insert(id.clone(), payload))?;
        Ok(id)
    }

    fn update_event(
        &self,
        calendar_id: &str,
        server_id: &str,
        patch: &EventPatch,
    ) -> Result<(), RemoteError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.with_calendar(calendar_id, |events| {
            let stored = events.get_mut(server_id).ok_or(RemoteError::NotFound)?;
            match patch {
                EventPatch::Times {
                    start_time,
                    end_time,
                } => apply_times(stored, start_time, end_time),
                EventPatch::Full(outbound) => {
                    let mut payload = serde_json::to_value(outbound)
                        .map_err(|err| RemoteError::Decode(err.to_string()))?;
                    if let Value::Object(fields) = &mut payload {
                        fields.insert("id".into(), json!(server_id));
                    }
                    *stored = payload;
                    Ok(())
                }
            }
        })?
    }

    fn delete_event(&self, calendar_id: &str, server_id: &str) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(server_id.to_string());
        }
        self.check_online()?;
        self.with_calendar(calendar_id, |events| events.remove(server_id))?
            .map(|_| ())
            .ok_or(RemoteError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::CalendarEvent;
    use crate::utils::date::hm;
    use chrono::NaiveDate;

    fn event() -> CalendarEvent {
        let date = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        CalendarEvent::timed("Review", date, hm(9, 0), hm(10, 0))
    }

    #[test]
    fn test_create_then_list() {
        let service = InMemoryEventService::new();
        let id = service
            .create_event("primary", &OutboundEvent::from(&event()))
            .unwrap();

        let listed = service.list_events("primary").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], id.as_str());
        assert!(service.list_events("other").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let service = InMemoryEventService::new();
        assert_eq!(
            service.delete_event("primary", "srv-404"),
            Err(RemoteError::NotFound)
        );
        assert_eq!(service.delete_calls(), 1);
        assert_eq!(service.deleted_ids(), vec!["srv-404".to_string()]);
    }

    #[test]
    fn test_offline_fails_with_transport_error() {
        let service = InMemoryEventService::new();
        service.set_offline(true);
        let result = service.create_event("primary", &OutboundEvent::from(&event()));
        assert!(matches!(result, Err(RemoteError::Transport(_))));
        assert_eq!(service.create_calls(), 1);
    }

    #[test]
    fn test_times_patch_rewrites_canonical_fields() {
        let service = InMemoryEventService::new();
        let id = service
            .create_event("primary", &OutboundEvent::from(&event()))
            .unwrap();

        let mut moved = event();
        moved.start_time = Some(hm(13, 0));
        moved.end_time = Some(hm(14, 0));
        service
            .update_event("primary", &id, &EventPatch::times_of(&moved))
            .unwrap();

        let stored = service.stored("primary", &id).unwrap();
        assert_eq!(stored["startTime"], "13:00");
        assert_eq!(stored["endTime"], "14:00");
        assert_eq!(stored["title"], "Review");
    }
}
