// Remote event service
// Trait seam over the Event Service plus the wire types it exchanges

mod http;
mod memory;

pub use http::HttpEventService;
pub use memory::InMemoryEventService;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::event::{CalendarEvent, EventSource};
use crate::utils::date::{format_hhmm, local_instant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("event not found")]
    NotFound,
    #[error("event service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response from event service: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound)
    }
}

/// Create/update body in the canonical wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEvent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_all_day: bool,
    pub color: String,
    pub source: EventSource,
}

impl From<&CalendarEvent> for OutboundEvent {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date,
            start_time: event.start_time.map(format_hhmm),
            end_time: event.end_time.map(format_hhmm),
            end_date: event.end_date,
            is_all_day: event.is_all_day,
            color: event.color.clone(),
            source: event.source,
        }
    }
}

/// PATCH body. Moves and resizes of timed single-day events only send the new
/// instants; everything else sends the full event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPatch {
    Times { start_time: String, end_time: String },
    Full(OutboundEvent),
}

impl EventPatch {
    /// Patch carrying only the (RFC 3339) start and end of a timed event.
    pub fn times_of(event: &CalendarEvent) -> Self {
        match (event.start_time, event.end_time) {
            (Some(start), Some(end)) if !event.is_all_day && !event.is_multi_day() => EventPatch::Times {
                start_time: local_instant(event.date, start).to_rfc3339(),
                end_time: local_instant(event.date, end).to_rfc3339(),
            },
            _ => Self::full(event),
        }
    }

    pub fn full(event: &CalendarEvent) -> Self {
        EventPatch::Full(OutboundEvent::from(event))
    }
}

/// Remote CRUD by calendar id. Implementations block; callers run them off
/// the UI thread.
#[cfg_attr(test, mockall::automock)]
pub trait EventService: Send + Sync {
    /// Raw event payloads; decoding is the normalizer's job.
    fn list_events(&self, calendar_id: &str) -> Result<Vec<serde_json::Value>, RemoteError>;

    /// Returns the server-assigned id.
    fn create_event(&self, calendar_id: &str, event: &OutboundEvent) -> Result<String, RemoteError>;

    fn update_event(
        &self,
        calendar_id: &str,
        server_id: &str,
        patch: &EventPatch,
    ) -> Result<(), RemoteError>;

    /// Idempotent. A missing event is reported as [`RemoteError::NotFound`].
    fn delete_event(&self, calendar_id: &str, server_id: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::hm;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 17).unwrap()
    }

    #[test]
    fn test_outbound_uses_camel_case_hhmm() {
        let event = CalendarEvent::timed("Sync", date(), hm(9, 0), hm(10, 30));
        let json = serde_json::to_value(OutboundEvent::from(&event)).unwrap();

        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "10:30");
        assert_eq!(json["isAllDay"], false);
        assert!(json.get("endDate").is_none());
    }

    #[test]
    fn test_times_patch_for_timed_event() {
        let event = CalendarEvent::timed("Sync", date(), hm(9, 0), hm(10, 30));
        let json = serde_json::to_value(EventPatch::times_of(&event)).unwrap();

        let start = json["start_time"].as_str().unwrap();
        assert!(start.starts_with("2025-06-17T09:00:00"));
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_all_day_patch_is_full() {
        let event = CalendarEvent::all_day("Holiday", date(), None);
        assert!(matches!(EventPatch::times_of(&event), EventPatch::Full(_)));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(RemoteError::NotFound.is_not_found());
        assert!(!RemoteError::Transport("reset".into()).is_not_found());
    }
}
