// Event module
// Canonical calendar event shared by the grid, the trash and the sync layer

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, NaiveTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::date::{minutes_of, time_from_minutes, LAST_MINUTE};

/// Shortest duration a resize can leave an event with.
pub const MIN_EVENT_MINUTES: u32 = 15;

/// Colours handed out to events created without one.
pub const EVENT_PALETTE: [&str; 8] = [
    "#4A90D9", "#E67E22", "#27AE60", "#8E44AD", "#E74C3C", "#16A085", "#D35400", "#2C3E50",
];

static LOCAL_ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Where an event originated. Only the display colour depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Native,
    Google,
    Outlook,
    Apple,
}

impl EventSource {
    /// Maps a remote platform tag onto a source; unknown tags count as native.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "google" | "gcal" | "google_calendar" => EventSource::Google,
            "outlook" | "microsoft" | "office365" => EventSource::Outlook,
            "apple" | "icloud" => EventSource::Apple,
            _ => EventSource::Native,
        }
    }

    /// Fixed colour for imported platforms, `None` for native events.
    pub fn platform_color(&self) -> Option<&'static str> {
        match self {
            EventSource::Native => None,
            EventSource::Google => Some("#4285F4"),
            EventSource::Outlook => Some("#0078D4"),
            EventSource::Apple => Some("#A2AAAD"),
        }
    }
}

/// Remote bookkeeping attached to every event. Rendering keys off this value
/// rather than off the timing of callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum Mutation {
    /// A remote write is in flight, or the event has never been persisted.
    Pending,
    /// The Event Service acknowledged the latest write.
    Committed(String),
    /// The latest remote write failed; the local copy is authoritative.
    Failed(String),
}

impl Default for Mutation {
    fn default() -> Self {
        Mutation::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Event title cannot be empty")]
    EmptyTitle,
    #[error("Event date is required")]
    MissingDate,
    #[error("Start and end times are required for timed events")]
    MissingTimes,
    #[error("Event end time must be after start time")]
    EndBeforeStart,
    #[error("Event end date must not precede its start date")]
    EndDateBeforeStart,
    #[error("Color must be in hex format (#RRGGBB or #RGB)")]
    InvalidColor,
}

/// Canonical in-memory event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default, with = "hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub color: String,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default)]
    pub mutation: Mutation,
}

impl CalendarEvent {
    /// Creates a timed single-day event with a fresh local id.
    pub fn timed(
        title: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            id: generate_local_id(),
            server_id: None,
            title: title.into(),
            description: None,
            date,
            start_time: Some(start),
            end_time: Some(end),
            is_all_day: false,
            end_date: None,
            color: pick_color(),
            source: EventSource::Native,
            mutation: Mutation::Pending,
        }
    }

    /// Creates an all-day event spanning `date..=end_date`.
    pub fn all_day(title: impl Into<String>, date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            id: generate_local_id(),
            server_id: None,
            title: title.into(),
            description: None,
            date,
            start_time: None,
            end_time: None,
            is_all_day: true,
            end_date: end_date.filter(|end| *end != date),
            color: pick_color(),
            source: EventSource::Native,
            mutation: Mutation::Pending,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn is_multi_day(&self) -> bool {
        self.end_date.is_some_and(|end| end != self.date)
    }

    /// Last calendar date covered by the event.
    pub fn last_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.date)
    }

    pub fn is_server_backed(&self) -> bool {
        self.server_id.is_some()
    }

    pub fn start_minutes(&self) -> Option<u32> {
        self.start_time.map(minutes_of)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        self.end_time.map(minutes_of)
    }

    /// Same-day duration in minutes; zero for all-day events or missing times.
    pub fn duration_minutes(&self) -> u32 {
        match (self.start_minutes(), self.end_minutes()) {
            (Some(start), Some(end)) if !self.is_multi_day() => end.saturating_sub(start),
            _ => 0,
        }
    }

    /// Colour used on the grid: platform colour for imported events.
    pub fn display_color(&self) -> &str {
        self.source.platform_color().unwrap_or(&self.color)
    }

    /// Copy of the event moved to start at `date` / `start_minutes`, keeping
    /// its duration. Single-day events are kept inside the day by clamping the
    /// start; all-day and multi-day events shift their end date along.
    pub fn moved_to(&self, date: NaiveDate, start_minutes: u32) -> CalendarEvent {
        let mut moved = self.clone();
        let day_shift = date - self.date;
        moved.date = date;

        if self.is_all_day || self.start_time.is_none() {
            moved.end_date = self.end_date.map(|end| end + day_shift);
            return moved;
        }

        if self.is_multi_day() {
            let (Some(start), Some(end), Some(end_date)) = (self.start_time, self.end_time, self.end_date)
            else {
                return moved;
            };
            let span = end_date.and_time(end) - self.date.and_time(start);
            let new_start = date.and_time(time_from_minutes(start_minutes));
            let new_end = new_start + span;
            moved.start_time = Some(new_start.time());
            moved.end_time = Some(new_end.time());
            moved.end_date = Some(new_end.date()).filter(|end| *end != date);
            return moved;
        }

        let duration = self.duration_minutes().min(LAST_MINUTE);
        let start = start_minutes.min(LAST_MINUTE - duration);
        moved.start_time = Some(time_from_minutes(start));
        moved.end_time = Some(time_from_minutes(start + duration));
        moved
    }

    /// Copy with a new end time for single-day timed events, floored at the
    /// minimum duration and capped at 23:59. Other events come back unchanged.
    pub fn resized_to(&self, end_minutes: u32) -> CalendarEvent {
        let mut resized = self.clone();
        if self.is_all_day || self.is_multi_day() {
            return resized;
        }
        if let Some(start) = self.start_minutes() {
            let floor = clamp_end_minutes(start + MIN_EVENT_MINUTES);
            let end = clamp_end_minutes(end_minutes.max(floor));
            resized.end_time = Some(time_from_minutes(end));
        }
        resized
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        if let Some(end_date) = self.end_date {
            if end_date < self.date {
                return Err(ValidationError::EndDateBeforeStart);
            }
        }

        if !self.is_all_day {
            let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
                return Err(ValidationError::MissingTimes);
            };
            if !self.is_multi_day() && end <= start {
                return Err(ValidationError::EndBeforeStart);
            }
        }

        if !is_hex_color(&self.color) {
            return Err(ValidationError::InvalidColor);
        }

        Ok(())
    }
}

/// Values collected by the authoring form before they become an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    /// Set when editing an existing event.
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_all_day: bool,
    pub color: Option<String>,
}

impl EventDraft {
    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            id: Some(event.id.clone()),
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            date: Some(event.date),
            end_date: event.end_date,
            start_time: event.start_time,
            end_time: event.end_time,
            is_all_day: event.is_all_day,
            color: Some(event.color.clone()),
        }
    }

    /// Validates the draft and produces a new client-only event.
    pub fn into_event(self) -> Result<CalendarEvent, ValidationError> {
        let mut event = CalendarEvent {
            id: generate_local_id(),
            server_id: None,
            title: String::new(),
            description: None,
            date: NaiveDate::default(),
            start_time: None,
            end_time: None,
            is_all_day: false,
            end_date: None,
            color: pick_color(),
            source: EventSource::Native,
            mutation: Mutation::Pending,
        };
        self.apply_to(&mut event)?;
        Ok(event)
    }

    /// Copies the draft onto `event` after validating it; `event` is left
    /// untouched when validation fails.
    pub fn apply_to(&self, event: &mut CalendarEvent) -> Result<(), ValidationError> {
        let date = self.date.ok_or(ValidationError::MissingDate)?;
        let mut updated = event.clone();
        updated.title = self.title.trim().to_string();
        updated.description = Some(self.description.trim().to_string()).filter(|d| !d.is_empty());
        updated.date = date;
        updated.end_date = self.end_date.filter(|end| *end != date);
        updated.is_all_day = self.is_all_day;
        if self.is_all_day {
            updated.start_time = None;
            updated.end_time = None;
        } else {
            updated.start_time = self.start_time;
            updated.end_time = self.end_time;
        }
        if let Some(color) = self.color.as_ref().filter(|c| !c.is_empty()) {
            updated.color = color.clone();
        }
        updated.validate()?;
        *event = updated;
        Ok(())
    }
}

/// Timestamp-based id for events the Event Service has not seen yet.
pub fn generate_local_id() -> String {
    let seq = LOCAL_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("local-{}-{}", Utc::now().timestamp_millis(), seq)
}

/// Random palette colour for a newly created event.
pub fn pick_color() -> String {
    EVENT_PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(EVENT_PALETTE[0])
        .to_string()
}

/// Palette colour derived from `key`, so a remote event without a colour
/// keeps the same one on every fetch.
pub fn color_for_key(key: &str) -> String {
    let hash = key
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    EVENT_PALETTE[hash % EVENT_PALETTE.len()].to_string()
}

pub fn is_hex_color(color: &str) -> bool {
    color.starts_with('#')
        && (color.len() == 7 || color.len() == 4)
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Clamps an end-of-event minute value onto the grid day.
pub fn clamp_end_minutes(minutes: u32) -> u32 {
    minutes.min(LAST_MINUTE)
}

/// `Option<NaiveTime>` as `"HH:MM"`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::utils::date::{format_hhmm, parse_hhmm};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&format_hhmm(*time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => parse_hhmm(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::hm;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    #[test]
    fn test_timed_event_defaults() {
        let event = CalendarEvent::timed("Standup", monday(), hm(9, 0), hm(9, 30));
        assert!(event.id.starts_with("local-"));
        assert!(!event.is_server_backed());
        assert_eq!(event.mutation, Mutation::Pending);
        assert!(EVENT_PALETTE.contains(&event.color.as_str()));
        assert_eq!(event.duration_minutes(), 30);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_palette_colors() {
        for _ in 0..20 {
            assert!(EVENT_PALETTE.contains(&pick_color().as_str()));
        }
        let color = color_for_key("srv-42");
        assert!(EVENT_PALETTE.contains(&color.as_str()));
        assert_eq!(color_for_key("srv-42"), color);
    }

    #[test]
    fn test_local_ids_are_unique() {
        let a = generate_local_id();
        let b = generate_local_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_rejects_inverted_times() {
        let event = CalendarEvent::timed("Broken", monday(), hm(11, 0), hm(10, 0));
        assert_eq!(event.validate(), Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let event = CalendarEvent::timed("   ", monday(), hm(9, 0), hm(10, 0));
        assert_eq!(event.validate(), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_multi_day_allows_earlier_end_time() {
        let mut event = CalendarEvent::timed("Offsite", monday(), hm(14, 0), hm(10, 0));
        event.end_date = Some(monday() + Duration::days(2));
        assert!(event.is_multi_day());
        assert!(event.validate().is_ok());
        assert_eq!(event.duration_minutes(), 0);
    }

    #[test]
    fn test_display_color_prefers_platform() {
        let mut event = CalendarEvent::timed("Sync", monday(), hm(9, 0), hm(10, 0)).with_color("#123456");
        assert_eq!(event.display_color(), "#123456");
        event.source = EventSource::Google;
        assert_eq!(event.display_color(), "#4285F4");
    }

    #[test]
    fn test_source_from_tag() {
        assert_eq!(EventSource::from_tag("Google"), EventSource::Google);
        assert_eq!(EventSource::from_tag("icloud"), EventSource::Apple);
        assert_eq!(EventSource::from_tag("something-else"), EventSource::Native);
    }

    #[test]
    fn test_serialized_times_use_hhmm() {
        let event = CalendarEvent::timed("Lunch", monday(), hm(12, 0), hm(13, 15));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["start_time"], "12:00");
        assert_eq!(json["end_time"], "13:15");

        let back: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_draft_requires_date_and_title() {
        let draft = EventDraft {
            title: "Planning".into(),
            start_time: Some(hm(9, 0)),
            end_time: Some(hm(10, 0)),
            ..EventDraft::default()
        };
        assert_eq!(draft.clone().into_event(), Err(ValidationError::MissingDate));

        let draft = EventDraft { date: Some(monday()), title: " ".into(), ..draft };
        assert_eq!(draft.into_event(), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_draft_apply_keeps_event_on_failure() {
        let mut event = CalendarEvent::timed("Review", monday(), hm(9, 0), hm(10, 0));
        let original = event.clone();
        let mut draft = EventDraft::from_event(&event);
        draft.end_time = Some(hm(8, 0));

        assert_eq!(draft.apply_to(&mut event), Err(ValidationError::EndBeforeStart));
        assert_eq!(event, original);
    }

    #[test]
    fn test_moved_to_preserves_duration() {
        let event = CalendarEvent::timed("Focus", monday(), hm(9, 0), hm(10, 30));
        let moved = event.moved_to(monday() + Duration::days(2), 14 * 60);

        assert_eq!(moved.id, event.id);
        assert_eq!(moved.date, monday() + Duration::days(2));
        assert_eq!(moved.start_time, Some(hm(14, 0)));
        assert_eq!(moved.end_time, Some(hm(15, 30)));
    }

    #[test]
    fn test_moved_to_clamps_inside_day() {
        let event = CalendarEvent::timed("Late", monday(), hm(9, 0), hm(11, 0));
        let moved = event.moved_to(monday(), 23 * 60);

        assert_eq!(moved.duration_minutes(), 120);
        assert_eq!(moved.end_time, Some(hm(23, 59)));
        assert_eq!(moved.start_time, Some(hm(21, 59)));
    }

    #[test]
    fn test_moved_to_shifts_all_day_span() {
        let event = CalendarEvent::all_day("Trip", monday(), Some(monday() + Duration::days(2)));
        let moved = event.moved_to(monday() + Duration::days(1), 10 * 60);

        assert!(moved.is_all_day);
        assert_eq!(moved.start_time, None);
        assert_eq!(moved.end_date, Some(monday() + Duration::days(3)));
    }

    #[test]
    fn test_moved_to_multi_day_timed() {
        let mut event = CalendarEvent::timed("Offsite", monday(), hm(14, 0), hm(10, 0));
        event.end_date = Some(monday() + Duration::days(1));
        let moved = event.moved_to(monday() + Duration::days(2), 16 * 60);

        assert_eq!(moved.start_time, Some(hm(16, 0)));
        assert_eq!(moved.end_time, Some(hm(12, 0)));
        assert_eq!(moved.end_date, Some(monday() + Duration::days(3)));
    }

    #[test]
    fn test_resized_to_floors_and_caps() {
        let event = CalendarEvent::timed("Sync", monday(), hm(9, 0), hm(10, 0));
        assert_eq!(event.resized_to(9 * 60 + 5).end_time, Some(hm(9, 15)));
        assert_eq!(event.resized_to(11 * 60).end_time, Some(hm(11, 0)));
        assert_eq!(event.resized_to(30 * 60).end_time, Some(hm(23, 59)));
    }

    #[test]
    fn test_hex_color_check() {
        assert!(is_hex_color("#FF5733"));
        assert!(is_hex_color("#F57"));
        assert!(!is_hex_color("red"));
        assert!(!is_hex_color("#GGGGGG"));
    }
}
