// Normalization of remote event payloads
// Explicit decoder over the payload shapes the Event Service is known to emit

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::models::event::{color_for_key, is_hex_color, CalendarEvent, EventSource, Mutation, ValidationError};
use crate::utils::date::{hm, minutes_of, parse_hhmm, time_from_minutes, LAST_MINUTE};

const DEFAULT_DURATION_MINUTES: u32 = 60;
const UNTIMED_FIRST_SLOT: u32 = 8 * 60;
const UNTIMED_SLOT_MINUTES: u32 = 30;
const UNTITLED: &str = "Untitled event";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("payload matches no known event shape: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("decoded event is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteId {
    Text(String),
    Number(serde_json::Number),
}

impl RemoteId {
    fn into_string(self) -> String {
        match self {
            RemoteId::Text(text) => text,
            RemoteId::Number(number) => number.to_string(),
        }
    }
}

/// `HH:MM` or `HH:MM:SS`; anything else fails so the next shape is tried.
struct WallTime(NaiveTime);

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_hhmm(&text)
            .map(WallTime)
            .ok_or_else(|| serde::de::Error::custom(format!("not a time of day: {}", text)))
    }
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` read as local time.
struct Moment(DateTime<Local>);

impl<'de> Deserialize<'de> for Moment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(&text) {
            return Ok(Moment(dt.with_timezone(&Local)));
        }
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(Moment)
            .ok_or_else(|| serde::de::Error::custom(format!("not a date-time: {}", text)))
    }
}

/// Timing shapes, tried in priority order.
#[derive(Deserialize)]
#[serde(untagged)]
enum Timing {
    Canonical {
        date: NaiveDate,
        #[serde(default, rename = "startTime", alias = "start_time")]
        start_time: Option<WallTime>,
        #[serde(default, rename = "endTime", alias = "end_time")]
        end_time: Option<WallTime>,
        #[serde(default, rename = "endDate", alias = "end_date")]
        end_date: Option<NaiveDate>,
    },
    Instants {
        start_time: Moment,
        #[serde(default)]
        end_time: Option<Moment>,
    },
    DateTimes {
        start_datetime: Moment,
        #[serde(default)]
        end_datetime: Option<Moment>,
    },
    DateWithWallTimes {
        start_date: NaiveDate,
        #[serde(alias = "startTime")]
        start_time: WallTime,
        #[serde(default, alias = "endTime")]
        end_time: Option<WallTime>,
        #[serde(default, alias = "endDate")]
        end_date: Option<NaiveDate>,
    },
    Dates {
        start_date: NaiveDate,
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
}

#[derive(Deserialize)]
struct RemoteEvent {
    id: RemoteId,
    #[serde(default, alias = "summary", alias = "name")]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, alias = "platform", alias = "provider")]
    source: Option<String>,
    #[serde(default, alias = "all_day", alias = "isAllDay", alias = "allDay")]
    is_all_day: Option<bool>,
    #[serde(flatten)]
    timing: Timing,
}

/// Resolved date/time fields before they are stamped onto an event.
struct Schedule {
    date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    end_date: Option<NaiveDate>,
}

/// Turns raw payloads into canonical events. Holds the counter that spreads
/// untimed canonical events over successive half-hour slots.
#[derive(Debug, Default)]
pub struct Normalizer {
    untimed_seen: u32,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every payload, skipping (and logging) the ones that match no
    /// known shape.
    pub fn normalize_all(&mut self, payloads: Vec<Value>) -> Vec<CalendarEvent> {
        let total = payloads.len();
        let events: Vec<CalendarEvent> = payloads
            .into_iter()
            .filter_map(|payload| match self.normalize(payload) {
                Ok(event) => Some(event),
                Err(err) => {
                    log::warn!("Skipping remote event: {}", err);
                    None
                }
            })
            .collect();
        if events.len() < total {
            log::info!("Normalized {} of {} remote events", events.len(), total);
        }
        events
    }

    pub fn normalize(&mut self, payload: Value) -> Result<CalendarEvent, NormalizeError> {
        let remote: RemoteEvent = serde_json::from_value(payload)?;
        let is_all_day = remote.is_all_day.unwrap_or(false);
        let schedule = self.schedule(remote.timing, is_all_day);
        let id = remote.id.into_string();
        let color = remote
            .color
            .filter(|c| is_hex_color(c))
            .unwrap_or_else(|| color_for_key(&id));

        let event = CalendarEvent {
            server_id: Some(id.clone()),
            mutation: Mutation::Committed(id.clone()),
            id,
            title: remote
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            description: remote.description.filter(|d| !d.trim().is_empty()),
            date: schedule.date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            is_all_day,
            end_date: schedule.end_date.filter(|end| *end != schedule.date),
            color,
            source: remote
                .source
                .as_deref()
                .map(EventSource::from_tag)
                .unwrap_or_default(),
        };
        event.validate()?;
        Ok(event)
    }

    fn schedule(&mut self, timing: Timing, is_all_day: bool) -> Schedule {
        match timing {
            Timing::Canonical {
                date,
                start_time,
                end_time,
                end_date,
            } => self.wall_clock(date, start_time, end_time, end_date, is_all_day),
            Timing::DateWithWallTimes {
                start_date,
                start_time,
                end_time,
                end_date,
            } => self.wall_clock(start_date, Some(start_time), end_time, end_date, is_all_day),
            Timing::Instants {
                start_time,
                end_time,
            } => from_instants(start_time.0, end_time.map(|i| i.0), is_all_day),
            Timing::DateTimes {
                start_datetime,
                end_datetime,
            } => from_instants(start_datetime.0, end_datetime.map(|i| i.0), is_all_day),
            Timing::Dates {
                start_date,
                end_date,
            } => {
                if is_all_day {
                    all_day(start_date, end_date)
                } else {
                    // Date-only timed events sit at 09:00-10:00 UTC.
                    let start = Utc.from_utc_datetime(&start_date.and_time(hm(9, 0))).with_timezone(&Local);
                    let end = start + Duration::minutes(DEFAULT_DURATION_MINUTES as i64);
                    from_instants(start, Some(end), false)
                }
            }
        }
    }

    /// Schedule from a calendar date plus optional `HH:MM` times.
    fn wall_clock(
        &mut self,
        date: NaiveDate,
        start_time: Option<WallTime>,
        end_time: Option<WallTime>,
        end_date: Option<NaiveDate>,
        is_all_day: bool,
    ) -> Schedule {
        if is_all_day {
            return all_day(date, end_date);
        }
        let start = match start_time {
            Some(WallTime(start)) => start,
            None => match end_time {
                Some(WallTime(end)) => time_from_minutes(minutes_of(end).saturating_sub(DEFAULT_DURATION_MINUTES)),
                None => return self.next_untimed_slot(date, end_date),
            },
        };
        let end = end_time.map(|WallTime(end)| end);
        timed(date, start, end, end_date)
    }

    fn next_untimed_slot(&mut self, date: NaiveDate, end_date: Option<NaiveDate>) -> Schedule {
        let start = (UNTIMED_FIRST_SLOT + self.untimed_seen * UNTIMED_SLOT_MINUTES)
            .min(LAST_MINUTE - UNTIMED_SLOT_MINUTES);
        self.untimed_seen += 1;
        timed(
            date,
            time_from_minutes(start),
            Some(time_from_minutes(start + UNTIMED_SLOT_MINUTES)),
            end_date,
        )
    }
}

fn all_day(date: NaiveDate, end_date: Option<NaiveDate>) -> Schedule {
    Schedule {
        date,
        start_time: None,
        end_time: None,
        end_date: end_date.filter(|end| *end > date),
    }
}

/// Single- or multi-day timed schedule. A missing or inverted single-day end
/// becomes start plus the default duration, clamped to 23:59.
fn timed(date: NaiveDate, start: NaiveTime, end: Option<NaiveTime>, end_date: Option<NaiveDate>) -> Schedule {
    let end_date = end_date.filter(|end| *end > date);
    let start_minutes = minutes_of(start);
    let end = match end {
        Some(end) if end_date.is_some() || minutes_of(end) > start_minutes => end,
        _ => time_from_minutes(start_minutes + DEFAULT_DURATION_MINUTES),
    };
    Schedule {
        date,
        start_time: Some(start),
        end_time: Some(end),
        end_date,
    }
}

fn from_instants(start: DateTime<Local>, end: Option<DateTime<Local>>, is_all_day: bool) -> Schedule {
    let end = end
        .filter(|end| *end > start)
        .unwrap_or(start + Duration::minutes(DEFAULT_DURATION_MINUTES as i64));
    let date = start.date_naive();
    if is_all_day {
        return all_day(date, Some(end.date_naive()));
    }
    if end.date_naive() == date {
        return timed(date, start.time(), Some(end.time()), None);
    }
    timed(date, start.time(), Some(end.time()), Some(end.date_naive()))
}
