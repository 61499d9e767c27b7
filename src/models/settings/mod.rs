// Settings module
// Grid and sync configuration with defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::trash::TOMBSTONE_RETENTION_DAYS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Calendar whose events the grid shows.
    pub calendar_id: String,
    /// Base URL of the Event Service. When unset the grid runs against an
    /// in-memory service.
    pub service_url: Option<String>,
    pub api_token: Option<String>,
    /// Vertical units per hour.
    pub hour_height: f32,
    /// Resolution drag gestures round to.
    pub snap_minutes: u32,
    pub min_column_width: f32,
    pub time_label_width: f32,
    /// Height of one all-day ribbon row above the timed area.
    pub ribbon_row_height: f32,
    /// Duration of events created with a single click.
    pub default_event_minutes: u32,
    pub resize_debounce_ms: u64,
    pub tombstone_retention_days: i64,
    /// SQLite file holding the client-side cache.
    pub database_path: Option<PathBuf>,
    /// Mirror notifications to the desktop notification daemon.
    pub desktop_notifications: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            service_url: None,
            api_token: None,
            hour_height: 60.0,
            snap_minutes: 15,
            min_column_width: 80.0,
            time_label_width: 50.0,
            ribbon_row_height: 22.0,
            default_event_minutes: 60,
            resize_debounce_ms: 150,
            tombstone_retention_days: TOMBSTONE_RETENTION_DAYS,
            database_path: None,
            desktop_notifications: false,
        }
    }
}

impl GridSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.calendar_id.trim().is_empty() {
            return Err("Calendar id cannot be empty".to_string());
        }

        if !(self.hour_height > 0.0) {
            return Err("Hour height must be positive".to_string());
        }

        if self.snap_minutes == 0 || 60 % self.snap_minutes != 0 {
            return Err("Snap minutes must divide an hour evenly".to_string());
        }

        if !(self.min_column_width > 0.0) {
            return Err("Minimum column width must be positive".to_string());
        }

        if self.default_event_minutes == 0 {
            return Err("Default event duration must be at least one minute".to_string());
        }

        if self.tombstone_retention_days < 1 {
            return Err("Tombstone retention must be at least one day".to_string());
        }

        if let Some(url) = &self.service_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err("Service URL must be http(s)".to_string());
            }
        }

        Ok(())
    }
}
