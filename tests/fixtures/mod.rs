// Test fixtures - reusable grid harness and remote payloads
// Shared by the integration test files

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use egui::Pos2;
use serde_json::{json, Value};

use week_grid::grid::{CreateRequest, GridController};
use week_grid::models::settings::GridSettings;
use week_grid::services::local_store::LocalStore;
use week_grid::services::notification::NoticeQueue;
use week_grid::services::remote::InMemoryEventService;

pub const CALENDAR: &str = "primary";
pub const WAIT: Duration = Duration::from_secs(5);

/// Where the harness pins the grid, leaving room for one ribbon row.
pub const GRID_LEFT: f32 = 50.0;
pub const GRID_TOP: f32 = 80.0;
pub const RIBBON_TOP: f32 = 30.0;

/// Sample dates for testing
pub mod dates {
    use super::*;

    /// Wednesday, June 18 2025; its week starts Sunday June 15
    pub fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()
    }

    pub fn week_day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15 + day).unwrap()
    }
}

/// Controller wired to an in-memory service, cache and notice queue.
pub struct Harness {
    pub controller: GridController,
    pub service: Arc<InMemoryEventService>,
    pub notices: NoticeQueue,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(InMemoryEventService::new()), LocalStore::in_memory().unwrap())
    }

    pub fn with_parts(service: Arc<InMemoryEventService>, store: LocalStore) -> Self {
        let notices = NoticeQueue::new();
        let mut controller = GridController::new(
            GridSettings::default(),
            service.clone(),
            store,
            Arc::new(notices.clone()),
        )
        .unwrap()
        .with_week(dates::wednesday());
        controller.set_grid_origin(Pos2::new(GRID_LEFT, GRID_TOP), RIBBON_TOP);
        Self {
            controller,
            service,
            notices,
        }
    }

    /// Loads the cache and applies the initial fetch.
    pub fn started(mut self) -> Self {
        self.controller.load_existing_events();
        self.settle();
        self
    }

    /// Applies every outstanding remote result, including follow-up calls
    /// dispatched while applying them.
    pub fn settle(&mut self) {
        for _ in 0..3 {
            self.controller.wait_for_sync(WAIT);
            if self.controller.sync_in_flight() == 0 {
                break;
            }
        }
    }

    /// Screen position inside the cell at `day` / `minutes`.
    pub fn cell_pos(&self, day: u8, minutes: u32) -> Pos2 {
        let metrics = self.controller.metrics();
        Pos2::new(metrics.column_left(day) + 10.0, metrics.y_for_minutes(minutes) + 1.0)
    }

    pub fn center_of(&self, id: &str) -> Pos2 {
        self.controller.render_event(id).unwrap().rect.center()
    }

    /// Creates a titled single-day event through the form and returns its id.
    pub fn create_event(&mut self, title: &str, day: u8, start: NaiveTime, end: NaiveTime) -> String {
        let date = dates::week_day(day as u32);
        self.controller
            .open_create_form(CreateRequest::SingleDay { date, start, end }, Pos2::ZERO);
        self.controller.form_mut().unwrap().title = title.to_string();
        self.controller.submit_form().unwrap()
    }

    /// Creates an event and waits until the service has acknowledged it.
    pub fn create_synced(&mut self, title: &str, day: u8, start: NaiveTime, end: NaiveTime) -> String {
        let id = self.create_event(title, day, start, end);
        self.settle();
        assert!(self.controller.event(&id).unwrap().is_server_backed());
        id
    }
}

/// Sample remote payloads
pub mod payloads {
    use super::*;

    pub fn canonical(id: &str, title: &str, date: NaiveDate, start: &str, end: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "date": date.to_string(),
            "startTime": start,
            "endTime": end,
            "color": "#3B82F6",
        })
    }

    pub fn all_day(id: &str, title: &str, date: NaiveDate) -> Value {
        json!({
            "id": id,
            "summary": title,
            "start_date": date.to_string(),
            "all_day": true,
        })
    }
}
