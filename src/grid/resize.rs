// Event Resize System
//
// Dragging the bottom handle of a timed event moves its end time. The start
// never moves and the result never drops below the minimum duration.

use egui::{Pos2, Rect};

use super::layout::{GridMetrics, MIN_DURATION_MINUTES};
use super::DRAG_THRESHOLD;
use crate::models::event::CalendarEvent;
use crate::utils::date::LAST_MINUTE;

/// Context for an active resize operation
#[derive(Clone, Debug)]
pub struct ResizeContext {
    pub event_id: String,
    pub start_minutes: u32,
    pub original_end: u32,
    /// The event rect at drag start
    pub original_rect: Rect,
    pub grab_y: f32,
    /// Snapped end under the pointer
    pub current_end: u32,
    pub moved: bool,
}

impl ResizeContext {
    /// `None` for events without a resizable end (all-day, multi-day, untimed).
    pub fn new(event: &CalendarEvent, rect: Rect, pointer: Pos2) -> Option<Self> {
        if event.is_all_day || event.is_multi_day() {
            return None;
        }
        let start_minutes = event.start_minutes()?;
        let original_end = event.end_minutes()?;
        Some(Self {
            event_id: event.id.clone(),
            start_minutes,
            original_end,
            original_rect: rect,
            grab_y: pointer.y,
            current_end: original_end,
            moved: false,
        })
    }

    pub fn update(&mut self, pointer: Pos2, metrics: &GridMetrics) {
        let dy = pointer.y - self.grab_y;
        if dy.abs() > DRAG_THRESHOLD {
            self.moved = true;
        }
        let delta = metrics.minutes_for_offset(metrics.snap_offset(dy)) as i64;
        let floor = (self.start_minutes + MIN_DURATION_MINUTES).min(LAST_MINUTE) as i64;
        self.current_end = (self.original_end as i64 + delta).clamp(floor, LAST_MINUTE as i64) as u32;
    }

    /// Live preview keeping the lane position of the original block.
    pub fn preview_rect(&self, metrics: &GridMetrics) -> Rect {
        let top = self.original_rect.top();
        let bottom = metrics.y_for_minutes(self.current_end);
        Rect::from_min_max(
            Pos2::new(self.original_rect.left(), top),
            Pos2::new(self.original_rect.right(), bottom.max(top + 1.0)),
        )
    }
}
