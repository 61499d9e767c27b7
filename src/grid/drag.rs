// Drag-to-move state
//
// Tracks a press on an event body (or a trashed entry dragged in from the
// trash panel) until release. The live offset is visual only; the event is
// rewritten once, on drop.

use chrono::{Duration, NaiveDate};
use egui::{Pos2, Rect, Vec2};

use super::layout::{EventPlacement, GridCell, GridMetrics, PlacementKind};
use super::DRAG_THRESHOLD;
use crate::models::event::CalendarEvent;
use crate::models::trash::TrashEntry;
use crate::utils::date::LAST_MINUTE;

/// What is being dragged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragPayload {
    /// An event on the grid.
    Active(String),
    /// An entry dragged out of the trash panel.
    Trashed(String),
}

impl DragPayload {
    pub fn event_id(&self) -> &str {
        match self {
            DragPayload::Active(id) | DragPayload::Trashed(id) => id,
        }
    }
}

/// Where a drag would land if released now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropTarget {
    pub date: NaiveDate,
    pub start_minutes: u32,
}

#[derive(Clone, Debug)]
pub struct DragContext {
    pub payload: DragPayload,
    pub title: String,
    pub original_date: NaiveDate,
    pub original_start: u32,
    pub duration_minutes: u32,
    /// All-day and multi-day bars only move between days.
    pub ribbon: bool,
    /// Rect of the event at drag start; `Rect::NOTHING` for trashed entries.
    pub source_rect: Rect,
    pub grab_pos: Option<Pos2>,
    pub grab_day: u8,
    pub pointer_pos: Option<Pos2>,
    /// Snapped vertical offset applied to the preview.
    pub top_offset: f32,
    pub hovered_day: u8,
    /// Cell under the pointer; used by trashed-entry drops.
    pub hovered_cell: Option<GridCell>,
    pub moved: bool,
}

impl DragContext {
    pub fn for_event(
        event: &CalendarEvent,
        placement: &EventPlacement,
        pointer: Pos2,
        metrics: &GridMetrics,
    ) -> Self {
        let grab_day = metrics
            .day_at_x(pointer.x)
            .unwrap_or(placement.first_day);
        Self {
            payload: DragPayload::Active(event.id.clone()),
            title: event.title.clone(),
            original_date: event.date,
            original_start: event.start_minutes().unwrap_or(0),
            duration_minutes: event.duration_minutes(),
            ribbon: matches!(placement.kind, PlacementKind::Ribbon { .. }),
            source_rect: placement.rect,
            grab_pos: Some(pointer),
            grab_day,
            pointer_pos: Some(pointer),
            top_offset: 0.0,
            hovered_day: grab_day,
            hovered_cell: metrics.cell_at(pointer),
            moved: false,
        }
    }

    /// Starts a drag of a trashed entry. The pointer is outside the grid, so
    /// nothing is hovered until the first move over a cell.
    pub fn for_trashed(entry: &TrashEntry) -> Self {
        let event = &entry.event;
        Self {
            payload: DragPayload::Trashed(event.id.clone()),
            title: event.title.clone(),
            original_date: event.date,
            original_start: event.start_minutes().unwrap_or(0),
            duration_minutes: event.duration_minutes(),
            ribbon: event.is_all_day,
            source_rect: Rect::NOTHING,
            grab_pos: None,
            grab_day: 0,
            pointer_pos: None,
            top_offset: 0.0,
            hovered_day: 0,
            hovered_cell: None,
            moved: false,
        }
    }

    pub fn is_trashed(&self) -> bool {
        matches!(self.payload, DragPayload::Trashed(_))
    }

    pub fn update(&mut self, pointer: Pos2, metrics: &GridMetrics) {
        self.pointer_pos = Some(pointer);
        self.hovered_cell = metrics.cell_at(pointer);

        let Some(grab) = self.grab_pos else {
            self.moved = self.hovered_cell.is_some();
            return;
        };

        if (pointer - grab).length() > DRAG_THRESHOLD {
            self.moved = true;
        }
        self.hovered_day = metrics.day_at_x_clamped(pointer.x);
        self.top_offset = if self.ribbon {
            0.0
        } else {
            metrics.snap_offset(pointer.y - grab.y)
        };
    }

    /// Forgets the hovered cell, e.g. when the pointer leaves the grid.
    pub fn clear_hover(&mut self) {
        self.hovered_cell = None;
        self.pointer_pos = None;
    }

    fn day_shift(&self) -> i64 {
        self.hovered_day as i64 - self.grab_day as i64
    }

    fn shifted_start(&self, metrics: &GridMetrics) -> u32 {
        if self.ribbon {
            return self.original_start;
        }
        let delta = metrics.minutes_for_offset(self.top_offset) as i64;
        let latest = LAST_MINUTE.saturating_sub(self.duration_minutes) as i64;
        (self.original_start as i64 + delta).clamp(0, latest) as u32
    }

    /// Destination of the drop, preserving duration.
    pub fn drop_target(&self, metrics: &GridMetrics) -> Option<DropTarget> {
        if self.is_trashed() {
            return None;
        }
        Some(DropTarget {
            date: self.original_date + Duration::days(self.day_shift()),
            start_minutes: self.shifted_start(metrics),
        })
    }

    /// Live preview of the dragged block.
    pub fn preview_rect(&self, metrics: &GridMetrics) -> Option<Rect> {
        if let Some(cell) = self.hovered_cell.filter(|_| self.is_trashed()) {
            let end = (cell.minutes + self.duration_minutes.max(metrics.snap_minutes)).min(LAST_MINUTE);
            return Some(if self.ribbon {
                metrics.ribbon_rect(cell.day, cell.day, 0)
            } else {
                metrics.timed_rect(cell.day, cell.minutes, end)
            });
        }
        if self.is_trashed() || !self.moved {
            return None;
        }
        let dx = metrics.column_left(self.hovered_day) - metrics.column_left(self.grab_day);
        let start = self.shifted_start(metrics);
        let dy = if self.ribbon {
            0.0
        } else {
            metrics.y_for_minutes(start) - metrics.y_for_minutes(self.original_start)
        };
        Some(self.source_rect.translate(Vec2::new(dx, dy)))
    }
}
