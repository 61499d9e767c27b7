//! Grid layout and time mapping.
//!
//! Pure conversions between the scheduling domain (day column 0..=6 relative
//! to the week start, minutes past midnight) and the pixel geometry of the
//! grid. Nothing in here touches state; the controller and the egui view both
//! call into it.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use egui::{Pos2, Rect, Vec2};

use crate::models::event::CalendarEvent;
use crate::models::settings::GridSettings;
use crate::utils::date::{day_offset, time_from_minutes, LAST_MINUTE, MINUTES_PER_DAY};

pub const DAYS_PER_WEEK: u8 = 7;
pub const COLUMN_SPACING: f32 = 1.0;
/// Shortest duration an event is ever drawn with or resized down to.
pub const MIN_DURATION_MINUTES: u32 = 15;

/// Offset of `hour:minute` from the top of the timed area.
pub fn vertical_position(hour: u32, minute: u32, hour_height: f32) -> f32 {
    (hour as f32 + minute as f32 / 60.0) * hour_height
}

/// Height of an event running from `start_hours` to `end_hours` (decimal
/// hours). Zero or negative durations are floored so they stay grabbable.
pub fn duration_height(start_hours: f32, end_hours: f32, hour_height: f32) -> f32 {
    ((end_hours - start_hours) * hour_height).max(min_event_height(hour_height))
}

pub fn min_event_height(hour_height: f32) -> f32 {
    MIN_DURATION_MINUTES as f32 / 60.0 * hour_height
}

/// A snapped position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub day: u8,
    /// Minutes past midnight, a multiple of the snap resolution.
    pub minutes: u32,
}

impl GridCell {
    pub fn new(day: u8, minutes: u32) -> Self {
        Self { day, minutes }
    }

    pub fn at_hour(day: u8, hour: u32) -> Self {
        Self::new(day, hour * 60)
    }

    pub fn hour(&self) -> u32 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u32 {
        self.minutes % 60
    }

    pub fn time(&self) -> chrono::NaiveTime {
        time_from_minutes(self.minutes)
    }
}

/// Geometry of the grid for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    /// Top-left corner of the first day column at midnight.
    pub origin: Pos2,
    pub column_width: f32,
    pub hour_height: f32,
    pub snap_minutes: u32,
    /// Top edge of the all-day ribbon band.
    pub ribbon_top: f32,
    pub ribbon_row_height: f32,
}

impl GridMetrics {
    pub fn new(settings: &GridSettings) -> Self {
        Self {
            origin: Pos2::ZERO,
            column_width: settings.min_column_width,
            hour_height: settings.hour_height,
            snap_minutes: settings.snap_minutes.max(1),
            ribbon_top: 0.0,
            ribbon_row_height: settings.ribbon_row_height,
        }
    }

    /// Derives the column width from the space left after the sidebar and the
    /// time labels, never going below the configured floor.
    pub fn from_viewport(available_width: f32, sidebar_width: f32, settings: &GridSettings) -> Self {
        let usable = available_width
            - sidebar_width
            - settings.time_label_width
            - COLUMN_SPACING * (DAYS_PER_WEEK as f32 - 1.0);
        let column_width = (usable / DAYS_PER_WEEK as f32).max(settings.min_column_width);
        Self {
            column_width,
            ..Self::new(settings)
        }
    }

    pub fn with_origin(mut self, origin: Pos2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_ribbon_top(mut self, ribbon_top: f32) -> Self {
        self.ribbon_top = ribbon_top;
        self
    }

    pub fn column_left(&self, day: u8) -> f32 {
        self.origin.x + day as f32 * (self.column_width + COLUMN_SPACING)
    }

    pub fn column_right(&self, day: u8) -> f32 {
        self.column_left(day) + self.column_width
    }

    pub fn grid_width(&self) -> f32 {
        self.column_right(DAYS_PER_WEEK - 1) - self.origin.x
    }

    pub fn grid_height(&self) -> f32 {
        24.0 * self.hour_height
    }

    /// The timed (hourly) part of the grid.
    pub fn timed_area(&self) -> Rect {
        Rect::from_min_size(self.origin, Vec2::new(self.grid_width(), self.grid_height()))
    }

    pub fn y_for_minutes(&self, minutes: u32) -> f32 {
        self.origin.y + vertical_position(minutes / 60, minutes % 60, self.hour_height)
    }

    /// Pixel height of one snap step.
    pub fn snap_step(&self) -> f32 {
        self.snap_minutes as f32 / 60.0 * self.hour_height
    }

    pub fn snap_down(&self, minutes: u32) -> u32 {
        minutes - minutes % self.snap_minutes
    }

    /// Rounds a vertical pointer delta to the nearest whole snap step.
    pub fn snap_offset(&self, dy: f32) -> f32 {
        let step = self.snap_step();
        (dy / step).round() * step
    }

    /// Converts a (snapped) vertical offset into whole minutes.
    pub fn minutes_for_offset(&self, dy: f32) -> i32 {
        (dy / self.hour_height * 60.0).round() as i32
    }

    pub fn day_at_x(&self, x: f32) -> Option<u8> {
        let relative = x - self.origin.x;
        if relative < 0.0 {
            return None;
        }
        let day = (relative / (self.column_width + COLUMN_SPACING)).floor() as i64;
        (0..DAYS_PER_WEEK as i64).contains(&day).then_some(day as u8)
    }

    pub fn day_at_x_clamped(&self, x: f32) -> u8 {
        let relative = (x - self.origin.x).max(0.0);
        let day = (relative / (self.column_width + COLUMN_SPACING)).floor() as i64;
        day.clamp(0, DAYS_PER_WEEK as i64 - 1) as u8
    }

    /// Minutes under `y`, snapped down and clamped onto the day.
    pub fn minutes_at_y(&self, y: f32) -> u32 {
        let raw = ((y - self.origin.y) / self.hour_height * 60.0).floor();
        let clamped = raw.clamp(0.0, LAST_MINUTE as f32) as u32;
        self.snap_down(clamped)
    }

    /// Snapped cell under `pos`, or `None` outside the timed area.
    pub fn cell_at(&self, pos: Pos2) -> Option<GridCell> {
        if pos.y < self.origin.y || pos.y >= self.origin.y + self.grid_height() {
            return None;
        }
        let day = self.day_at_x(pos.x)?;
        Some(GridCell::new(day, self.minutes_at_y(pos.y)))
    }

    /// Like [`cell_at`](Self::cell_at) but pins positions outside the grid to
    /// the nearest edge cell, for gestures that wander off the surface.
    pub fn cell_at_clamped(&self, pos: Pos2) -> GridCell {
        GridCell::new(self.day_at_x_clamped(pos.x), self.minutes_at_y(pos.y))
    }

    /// One snap slot.
    pub fn cell_rect(&self, cell: GridCell) -> Rect {
        Rect::from_min_max(
            Pos2::new(self.column_left(cell.day), self.y_for_minutes(cell.minutes)),
            Pos2::new(
                self.column_right(cell.day),
                self.y_for_minutes(cell.minutes) + self.snap_step(),
            ),
        )
    }

    /// Rect of a timed block on `day`, height floored at the minimum duration.
    pub fn timed_rect(&self, day: u8, start_minutes: u32, end_minutes: u32) -> Rect {
        let top = self.y_for_minutes(start_minutes);
        let height = duration_height(
            start_minutes as f32 / 60.0,
            end_minutes as f32 / 60.0,
            self.hour_height,
        );
        Rect::from_min_size(
            Pos2::new(self.column_left(day), top),
            Vec2::new(self.column_width, height),
        )
    }

    /// A block spanning whole columns. The width comes from the column
    /// boundaries themselves so it stays aligned however the columns resize.
    pub fn span_rect(&self, first_day: u8, last_day: u8, top: f32, height: f32) -> Rect {
        let (first, last) = (first_day.min(last_day), first_day.max(last_day));
        let left = self.column_left(first);
        let width = self.column_right(last) - left;
        Rect::from_min_size(Pos2::new(left, top), Vec2::new(width, height))
    }

    pub fn ribbon_rect(&self, first_day: u8, last_day: u8, row: usize) -> Rect {
        let top = self.ribbon_top + row as f32 * self.ribbon_row_height;
        self.span_rect(first_day, last_day, top, (self.ribbon_row_height - 2.0).max(1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    /// Single-day timed block; `lane` of `lanes` side-by-side columns.
    Timed { lane: usize, lanes: usize },
    /// All-day or multi-day bar in the ribbon band.
    Ribbon { row: usize },
}

/// Where one event lands on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPlacement {
    pub event_id: String,
    pub rect: Rect,
    pub kind: PlacementKind,
    pub first_day: u8,
    pub last_day: u8,
    /// The event starts before the displayed week.
    pub clipped_start: bool,
    /// The event ends after the displayed week.
    pub clipped_end: bool,
}

impl EventPlacement {
    pub fn is_timed(&self) -> bool {
        matches!(self.kind, PlacementKind::Timed { .. })
    }
}

fn is_ribbon_event(event: &CalendarEvent) -> bool {
    event.is_all_day || event.is_multi_day() || event.start_time.is_none()
}

/// Places one event in isolation (no lane sharing, ribbon row 0). Returns
/// `None` when the event falls outside the displayed week.
pub fn place_event(
    event: &CalendarEvent,
    week_start: DateTime<Local>,
    metrics: &GridMetrics,
) -> Option<EventPlacement> {
    if is_ribbon_event(event) {
        ribbon_span(event, week_start).map(|(first, last, clipped_start, clipped_end)| EventPlacement {
            event_id: event.id.clone(),
            rect: metrics.ribbon_rect(first, last, 0),
            kind: PlacementKind::Ribbon { row: 0 },
            first_day: first,
            last_day: last,
            clipped_start,
            clipped_end,
        })
    } else {
        let day = day_index(event, week_start)?;
        Some(EventPlacement {
            event_id: event.id.clone(),
            rect: timed_event_rect(event, day, metrics),
            kind: PlacementKind::Timed { lane: 0, lanes: 1 },
            first_day: day,
            last_day: day,
            clipped_start: false,
            clipped_end: false,
        })
    }
}

/// Lays out a whole week: overlapping timed events share their column in
/// lanes, ribbon events stack into the first row with free days.
pub fn place_events<'a, I>(events: I, week_start: DateTime<Local>, metrics: &GridMetrics) -> Vec<EventPlacement>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    let mut placements = Vec::new();
    let mut ribbon_rows: Vec<[bool; DAYS_PER_WEEK as usize]> = Vec::new();
    let mut per_day: Vec<Vec<(u32, u32, &'a CalendarEvent)>> = vec![Vec::new(); DAYS_PER_WEEK as usize];

    for event in events {
        if is_ribbon_event(event) {
            let Some((first, last, clipped_start, clipped_end)) = ribbon_span(event, week_start) else {
                continue;
            };
            let row = claim_ribbon_row(&mut ribbon_rows, first, last);
            placements.push(EventPlacement {
                event_id: event.id.clone(),
                rect: metrics.ribbon_rect(first, last, row),
                kind: PlacementKind::Ribbon { row },
                first_day: first,
                last_day: last,
                clipped_start,
                clipped_end,
            });
        } else if let Some(day) = day_index(event, week_start) {
            let start = event.start_minutes().unwrap_or(0);
            let end = event
                .end_minutes()
                .unwrap_or(start)
                .max(start + MIN_DURATION_MINUTES);
            per_day[day as usize].push((start, end, event));
        }
    }

    for (day, mut blocks) in per_day.into_iter().enumerate() {
        blocks.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        for cluster in overlap_clusters(&blocks) {
            let lanes = assign_lanes(cluster);
            let lane_count = lanes.iter().copied().max().map_or(1, |max| max + 1);
            for ((_, _, event), lane) in cluster.iter().zip(lanes) {
                let full = timed_event_rect(event, day as u8, metrics);
                let lane_width = full.width() / lane_count as f32;
                let rect = Rect::from_min_size(
                    Pos2::new(full.left() + lane as f32 * lane_width, full.top()),
                    Vec2::new(lane_width, full.height()),
                );
                placements.push(EventPlacement {
                    event_id: event.id.clone(),
                    rect,
                    kind: PlacementKind::Timed {
                        lane,
                        lanes: lane_count,
                    },
                    first_day: day as u8,
                    last_day: day as u8,
                    clipped_start: false,
                    clipped_end: false,
                });
            }
        }
    }

    placements
}

/// Number of ribbon rows a set of placements occupies.
pub fn ribbon_rows_needed(placements: &[EventPlacement]) -> usize {
    placements
        .iter()
        .filter_map(|p| match p.kind {
            PlacementKind::Ribbon { row } => Some(row + 1),
            PlacementKind::Timed { .. } => None,
        })
        .max()
        .unwrap_or(0)
}

/// Column of the event's start date in the displayed week, or `None` when it
/// falls outside and must not be rendered.
pub fn day_index(event: &CalendarEvent, week_start: DateTime<Local>) -> Option<u8> {
    let day = day_offset(event.date, week_start);
    (0..DAYS_PER_WEEK as i64).contains(&day).then_some(day as u8)
}

fn timed_event_rect(event: &CalendarEvent, day: u8, metrics: &GridMetrics) -> Rect {
    let start = event.start_minutes().unwrap_or(0);
    let end = event.end_minutes().unwrap_or(start).min(MINUTES_PER_DAY);
    metrics.timed_rect(day, start, end)
}

/// Visible first/last day of a ribbon event plus whether it was clipped.
fn ribbon_span(event: &CalendarEvent, week_start: DateTime<Local>) -> Option<(u8, u8, bool, bool)> {
    let first = day_offset(event.date, week_start);
    let last = day_offset(event.last_date(), week_start).max(first);
    let max_day = DAYS_PER_WEEK as i64 - 1;
    if last < 0 || first > max_day {
        return None;
    }
    Some((
        first.clamp(0, max_day) as u8,
        last.clamp(0, max_day) as u8,
        first < 0,
        last > max_day,
    ))
}

fn claim_ribbon_row(rows: &mut Vec<[bool; DAYS_PER_WEEK as usize]>, first: u8, last: u8) -> usize {
    let span = first as usize..=last as usize;
    let row = rows
        .iter()
        .position(|row| span.clone().all(|day| !row[day]))
        .unwrap_or_else(|| {
            rows.push([false; DAYS_PER_WEEK as usize]);
            rows.len() - 1
        });
    for day in span {
        rows[row][day] = true;
    }
    row
}

/// Splits start-sorted blocks into runs whose intervals chain-overlap.
fn overlap_clusters<'b, T>(blocks: &'b [(u32, u32, T)]) -> Vec<&'b [(u32, u32, T)]> {
    let mut clusters = Vec::new();
    let mut cluster_start = 0;
    let mut cluster_end = 0;
    for (index, (start, end, _)) in blocks.iter().enumerate() {
        if index > cluster_start && *start >= cluster_end {
            clusters.push(&blocks[cluster_start..index]);
            cluster_start = index;
            cluster_end = *end;
        } else {
            cluster_end = cluster_end.max(*end);
        }
    }
    if cluster_start < blocks.len() {
        clusters.push(&blocks[cluster_start..]);
    }
    clusters
}

/// Greedy lane assignment: each block takes the first lane that is free.
fn assign_lanes<T>(cluster: &[(u32, u32, T)]) -> Vec<usize> {
    let mut lane_ends: Vec<u32> = Vec::new();
    cluster
        .iter()
        .map(|(start, end, _)| {
            match lane_ends.iter().position(|lane_end| *lane_end <= *start) {
                Some(lane) => {
                    lane_ends[lane] = *end;
                    lane
                }
                None => {
                    lane_ends.push(*end);
                    lane_ends.len() - 1
                }
            }
        })
        .collect()
}

/// Debounces viewport size changes so the grid geometry is recomputed once
/// the window stops resizing. Sidebar width changes apply immediately.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    debounce: Duration,
    applied: Option<(f32, f32)>,
    pending: Option<(f32, f32, Instant)>,
}

impl ViewportTracker {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            applied: None,
            pending: None,
        }
    }

    /// Records the current viewport. Returns the size to apply right away,
    /// if any (first observation or a sidebar change).
    pub fn observe(&mut self, available_width: f32, sidebar_width: f32, now: Instant) -> Option<(f32, f32)> {
        match self.applied {
            None => {
                self.applied = Some((available_width, sidebar_width));
                self.applied
            }
            Some((_, sidebar)) if sidebar != sidebar_width => {
                self.pending = None;
                self.applied = Some((available_width, sidebar_width));
                self.applied
            }
            Some((width, _)) if (width - available_width).abs() > f32::EPSILON => {
                let unchanged_pending = self
                    .pending
                    .is_some_and(|(w, s, _)| w == available_width && s == sidebar_width);
                if !unchanged_pending {
                    self.pending = Some((available_width, sidebar_width, now));
                }
                None
            }
            Some(_) => {
                self.pending = None;
                None
            }
        }
    }

    /// Returns the pending size once it has been stable for the debounce window.
    pub fn settle(&mut self, now: Instant) -> Option<(f32, f32)> {
        let (width, sidebar, since) = self.pending?;
        if now.duration_since(since) < self.debounce {
            return None;
        }
        self.pending = None;
        self.applied = Some((width, sidebar));
        self.applied
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
