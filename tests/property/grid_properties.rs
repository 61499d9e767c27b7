// Property-based tests for grid geometry and event moves
// Random dates, times and durations against the layout invariants

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use egui::Pos2;
use proptest::prelude::*;

use week_grid::grid::layout::{min_event_height, place_event, place_events, GridCell, GridMetrics, PlacementKind};
use week_grid::grid::selection::SelectionContext;
use week_grid::grid::CreateRequest;
use week_grid::models::event::{CalendarEvent, MIN_EVENT_MINUTES};
use week_grid::models::settings::GridSettings;
use week_grid::utils::date::{
    day_offset, local_instant, local_noon, minutes_of, time_from_minutes, week_start, LAST_MINUTE,
};

fn metrics() -> GridMetrics {
    GridMetrics::new(&GridSettings::default()).with_origin(Pos2::new(50.0, 80.0))
}

fn some_date(days: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(days)
}

fn timed_event(date: NaiveDate, start: u32, duration: u32) -> CalendarEvent {
    let end = (start + duration).min(LAST_MINUTE);
    CalendarEvent::timed("Prop", date, time_from_minutes(start), time_from_minutes(end))
}

proptest! {
    /// Property: every date lands in column 0..7 of its own week, and that
    /// week starts on a Sunday
    #[test]
    fn prop_date_maps_into_its_week(days in 0..2000i64) {
        let date = some_date(days);
        let start = week_start(local_noon(date));

        prop_assert_eq!(start.date_naive().weekday(), Weekday::Sun);
        let offset = day_offset(date, start);
        prop_assert!((0..7).contains(&offset));
        prop_assert_eq!(start.date_naive() + Duration::days(offset), date);
    }

    /// Property: the start of a week is its own week start
    #[test]
    fn prop_week_start_is_idempotent(days in 0..2000i64, minutes in 0..1440u32) {
        let start = week_start(local_instant(some_date(days), time_from_minutes(minutes)));

        prop_assert_eq!(week_start(start), start);
        prop_assert_eq!(start.date_naive().weekday(), Weekday::Sun);
    }

    /// Property: the cell under a cell's own top-left corner is that cell
    #[test]
    fn prop_cell_round_trips_through_position(day in 0..7u8, slot in 0..96u32) {
        let m = metrics();
        let cell = GridCell::new(day, slot * 15);
        let rect = m.cell_rect(cell);
        prop_assert_eq!(m.cell_at(rect.min + egui::vec2(1.0, 1.0)), Some(cell));
    }

    /// Property: timed blocks start at their start time and are never
    /// shorter than the minimum visible height
    #[test]
    fn prop_timed_block_geometry(days in 0..7i64, start in 0..1380u32, duration in 1..240u32) {
        let m = metrics();
        let week = week_start(local_noon(some_date(0)));
        let event = timed_event(week.date_naive() + Duration::days(days), start, duration);

        let placement = place_event(&event, week, &m).unwrap();
        prop_assert!(placement.is_timed());
        prop_assert!((placement.rect.top() - m.y_for_minutes(start)).abs() < 0.01);
        prop_assert!(placement.rect.height() + 0.01 >= min_event_height(m.hour_height));
    }

    /// Property: overlapping timed events on one day never share pixels
    #[test]
    fn prop_lanes_never_overlap(specs in prop::collection::vec((0..1300u32, 15..180u32), 1..8)) {
        let m = metrics();
        let week = week_start(local_noon(some_date(10)));
        let date = week.date_naive() + Duration::days(3);
        let events: Vec<CalendarEvent> = specs
            .iter()
            .map(|(start, duration)| timed_event(date, *start, *duration))
            .collect();

        let placements = place_events(&events, week, &m);
        prop_assert_eq!(placements.len(), events.len());
        for (i, a) in placements.iter().enumerate() {
            let is_timed = matches!(a.kind, PlacementKind::Timed { .. });
            prop_assert!(is_timed);
            for b in placements.iter().skip(i + 1) {
                let overlap = a.rect.intersect(b.rect);
                prop_assert!(overlap.width() <= 0.01 || overlap.height() <= 0.01);
            }
        }
    }

    /// Property: moving a single-day event keeps its duration and keeps it
    /// inside the day
    #[test]
    fn prop_move_preserves_duration(start in 0..1380u32, duration in 15..240u32, target in 0..1440u32, shift in -6..7i64) {
        let date = some_date(100);
        let event = timed_event(date, start, duration);
        let original = event.duration_minutes();

        let moved = event.moved_to(date + Duration::days(shift), target);
        let new_start = minutes_of(moved.start_time.unwrap());
        let new_end = minutes_of(moved.end_time.unwrap());

        prop_assert_eq!(moved.date, date + Duration::days(shift));
        prop_assert_eq!(new_end - new_start, original);
        prop_assert!(new_end <= LAST_MINUTE);
    }

    /// Property: resizing never goes below the minimum duration or past the
    /// end of the day
    #[test]
    fn prop_resize_is_clamped(start in 0..1380u32, end in 0..2000u32) {
        let event = timed_event(some_date(5), start, 60);
        let resized = event.resized_to(end);
        let new_end = minutes_of(resized.end_time.unwrap());

        prop_assert!(new_end >= (start + MIN_EVENT_MINUTES).min(LAST_MINUTE));
        prop_assert!(new_end <= LAST_MINUTE);
        prop_assert_eq!(resized.start_time, event.start_time);
    }

    /// Property: a single-day selection always yields start < end
    #[test]
    fn prop_selection_is_never_empty(day in 0..7u8, a in 0..96u32, b in 0..96u32) {
        let m = metrics();
        let week = week_start(local_noon(some_date(20)));
        let anchor = GridCell::new(day, a * 15);
        let mut selection = SelectionContext::new(anchor, m.cell_rect(anchor).center());
        selection.update(m.cell_rect(GridCell::new(day, b * 15)).center(), &m);

        match selection.to_request(week, 60) {
            CreateRequest::SingleDay { start, end, .. } => prop_assert!(start < end),
            CreateRequest::MultiDay { .. } => prop_assert!(false, "same-day selection became multi-day"),
        }
    }
}
