// Click-drag selection of empty grid cells
//
// A press on an empty cell anchors a selection; moving past the drag
// threshold turns on the creation preview. Release yields a create request;
// nothing is persisted until the form is submitted.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use egui::{Pos2, Rect};

use super::layout::{GridCell, GridMetrics};
use super::DRAG_THRESHOLD;
use crate::utils::date::{date_for_day, time_from_minutes, LAST_MINUTE};

/// Time range picked on the grid, handed to the authoring form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateRequest {
    SingleDay {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
    MultiDay {
        start_date: NaiveDate,
        end_date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
}

impl CreateRequest {
    pub fn start_date(&self) -> NaiveDate {
        match self {
            CreateRequest::SingleDay { date, .. } => *date,
            CreateRequest::MultiDay { start_date, .. } => *start_date,
        }
    }

    pub fn is_multi_day(&self) -> bool {
        matches!(self, CreateRequest::MultiDay { .. })
    }
}

#[derive(Clone, Debug)]
pub struct SelectionContext {
    pub anchor: GridCell,
    pub anchor_pos: Pos2,
    pub current: GridCell,
    /// The creation preview is showing; stays on once the pointer travelled
    /// past the drag threshold.
    pub preview_active: bool,
}

impl SelectionContext {
    pub fn new(anchor: GridCell, anchor_pos: Pos2) -> Self {
        Self {
            anchor,
            anchor_pos,
            current: anchor,
            preview_active: false,
        }
    }

    pub fn update(&mut self, pointer: Pos2, metrics: &GridMetrics) {
        if (pointer - self.anchor_pos).length() > DRAG_THRESHOLD {
            self.preview_active = true;
        }
        self.current = metrics.cell_at_clamped(pointer);
    }

    /// Earlier and later cell in (day, time) order.
    fn ordered(&self) -> (GridCell, GridCell) {
        let key = |c: &GridCell| (c.day, c.minutes);
        if key(&self.anchor) <= key(&self.current) {
            (self.anchor, self.current)
        } else {
            (self.current, self.anchor)
        }
    }

    /// Start and end minutes of the selected range: from the earlier cell's
    /// top to the later cell's top. A same-day range covering no time (a
    /// plain click, or a drag back onto the anchor) gets `default_minutes`.
    fn minutes_range(&self, default_minutes: u32) -> (u32, u32) {
        let (first, last) = self.ordered();
        let start = first.minutes;
        let end = if first.day == last.day && last.minutes <= start {
            (start + default_minutes).min(LAST_MINUTE)
        } else {
            last.minutes
        };
        (start, end)
    }

    /// Rectangle covering exactly the range [`Self::to_request`] would
    /// create, or `None` while the selection is still a plain click.
    pub fn preview_rect(&self, metrics: &GridMetrics, default_minutes: u32) -> Option<Rect> {
        if !self.preview_active {
            return None;
        }
        let (first, last) = self.ordered();
        let (start, end) = self.minutes_range(default_minutes);
        let top = metrics.y_for_minutes(start.min(end));
        let bottom = metrics.y_for_minutes(start.max(end));
        let height = (bottom - top).max(metrics.snap_step());
        Some(metrics.span_rect(first.day, last.day, top, height))
    }

    /// Converts the selection into a create request covering the same range
    /// as the preview.
    pub fn to_request(&self, week_start: DateTime<Local>, default_minutes: u32) -> CreateRequest {
        let (first, last) = self.ordered();
        let (start, end) = self.minutes_range(default_minutes);

        if first.day == last.day {
            CreateRequest::SingleDay {
                date: date_for_day(week_start, first.day),
                start: time_from_minutes(start),
                end: time_from_minutes(end),
            }
        } else {
            CreateRequest::MultiDay {
                start_date: date_for_day(week_start, first.day),
                end_date: date_for_day(week_start, last.day),
                start: time_from_minutes(start),
                end: time_from_minutes(end),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::GridSettings;
    use crate::utils::date::{hm, local_noon, week_start};
    use chrono::{Datelike, Weekday};
    use pretty_assertions::assert_eq;

    fn metrics() -> GridMetrics {
        GridMetrics::new(&GridSettings::default()).with_origin(Pos2::new(50.0, 0.0))
    }

    fn week() -> DateTime<Local> {
        week_start(local_noon(NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()))
    }

    fn pos(m: &GridMetrics, day: u8, minutes: u32) -> Pos2 {
        Pos2::new(m.column_left(day) + 10.0, m.y_for_minutes(minutes) + 1.0)
    }

    #[test]
    fn test_click_uses_default_duration() {
        let m = metrics();
        let selection = SelectionContext::new(GridCell::new(1, 9 * 60), pos(&m, 1, 540));
        assert!(selection.preview_rect(&m, 60).is_none());

        match selection.to_request(week(), 60) {
            CreateRequest::SingleDay { date, start, end } => {
                assert_eq!(date.weekday(), Weekday::Mon);
                assert_eq!(start, hm(9, 0));
                assert_eq!(end, hm(10, 0));
            }
            other => panic!("expected single day, got {:?}", other),
        }
    }

    #[test]
    fn test_upward_drag_is_ordered() {
        let m = metrics();
        let mut selection = SelectionContext::new(GridCell::new(2, 11 * 60), pos(&m, 2, 660));
        selection.update(pos(&m, 2, 540), &m);

        assert!(selection.preview_active);
        assert_eq!(
            selection.to_request(week(), 60),
            CreateRequest::SingleDay {
                date: week().date_naive() + chrono::Duration::days(2),
                start: hm(9, 0),
                end: hm(11, 0),
            }
        );
    }

    #[test]
    fn test_preview_matches_created_range() {
        let m = metrics();
        let mut selection = SelectionContext::new(GridCell::new(1, 540), pos(&m, 1, 540));
        selection.update(pos(&m, 1, 660), &m);

        let preview = selection.preview_rect(&m, 60).unwrap();
        match selection.to_request(week(), 60) {
            CreateRequest::SingleDay { start, end, .. } => {
                assert_eq!((start, end), (hm(9, 0), hm(11, 0)));
                assert_eq!(preview.top(), m.y_for_minutes(540));
                assert_eq!(preview.bottom(), m.y_for_minutes(660));
            }
            other => panic!("expected single day, got {:?}", other),
        }
    }

    #[test]
    fn test_drag_back_onto_anchor_previews_default_duration() {
        let m = metrics();
        let mut selection = SelectionContext::new(GridCell::new(2, 600), pos(&m, 2, 600));
        selection.update(pos(&m, 2, 720), &m);
        selection.update(pos(&m, 2, 600), &m);

        let preview = selection.preview_rect(&m, 60).unwrap();
        assert_eq!(preview.bottom(), m.y_for_minutes(660));
        assert!(matches!(
            selection.to_request(week(), 60),
            CreateRequest::SingleDay { end, .. } if end == hm(11, 0)
        ));
    }

    #[test]
    fn test_cross_day_drag_is_multi_day() {
        let m = metrics();
        let mut selection = SelectionContext::new(GridCell::new(1, 540), pos(&m, 1, 540));
        selection.update(pos(&m, 3, 14 * 60), &m);

        let request = selection.to_request(week(), 60);
        assert!(request.is_multi_day());
        let preview = selection.preview_rect(&m, 60).unwrap();
        assert_eq!(preview.left(), m.column_left(1));
        assert_eq!(preview.right(), m.column_right(3));
    }

    #[test]
    fn test_default_end_clamps_to_day() {
        let m = metrics();
        let selection = SelectionContext::new(GridCell::new(4, 23 * 60 + 30), pos(&m, 4, 1410));
        match selection.to_request(week(), 60) {
            CreateRequest::SingleDay { end, .. } => assert_eq!(end, hm(23, 59)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
