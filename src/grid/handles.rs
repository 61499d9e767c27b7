// Resize handle hit zones
//
// Only the bottom edge of a timed event is grabbable; dragging it moves the
// end time. Ribbon (all-day and multi-day) bars have no handles.

use egui::{CursorIcon, Pos2, Rect, Vec2};

/// Height of the bottom handle hit area
pub const HANDLE_SIZE: f32 = 8.0;
/// Visual size of the handle grip
pub const HANDLE_VISUAL_SIZE: f32 = 6.0;

/// Which part of an event a press landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventHit {
    Body,
    ResizeHandle,
}

impl EventHit {
    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            EventHit::Body => CursorIcon::Grab,
            EventHit::ResizeHandle => CursorIcon::ResizeVertical,
        }
    }
}

/// Handle rects for one placed event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleRects {
    pub bottom: Option<Rect>,
}

impl HandleRects {
    /// Bottom zone spanning the full width. Short events give the handle at
    /// most half their height so the body stays draggable.
    pub fn for_timed_event(event_rect: Rect) -> Self {
        let zone_height = HANDLE_SIZE.min(event_rect.height() / 2.0);
        Self {
            bottom: Some(Rect::from_min_size(
                Pos2::new(event_rect.left(), event_rect.bottom() - zone_height),
                Vec2::new(event_rect.width(), zone_height),
            )),
        }
    }

    pub fn for_ribbon_event() -> Self {
        Self { bottom: None }
    }

    /// Check if a point hits the event and which part of it
    pub fn hit_test(&self, event_rect: Rect, pos: Pos2) -> Option<EventHit> {
        if self.bottom.is_some_and(|r| r.contains(pos)) {
            Some(EventHit::ResizeHandle)
        } else if event_rect.contains(pos) {
            Some(EventHit::Body)
        } else {
            None
        }
    }

    /// Where the grip is drawn, just inside the bottom edge.
    pub fn grip_center(&self) -> Option<Pos2> {
        self.bottom
            .map(|r| Pos2::new(r.center().x, r.bottom() - HANDLE_VISUAL_SIZE / 2.0 - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(height: f32) -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 200.0), Vec2::new(80.0, height))
    }

    #[test]
    fn test_bottom_zone_hits_handle() {
        let event = rect(60.0);
        let handles = HandleRects::for_timed_event(event);
        assert_eq!(handles.hit_test(event, Pos2::new(140.0, 258.0)), Some(EventHit::ResizeHandle));
        assert_eq!(handles.hit_test(event, Pos2::new(140.0, 230.0)), Some(EventHit::Body));
        assert_eq!(handles.hit_test(event, Pos2::new(140.0, 270.0)), None);
    }

    #[test]
    fn test_short_event_keeps_body() {
        let event = rect(10.0);
        let handles = HandleRects::for_timed_event(event);
        assert_eq!(handles.bottom.unwrap().height(), 5.0);
        assert_eq!(handles.hit_test(event, Pos2::new(140.0, 202.0)), Some(EventHit::Body));
    }

    #[test]
    fn test_ribbon_has_no_handle() {
        let event = rect(20.0);
        let handles = HandleRects::for_ribbon_event();
        assert_eq!(handles.hit_test(event, Pos2::new(140.0, 219.0)), Some(EventHit::Body));
        assert!(handles.grip_center().is_none());
    }
}
