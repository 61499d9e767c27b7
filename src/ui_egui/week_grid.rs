//! Week grid rendering and pointer plumbing.
//!
//! Paints the header, the all-day ribbon band and the hourly area from the
//! controller's placements, and translates raw egui pointer input into the
//! controller's pointer entry points.

use chrono::Local;
use egui::{Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use crate::grid::handles::{HandleRects, HANDLE_VISUAL_SIZE};
use crate::grid::layout::DAYS_PER_WEEK;
use crate::grid::{EventPlacement, GestureOutcome, GridController, PlacementKind};
use crate::models::event::{CalendarEvent, Mutation};
use crate::utils::date::{date_for_day, minutes_of};

pub const HEADER_HEIGHT: f32 = 28.0;
const DEFAULT_EVENT_COLOR: Color32 = Color32::from_rgb(100, 150, 200);

fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Parse a `#RRGGBB` string.
pub fn parse_color(hex: &str) -> Option<Color32> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Color32::from_rgb(r, g, b))
}

/// Fill for an event block. Writes still in flight are drawn translucent.
pub fn event_fill(event: &CalendarEvent) -> Color32 {
    let base = parse_color(event.display_color()).unwrap_or(DEFAULT_EVENT_COLOR);
    match event.mutation {
        Mutation::Pending => with_alpha(base, 150),
        Mutation::Committed(_) | Mutation::Failed(_) => base,
    }
}

/// Block label; unsynced events are flagged.
pub fn event_label(event: &CalendarEvent) -> String {
    match event.mutation {
        Mutation::Failed(_) => format!("⚠ {}", event.title),
        _ => event.title.clone(),
    }
}

#[derive(Clone, Copy)]
pub struct GridPalette {
    pub background: Color32,
    pub today_background: Color32,
    pub hour_line: Color32,
    pub half_hour_line: Color32,
    pub label: Color32,
    pub header_text: Color32,
    pub selection: Color32,
    pub now_line: Color32,
    pub failed_border: Color32,
}

impl GridPalette {
    pub fn from_visuals(visuals: &egui::Visuals) -> Self {
        let accent = visuals.selection.bg_fill;
        Self {
            background: visuals.extreme_bg_color,
            today_background: with_alpha(accent, 28),
            hour_line: visuals.widgets.noninteractive.bg_stroke.color,
            half_hour_line: with_alpha(visuals.widgets.noninteractive.bg_stroke.color, 90),
            label: Color32::GRAY,
            header_text: visuals.strong_text_color(),
            selection: accent,
            now_line: Color32::from_rgb(255, 100, 100),
            failed_border: Color32::from_rgb(220, 60, 60),
        }
    }
}

/// Total size the grid needs at the controller's current metrics.
pub fn grid_size(controller: &GridController, ribbon_rows: usize) -> Vec2 {
    let metrics = controller.metrics();
    let settings = controller.settings();
    Vec2::new(
        settings.time_label_width + metrics.grid_width(),
        HEADER_HEIGHT + ribbon_rows as f32 * metrics.ribbon_row_height + metrics.grid_height(),
    )
}

/// Renders the grid into `ui` and feeds this frame's pointer input to the
/// controller. Returns the outcome of any gesture that finished.
pub fn render_week_grid(ui: &mut egui::Ui, controller: &mut GridController, palette: &GridPalette) -> GestureOutcome {
    // Keep one empty ribbon row as a drop zone for all-day events
    let ribbon_rows = controller.ribbon_rows().max(1);
    let size = grid_size(controller, ribbon_rows);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

    let ribbon_top = rect.top() + HEADER_HEIGHT;
    let origin = Pos2::new(
        rect.left() + controller.settings().time_label_width,
        ribbon_top + ribbon_rows as f32 * controller.metrics().ribbon_row_height,
    );
    controller.set_grid_origin(origin, ribbon_top);

    let outcome = handle_pointer(ui, controller, rect, response.hovered());

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, palette.background);
    paint_background(&painter, controller, rect, palette);
    paint_events(&painter, ui, controller, palette);
    paint_preview(&painter, controller, palette);

    if !controller.gesture().is_idle() {
        ui.ctx().request_repaint();
    }
    outcome
}

/// Pointer input for one frame, already clipped to the grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerFrame {
    /// Pointer position when it is over the grid.
    pub inside: Option<Pos2>,
    pub pressed: bool,
    pub released: bool,
    pub hovered: bool,
    pub escape: bool,
}

fn handle_pointer(ui: &egui::Ui, controller: &mut GridController, rect: Rect, hovered: bool) -> GestureOutcome {
    let (pointer, pressed, released, escape) = ui.input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.key_pressed(egui::Key::Escape),
        )
    });
    let inside = pointer.filter(|p| rect.contains(*p) && ui.clip_rect().contains(*p));

    if controller.gesture().is_idle() && !pressed {
        if let Some((_, hit)) = inside.and_then(|pos| controller.hit_event(pos)) {
            ui.ctx().set_cursor_icon(hit.cursor_icon());
        }
    }

    dispatch_pointer(
        controller,
        PointerFrame {
            inside,
            pressed,
            released,
            hovered,
            escape,
        },
    )
}

/// Feeds one frame of pointer input to the controller.
pub fn dispatch_pointer(controller: &mut GridController, frame: PointerFrame) -> GestureOutcome {
    if frame.escape {
        return controller.cancel_gesture();
    }

    if let (Some(pos), true, true) = (frame.inside, frame.pressed, frame.hovered) {
        let outcome = controller.pointer_down(pos);
        // A fast click can press and release within one frame
        if frame.released && !controller.gesture().is_idle() {
            return controller.pointer_up(pos);
        }
        return outcome;
    }

    if controller.gesture().is_idle() {
        return GestureOutcome::None;
    }

    match (frame.inside, frame.released) {
        (Some(pos), true) => controller.pointer_up(pos),
        (None, true) => controller.cancel_gesture(),
        (Some(pos), false) => {
            controller.pointer_move(pos);
            GestureOutcome::None
        }
        (None, false) => controller.pointer_left(),
    }
}

fn paint_background(painter: &egui::Painter, controller: &GridController, rect: Rect, palette: &GridPalette) {
    let metrics = controller.metrics();
    let week_start = controller.week_start();
    let today = Local::now().date_naive();
    let timed = metrics.timed_area();

    for day in 0..DAYS_PER_WEEK {
        let date = date_for_day(week_start, day);
        let column = Rect::from_x_y_ranges(metrics.column_left(day)..=metrics.column_right(day), rect.y_range());
        if date == today {
            painter.rect_filled(column, 0.0, palette.today_background);
        }
        painter.text(
            Pos2::new(column.center().x, rect.top() + HEADER_HEIGHT / 2.0),
            egui::Align2::CENTER_CENTER,
            date.format("%a %d").to_string(),
            FontId::proportional(13.0),
            palette.header_text,
        );
        painter.line_segment(
            [
                Pos2::new(column.right(), rect.top()),
                Pos2::new(column.right(), rect.bottom()),
            ],
            Stroke::new(1.0, palette.hour_line),
        );
    }

    painter.line_segment(
        [Pos2::new(rect.left(), timed.top()), Pos2::new(rect.right(), timed.top())],
        Stroke::new(1.0, palette.hour_line),
    );

    for hour in 0..24u32 {
        let y = metrics.y_for_minutes(hour * 60);
        painter.line_segment(
            [Pos2::new(timed.left(), y), Pos2::new(timed.right(), y)],
            Stroke::new(1.0, palette.hour_line),
        );
        let half = metrics.y_for_minutes(hour * 60 + 30);
        painter.line_segment(
            [Pos2::new(timed.left(), half), Pos2::new(timed.right(), half)],
            Stroke::new(0.5, palette.half_hour_line),
        );
        painter.text(
            Pos2::new(timed.left() - 5.0, y),
            egui::Align2::RIGHT_TOP,
            format!("{:02}:00", hour),
            FontId::proportional(12.0),
            palette.label,
        );
    }

    // Current time indicator
    let now = Local::now();
    if let Some(day) = (0..DAYS_PER_WEEK).find(|d| date_for_day(week_start, *d) == now.date_naive()) {
        let y = metrics.y_for_minutes(minutes_of(now.time()));
        let (left, right) = (metrics.column_left(day), metrics.column_right(day));
        painter.circle_filled(Pos2::new(left - 4.0, y), 3.0, palette.now_line);
        painter.line_segment([Pos2::new(left, y), Pos2::new(right, y)], Stroke::new(2.0, palette.now_line));
    }
}

fn paint_events(painter: &egui::Painter, ui: &egui::Ui, controller: &GridController, palette: &GridPalette) {
    let dragged = controller.gesture_event_id();
    let hover = ui.input(|i| i.pointer.hover_pos());

    for placement in controller.visible_placements() {
        let Some(event) = controller.event(&placement.event_id) else {
            continue;
        };
        let mut fill = event_fill(event);
        if dragged == Some(event.id.as_str()) {
            fill = with_alpha(fill, 70);
        }
        paint_block(painter, &placement, event, fill, palette);

        if placement.is_timed() && hover.is_some_and(|p| placement.rect.contains(p)) {
            if let Some(center) = HandleRects::for_timed_event(placement.rect).grip_center() {
                let grip = Rect::from_center_size(center, Vec2::new(HANDLE_VISUAL_SIZE * 3.0, 2.0));
                painter.rect_filled(grip, 1.0, with_alpha(Color32::WHITE, 200));
            }
        }
    }
}

fn paint_block(
    painter: &egui::Painter,
    placement: &EventPlacement,
    event: &CalendarEvent,
    fill: Color32,
    palette: &GridPalette,
) {
    let rect = placement.rect.shrink2(Vec2::new(1.0, 0.5));
    let rounding = match placement.kind {
        PlacementKind::Ribbon { .. } => egui::Rounding::same(4.0),
        PlacementKind::Timed { .. } => egui::Rounding::same(2.0),
    };
    painter.rect_filled(rect, rounding, fill);
    if matches!(event.mutation, Mutation::Failed(_)) {
        painter.rect_stroke(rect, rounding, Stroke::new(1.5, palette.failed_border));
    }

    let label_pos = Pos2::new(rect.left() + 4.0, rect.top() + 2.0);
    let galley = painter.layout(
        event_label(event),
        FontId::proportional(11.0),
        Color32::WHITE,
        (rect.width() - 8.0).max(1.0),
    );
    painter.with_clip_rect(rect).galley(label_pos, galley, Color32::WHITE);
}

fn paint_preview(painter: &egui::Painter, controller: &GridController, palette: &GridPalette) {
    if let Some(preview) = controller.gesture_preview() {
        painter.rect_filled(preview, 2.0, with_alpha(palette.selection, 90));
        painter.rect_stroke(preview, 2.0, Stroke::new(1.5, palette.selection));
    }
}
