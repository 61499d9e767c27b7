//! Trash side panel: drag sources for restoring and the Empty Trash button.

use egui::{Color32, RichText, Sense};

use crate::grid::GridController;
use crate::models::trash::TrashEntry;
use crate::utils::date::format_hhmm;

use super::week_grid::parse_color;

pub const TRASH_PANEL_WIDTH: f32 = 220.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrashPanelAction {
    None,
    /// Ask before permanently deleting this many entries.
    EmptyRequested(usize),
}

/// One-line summary of where a trashed event used to be.
pub fn entry_summary(entry: &TrashEntry) -> String {
    let event = &entry.event;
    let day = event.date.format("%a %b %d");
    match (event.is_all_day, event.start_time, event.end_time) {
        (false, Some(start), Some(end)) => {
            format!("{} {}–{}", day, format_hhmm(start), format_hhmm(end))
        }
        _ => format!("{} all day", day),
    }
}

pub fn render_trash_panel(ui: &mut egui::Ui, controller: &mut GridController) -> TrashPanelAction {
    let mut action = TrashPanelAction::None;

    ui.horizontal(|ui| {
        ui.heading("Trash");
        ui.label(RichText::new(format!("({})", controller.trash_entries().len())).weak());
    });
    ui.label(RichText::new("Drag an event onto the grid to restore it.").small().weak());
    ui.separator();

    let mut drag_started: Option<String> = None;
    egui::ScrollArea::vertical()
        .max_height(ui.available_height() - 40.0)
        .show(ui, |ui| {
            if controller.trash_entries().is_empty() {
                ui.label(RichText::new("Trash is empty").italics().weak());
            }
            for entry in controller.trash_entries() {
                let color = parse_color(entry.event.display_color()).unwrap_or(Color32::GRAY);
                let response = egui::Frame::group(ui.style())
                    .show(ui, |ui| {
                        ui.set_min_width(ui.available_width());
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("■").color(color));
                            ui.label(RichText::new(&entry.event.title).strong());
                        });
                        ui.label(RichText::new(entry_summary(entry)).small());
                    })
                    .response
                    .interact(Sense::drag());

                if response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                }
                if response.drag_started() {
                    drag_started = Some(entry.id().to_string());
                }
            }
        });

    if let Some(id) = drag_started {
        if controller.begin_trash_drag(&id) {
            log::debug!("Dragging trashed event {}", id);
        }
    }

    ui.separator();
    let count = controller.trash_entries().len();
    let button = egui::Button::new(RichText::new("Empty Trash").color(Color32::WHITE))
        .fill(Color32::from_rgb(180, 60, 60));
    if ui.add_enabled(count > 0, button).clicked() {
        action = TrashPanelAction::EmptyRequested(count);
    }

    action
}
