//! Confirmation dialogs for restoring trashed events and emptying the trash.

use egui::{Context, RichText};

use crate::grid::RestoreConfirmation;
use crate::utils::date::format_hhmm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// A trashed entry was dropped on the grid.
    RestoreEvent(RestoreConfirmation),
    /// Permanently delete every trashed entry.
    EmptyTrash { count: usize },
}

impl ConfirmAction {
    pub fn title(&self) -> &'static str {
        match self {
            ConfirmAction::RestoreEvent(_) => "Restore Event",
            ConfirmAction::EmptyTrash { .. } => "Empty Trash",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ConfirmAction::RestoreEvent(restore) => format!(
                "Restore \"{}\" to {} at {}?",
                restore.title,
                restore.date.format("%A, %B %d"),
                format_hhmm(restore.start)
            ),
            ConfirmAction::EmptyTrash { count } => format!(
                "Permanently delete {} event{}?\n\nThis action cannot be undone.",
                count,
                if *count == 1 { "" } else { "s" }
            ),
        }
    }

    pub fn confirm_text(&self) -> &'static str {
        match self {
            ConfirmAction::RestoreEvent(_) => "Restore",
            ConfirmAction::EmptyTrash { .. } => "Delete",
        }
    }

    /// Destructive actions get a red confirm button.
    pub fn is_destructive(&self) -> bool {
        matches!(self, ConfirmAction::EmptyTrash { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    Confirmed,
    Cancelled,
    /// Dialog is still open
    Pending,
}

#[derive(Debug, Default)]
pub struct ConfirmDialogState {
    pending_action: Option<ConfirmAction>,
}

impl ConfirmDialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, action: ConfirmAction) {
        self.pending_action = Some(action);
    }

    pub fn is_open(&self) -> bool {
        self.pending_action.is_some()
    }

    pub fn pending_action(&self) -> Option<&ConfirmAction> {
        self.pending_action.as_ref()
    }

    /// Render the dialog. On a decision the action is handed back with the
    /// result and the dialog closes.
    pub fn render(&mut self, ctx: &Context) -> (ConfirmResult, Option<ConfirmAction>) {
        let Some(action) = &self.pending_action else {
            return (ConfirmResult::Pending, None);
        };

        let mut result = ConfirmResult::Pending;

        egui::Window::new(action.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(300.0);
                ui.set_max_width(400.0);
                ui.add_space(10.0);

                if action.is_destructive() {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("⚠").size(24.0).color(egui::Color32::from_rgb(220, 150, 50)));
                        ui.vertical(|ui| {
                            ui.label(action.message());
                        });
                    });
                } else {
                    ui.label(action.message());
                }

                ui.add_space(15.0);
                ui.separator();
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let confirm_button = if action.is_destructive() {
                            egui::Button::new(RichText::new(action.confirm_text()).color(egui::Color32::WHITE))
                                .fill(egui::Color32::from_rgb(180, 60, 60))
                        } else {
                            egui::Button::new(action.confirm_text())
                        };

                        if ui.add(confirm_button).clicked() {
                            result = ConfirmResult::Confirmed;
                        }

                        ui.add_space(10.0);

                        if ui.button("Cancel").clicked() {
                            result = ConfirmResult::Cancelled;
                        }
                    });
                });

                ui.add_space(5.0);
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            result = ConfirmResult::Cancelled;
        }

        match result {
            ConfirmResult::Pending => (result, None),
            _ => (result, self.pending_action.take()),
        }
    }
}
