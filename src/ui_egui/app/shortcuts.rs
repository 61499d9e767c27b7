use super::WeekGridApp;
use crate::ui_egui::confirm::ConfirmAction;

impl WeekGridApp {
    pub(super) fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        // Dialogs own the keyboard while open
        if self.confirm_dialog.is_open() {
            return;
        }

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Escape) && self.controller.gesture().is_idle() && self.controller.form().is_some() {
                self.controller.close_form();
            }

            if self.controller.form().is_some() {
                return;
            }

            if i.modifiers.ctrl && i.key_pressed(egui::Key::T) {
                self.controller.today();
            }

            if i.modifiers.ctrl && i.key_pressed(egui::Key::R) {
                self.controller.refresh();
            }

            if i.key_pressed(egui::Key::ArrowLeft) && !i.modifiers.ctrl {
                self.controller.previous_week();
            }

            if i.key_pressed(egui::Key::ArrowRight) && !i.modifiers.ctrl {
                self.controller.next_week();
            }

            if i.modifiers.ctrl && i.modifiers.shift && i.key_pressed(egui::Key::Delete) {
                let count = self.controller.trash_entries().len();
                if count > 0 {
                    self.confirm_dialog.request(ConfirmAction::EmptyTrash { count });
                }
            }
        });
    }
}
