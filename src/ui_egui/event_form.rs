//! Floating create/edit form anchored next to the selection or event.

use egui::{Color32, Context, RichText};

use crate::grid::form::FormMode;
use crate::grid::GridController;
use crate::models::event::EVENT_PALETTE;

use super::week_grid::parse_color;

const FORM_WIDTH: f32 = 280.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    None,
    Saved(String),
    Cancelled,
    Trashed(String),
}

/// Renders the authoring form if one is open and applies the user's choice
/// to the controller.
pub fn render_event_form(ctx: &Context, controller: &mut GridController) -> FormAction {
    let Some(form) = controller.form_mut() else {
        return FormAction::None;
    };

    let title = match form.mode {
        FormMode::Create => "New Event",
        FormMode::Edit(_) => "Edit Event",
    };
    let editing = form.editing_id().map(str::to_string);
    let screen = ctx.screen_rect();
    let anchor = egui::pos2(
        (form.anchor.x + 12.0).min(screen.right() - FORM_WIDTH - 8.0).max(screen.left()),
        form.anchor.y.max(screen.top()),
    );

    let mut save = false;
    let mut cancel = false;
    let mut trash = false;

    egui::Window::new(title)
        .id(egui::Id::new("event_form"))
        .collapsible(false)
        .resizable(false)
        .default_width(FORM_WIDTH)
        .current_pos(anchor)
        .show(ctx, |ui| {
            egui::Grid::new("event_form_grid")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Title");
                    let title_edit = ui.text_edit_singleline(&mut form.title);
                    if form.title.is_empty() && !title_edit.has_focus() {
                        title_edit.request_focus();
                    }
                    ui.end_row();

                    ui.label("Date");
                    ui.text_edit_singleline(&mut form.date);
                    ui.end_row();

                    ui.label("End date");
                    ui.add(egui::TextEdit::singleline(&mut form.end_date).hint_text("same day"));
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut form.all_day, "All day");
                    ui.end_row();

                    if !form.all_day {
                        ui.label("Start");
                        ui.add(egui::TextEdit::singleline(&mut form.start_time).hint_text("HH:MM"));
                        ui.end_row();

                        ui.label("End");
                        ui.add(egui::TextEdit::singleline(&mut form.end_time).hint_text("HH:MM"));
                        ui.end_row();
                    }

                    ui.label("Color");
                    ui.horizontal(|ui| {
                        for swatch in EVENT_PALETTE {
                            let color = parse_color(swatch).unwrap_or(Color32::GRAY);
                            let selected = form.color.eq_ignore_ascii_case(swatch);
                            let label = if selected { "●" } else { "○" };
                            if ui
                                .add(egui::Button::new(RichText::new(label).color(color)).frame(false))
                                .clicked()
                            {
                                form.color = swatch.to_string();
                            }
                        }
                    });
                    ui.end_row();
                });

            ui.label("Description");
            ui.add(egui::TextEdit::multiline(&mut form.description).desired_rows(3));

            if let Some(error) = &form.error_message {
                ui.add_space(4.0);
                ui.label(RichText::new(error).color(Color32::from_rgb(220, 80, 80)));
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    save = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
                if editing.is_some() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑 Move to Trash").clicked() {
                            trash = true;
                        }
                    });
                }
            });
        });

    if ctx.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.command) {
        save = true;
    }

    if save {
        return match controller.submit_form() {
            Ok(id) => FormAction::Saved(id),
            Err(err) => {
                log::debug!("Form rejected: {}", err);
                FormAction::None
            }
        };
    }
    if trash {
        if let Some(id) = editing {
            controller.move_event_to_trash(&id);
            return FormAction::Trashed(id);
        }
    }
    if cancel {
        controller.close_form();
        return FormAction::Cancelled;
    }
    FormAction::None
}
