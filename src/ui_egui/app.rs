mod shortcuts;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Duration as ChronoDuration;

use crate::grid::{GestureOutcome, GridController};
use crate::models::settings::GridSettings;
use crate::services::local_store::LocalStore;
use crate::services::notification::{NoticeQueue, NotificationSink};
use crate::services::remote::EventService;
use crate::ui_egui::confirm::{ConfirmAction, ConfirmDialogState, ConfirmResult};
use crate::ui_egui::event_form::{render_event_form, FormAction};
use crate::ui_egui::toast::ToastManager;
use crate::ui_egui::trash_panel::{render_trash_panel, TrashPanelAction, TRASH_PANEL_WIDTH};
use crate::ui_egui::week_grid::{render_week_grid, GridPalette};

const MIN_ROOT_WIDTH: f32 = 640.0;
/// How often to poll for remote results while calls are in flight.
const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WeekGridApp {
    controller: GridController,
    notices: NoticeQueue,
    toast_manager: ToastManager,
    confirm_dialog: ConfirmDialogState,
    show_trash: bool,
}

impl WeekGridApp {
    /// Builds the controller and loads the cached week. `notifier` receives
    /// every notice; `notices` is the queue the toasts are drawn from.
    pub fn new(
        settings: GridSettings,
        service: Arc<dyn EventService>,
        store: LocalStore,
        notices: NoticeQueue,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let mut controller = GridController::new(settings, service, store, notifier)?;
        let cached = controller.load_existing_events();
        log::info!("Week grid ready with {} cached events", cached);

        Ok(Self {
            controller,
            notices,
            toast_manager: ToastManager::new(),
            confirm_dialog: ConfirmDialogState::new(),
            show_trash: true,
        })
    }

    pub fn controller(&self) -> &GridController {
        &self.controller
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("◀").on_hover_text("Previous week").clicked() {
                self.controller.previous_week();
            }
            if ui.button("Today").clicked() {
                self.controller.today();
            }
            if ui.button("▶").on_hover_text("Next week").clicked() {
                self.controller.next_week();
            }

            let start = self.controller.week_start().date_naive();
            let end = start + ChronoDuration::days(6);
            ui.heading(format!("{} – {}", start.format("%b %d"), end.format("%b %d, %Y")));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.show_trash { "Hide Trash" } else { "Show Trash" };
                if ui.button(label).clicked() {
                    self.show_trash = !self.show_trash;
                }
                if ui.button("⟳ Refresh").clicked() {
                    self.controller.refresh();
                }
                if self.controller.sync_in_flight() > 0 {
                    ui.spinner();
                }
            });
        });
    }

    fn handle_gesture_outcome(&mut self, outcome: GestureOutcome) {
        match outcome {
            GestureOutcome::RestorePrompt(confirmation) => {
                self.confirm_dialog.request(ConfirmAction::RestoreEvent(confirmation));
            }
            GestureOutcome::Moved(id) | GestureOutcome::Resized(id) => {
                log::debug!("Event {} changed by gesture", id);
            }
            _ => {}
        }
    }

    fn handle_confirm_dialog(&mut self, ctx: &egui::Context) {
        match self.confirm_dialog.render(ctx) {
            (ConfirmResult::Confirmed, Some(ConfirmAction::RestoreEvent(_))) => {
                self.controller.confirm_restore();
            }
            (ConfirmResult::Cancelled, Some(ConfirmAction::RestoreEvent(_))) => {
                self.controller.decline_restore();
            }
            (ConfirmResult::Confirmed, Some(ConfirmAction::EmptyTrash { .. })) => {
                let report = self.controller.empty_trash();
                log::info!(
                    "Emptied trash: {} removed, {} remote deletes",
                    report.removed,
                    report.remote_deletes
                );
            }
            _ => {}
        }
    }
}

impl eframe::App for WeekGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.controller.poll_sync() > 0 {
            ctx.request_repaint();
        }
        self.handle_keyboard_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.render_toolbar(ui));

        let mut sidebar_width = 0.0;
        if self.show_trash {
            let panel = egui::SidePanel::right("trash_panel")
                .resizable(false)
                .exact_width(TRASH_PANEL_WIDTH)
                .show(ctx, |ui| render_trash_panel(ui, &mut self.controller));
            sidebar_width = panel.response.rect.width();
            if let TrashPanelAction::EmptyRequested(count) = panel.inner {
                self.confirm_dialog.request(ConfirmAction::EmptyTrash { count });
            }
        }

        let available = ctx.screen_rect().width().max(MIN_ROOT_WIDTH);
        self.controller.observe_viewport(available, sidebar_width, Instant::now());

        let palette = GridPalette::from_visuals(&ctx.style().visuals);
        let outcome = egui::CentralPanel::default()
            .show(ctx, |ui| {
                egui::ScrollArea::both()
                    .auto_shrink([false, false])
                    .show(ui, |ui| render_week_grid(ui, &mut self.controller, &palette))
                    .inner
            })
            .inner;
        self.handle_gesture_outcome(outcome);

        if let FormAction::Saved(id) = render_event_form(ctx, &mut self.controller) {
            log::debug!("Saved event {}", id);
        }
        self.handle_confirm_dialog(ctx);

        self.toast_manager.absorb(&self.notices);
        self.toast_manager.render(ctx, ctx.style().visuals.dark_mode);

        if self.controller.viewport_settling() {
            ctx.request_repaint_after(Duration::from_millis(self.controller.settings().resize_debounce_ms));
        }
        if self.controller.sync_in_flight() > 0 {
            ctx.request_repaint_after(SYNC_POLL_INTERVAL);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let drained = self.controller.wait_for_sync(Duration::from_secs(2));
        log::info!("Shutting down after applying {} pending sync results", drained);
    }
}
