//! Toast notifications for brief feedback messages.
//!
//! Notices raised by the grid controller land in a [`NoticeQueue`]; each
//! frame the toast manager drains the queue and shows them bottom-right
//! until they fade.

use egui::{Color32, Context, Pos2, RichText};
use std::time::{Duration, Instant};

use crate::services::notification::{Notice, NoticeLevel, NoticeQueue};

const TOAST_DURATION: Duration = Duration::from_secs(3);
const WARNING_DURATION: Duration = Duration::from_secs(6);
const FADE: Duration = Duration::from_millis(500);

fn icon(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Info => "ℹ",
        NoticeLevel::Warning => "⚠",
        NoticeLevel::Error => "✗",
    }
}

fn background_color(level: NoticeLevel, is_dark_theme: bool) -> Color32 {
    if is_dark_theme {
        match level {
            NoticeLevel::Success => Color32::from_rgb(30, 70, 40),
            NoticeLevel::Info => Color32::from_rgb(30, 50, 80),
            NoticeLevel::Warning => Color32::from_rgb(80, 60, 20),
            NoticeLevel::Error => Color32::from_rgb(80, 30, 30),
        }
    } else {
        match level {
            NoticeLevel::Success => Color32::from_rgb(220, 255, 220),
            NoticeLevel::Info => Color32::from_rgb(220, 235, 255),
            NoticeLevel::Warning => Color32::from_rgb(255, 245, 200),
            NoticeLevel::Error => Color32::from_rgb(255, 220, 220),
        }
    }
}

fn text_color(level: NoticeLevel, is_dark_theme: bool) -> Color32 {
    if is_dark_theme {
        match level {
            NoticeLevel::Success => Color32::from_rgb(100, 220, 120),
            NoticeLevel::Info => Color32::from_rgb(100, 180, 255),
            NoticeLevel::Warning => Color32::from_rgb(255, 200, 80),
            NoticeLevel::Error => Color32::from_rgb(255, 120, 120),
        }
    } else {
        match level {
            NoticeLevel::Success => Color32::from_rgb(30, 120, 50),
            NoticeLevel::Info => Color32::from_rgb(30, 80, 150),
            NoticeLevel::Warning => Color32::from_rgb(150, 100, 0),
            NoticeLevel::Error => Color32::from_rgb(180, 40, 40),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        // Problems stay up longer than confirmations
        let duration = match level {
            NoticeLevel::Warning | NoticeLevel::Error => WARNING_DURATION,
            NoticeLevel::Success | NoticeLevel::Info => TOAST_DURATION,
        };
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.duration
    }

    /// Opacity at `now`, fading out over the last half second.
    pub fn opacity_at(&self, now: Instant) -> f32 {
        let elapsed = now.duration_since(self.created_at);
        let fade_start = self.duration.saturating_sub(FADE);

        if elapsed >= self.duration {
            0.0
        } else if elapsed >= fade_start {
            let fade_progress = (self.duration - elapsed).as_secs_f32() / FADE.as_secs_f32();
            fade_progress.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl From<Notice> for Toast {
    fn from(notice: Notice) -> Self {
        Toast::new(notice.message, notice.level)
    }
}

#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: Vec<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    /// Moves every queued notice into a toast.
    pub fn absorb(&mut self, queue: &NoticeQueue) {
        self.toasts.extend(queue.drain().into_iter().map(Toast::from));
    }

    pub fn cleanup(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired_at(now));
    }

    pub fn has_toasts(&self) -> bool {
        !self.toasts.is_empty()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn render(&mut self, ctx: &Context, is_dark_theme: bool) {
        let now = Instant::now();
        self.cleanup(now);

        if self.toasts.is_empty() {
            return;
        }

        // Keep repainting while toasts fade
        ctx.request_repaint();

        let screen_rect = ctx.screen_rect();
        let toast_width = 300.0;
        let toast_height = 40.0;
        let margin = 10.0;
        let spacing = 5.0;

        for (i, toast) in self.toasts.iter().enumerate() {
            let opacity = toast.opacity_at(now);
            if opacity <= 0.0 {
                continue;
            }

            let y_offset = (i as f32) * (toast_height + spacing);
            let pos = Pos2::new(
                screen_rect.right() - toast_width - margin,
                screen_rect.bottom() - toast_height - margin - y_offset,
            );

            egui::Area::new(egui::Id::new(("toast", i)))
                .fixed_pos(pos)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    let bg = background_color(toast.level, is_dark_theme);
                    let fg = text_color(toast.level, is_dark_theme);
                    let bg = Color32::from_rgba_unmultiplied(bg.r(), bg.g(), bg.b(), (230.0 * opacity) as u8);
                    let fg = Color32::from_rgba_unmultiplied(fg.r(), fg.g(), fg.b(), (255.0 * opacity) as u8);

                    egui::Frame::none()
                        .fill(bg)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .stroke(egui::Stroke::new(1.0, fg.gamma_multiply(0.3)))
                        .show(ui, |ui| {
                            ui.set_min_width(toast_width - 24.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(icon(toast.level)).color(fg).strong());
                                ui.label(RichText::new(&toast.message).color(fg));
                            });
                        });
                });
        }
    }
}
