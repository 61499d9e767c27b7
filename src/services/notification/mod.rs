use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use notify_rust::{Notification, Timeout};

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fire-and-forget sink for user-facing messages. Delivery failures are the
/// sink's problem; callers never wait on or inspect the outcome.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Shared queue the UI drains into toasts each frame. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    inner: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.inner
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for NoticeQueue {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut queue) = self.inner.lock() {
            queue.push_back(Notice {
                level,
                message: message.to_string(),
            });
        }
    }
}

/// Writes notices to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success | NoticeLevel::Info => log::info!("{}", message),
            NoticeLevel::Warning => log::warn!("{}", message),
            NoticeLevel::Error => log::error!("{}", message),
        }
    }
}

/// Mirrors warnings and errors to the desktop notification daemon and
/// forwards everything to an inner sink.
pub struct DesktopNotificationSink<S> {
    inner: S,
    enabled: bool,
}

impl<S: NotificationSink> DesktopNotificationSink<S> {
    pub fn new(inner: S, enabled: bool) -> Self {
        Self { inner, enabled }
    }

    fn show(&self, level: NoticeLevel, message: &str) -> Result<()> {
        let timeout = match level {
            NoticeLevel::Error => Timeout::Milliseconds(10000),
            _ => Timeout::Milliseconds(5000),
        };

        Notification::new()
            .summary("Week Grid")
            .body(message)
            .timeout(timeout)
            .show()
            .map_err(|e| anyhow::anyhow!("Failed to show notification: {}", e))?;

        Ok(())
    }
}

impl<S: NotificationSink> NotificationSink for DesktopNotificationSink<S> {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.inner.notify(level, message);
        if self.enabled && matches!(level, NoticeLevel::Warning | NoticeLevel::Error) {
            if let Err(err) = self.show(level, message) {
                log::debug!("{}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_clones_share_storage() {
        let queue = NoticeQueue::new();
        let producer = queue.clone();
        producer.success("Trash emptied");
        producer.warning("Saved locally");

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert_eq!(drained[1].message, "Saved locally");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_disabled_desktop_sink_forwards_only() {
        let queue = NoticeQueue::new();
        let sink = DesktopNotificationSink::new(queue.clone(), false);
        sink.error("Delete failed");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_log_sink_accepts_all_levels() {
        let sink = LogSink;
        sink.notify(NoticeLevel::Info, "info");
        sink.success("ok");
        sink.warning("careful");
        sink.error("bad");
    }
}
