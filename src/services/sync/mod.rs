// Sync dispatcher
// Runs Event Service calls off the UI thread and reports results over a channel

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinSet;

use crate::services::remote::{EventPatch, EventService, OutboundEvent, RemoteError};

/// Outcome of one background purge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeSummary {
    pub attempted: usize,
    pub failed: usize,
}

/// Result of a background call, delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    Created {
        local_id: String,
        result: Result<String, RemoteError>,
    },
    Updated {
        local_id: String,
        seq: u64,
        result: Result<(), RemoteError>,
    },
    Deleted {
        server_id: String,
        result: Result<(), RemoteError>,
    },
    PurgeFinished(PurgeSummary),
    Fetched(Result<Vec<Value>, RemoteError>),
}

/// Fire-and-forget executor for remote calls. Each call runs on the tokio
/// blocking pool and posts exactly one [`SyncMessage`] when it finishes.
pub struct SyncDispatcher {
    runtime: Runtime,
    service: Arc<dyn EventService>,
    calendar_id: String,
    tx: Sender<SyncMessage>,
    rx: Receiver<SyncMessage>,
    in_flight: Arc<AtomicUsize>,
}

impl SyncDispatcher {
    pub fn new(service: Arc<dyn EventService>, calendar_id: impl Into<String>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("week-grid-sync")
            .enable_all()
            .build()
            .context("Failed to start sync runtime")?;
        let (tx, rx) = mpsc::channel();

        Ok(Self {
            runtime,
            service,
            calendar_id: calendar_id.into(),
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Calls that have been dispatched but not yet reported.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn spawn<F>(&self, call: F)
    where
        F: FnOnce(&dyn EventService, &str) -> SyncMessage + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let calendar_id = self.calendar_id.clone();
        let tx = self.tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);

        self.runtime.spawn_blocking(move || {
            let message = call(service.as_ref(), &calendar_id);
            if tx.send(message).is_err() {
                log::debug!("Sync result dropped; controller is gone");
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    pub fn spawn_fetch(&self) {
        log::debug!("Fetching events for calendar {}", self.calendar_id);
        self.spawn(|service, calendar_id| SyncMessage::Fetched(service.list_events(calendar_id)));
    }

    pub fn spawn_create(&self, local_id: String, event: OutboundEvent) {
        log::debug!("Creating remote event for {}", local_id);
        self.spawn(move |service, calendar_id| SyncMessage::Created {
            result: service.create_event(calendar_id, &event),
            local_id,
        });
    }

    pub fn spawn_update(&self, local_id: String, seq: u64, server_id: String, patch: EventPatch) {
        log::debug!("Updating remote event {} (seq {})", server_id, seq);
        self.spawn(move |service, calendar_id| SyncMessage::Updated {
            result: service.update_event(calendar_id, &server_id, &patch),
            local_id,
            seq,
        });
    }

    pub fn spawn_delete(&self, server_id: String) {
        log::debug!("Deleting remote event {}", server_id);
        self.spawn(move |service, calendar_id| SyncMessage::Deleted {
            result: service.delete_event(calendar_id, &server_id),
            server_id,
        });
    }

    /// Deletes every id concurrently and independently. A missing event
    /// counts as deleted; other failures are only logged.
    pub fn purge(&self, server_ids: Vec<String>) {
        if server_ids.is_empty() {
            return;
        }
        let service = Arc::clone(&self.service);
        let calendar_id = self.calendar_id.clone();
        let tx = self.tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);

        self.runtime.spawn(async move {
            let mut deletes = JoinSet::new();
            for server_id in server_ids {
                let service = Arc::clone(&service);
                let calendar_id = calendar_id.clone();
                deletes.spawn_blocking(move || {
                    let result = service.delete_event(&calendar_id, &server_id);
                    (server_id, result)
                });
            }

            let mut summary = PurgeSummary::default();
            while let Some(joined) = deletes.join_next().await {
                summary.attempted += 1;
                match joined {
                    Ok((server_id, Ok(()))) => log::info!("Purged remote event {}", server_id),
                    Ok((server_id, Err(RemoteError::NotFound))) => {
                        log::info!("Remote event {} was already gone", server_id)
                    }
                    Ok((server_id, Err(err))) => {
                        summary.failed += 1;
                        log::error!("Failed to purge remote event {}: {}", server_id, err);
                    }
                    Err(err) => {
                        summary.failed += 1;
                        log::error!("Purge task aborted: {}", err);
                    }
                }
            }

            if tx.send(SyncMessage::PurgeFinished(summary)).is_err() {
                log::debug!("Purge summary dropped; controller is gone");
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Results that have arrived so far, without blocking.
    pub fn drain(&self) -> Vec<SyncMessage> {
        self.rx.try_iter().collect()
    }

    /// Blocks until every dispatched call has reported or `timeout` passes,
    /// returning everything received.
    pub fn settle(&self, timeout: Duration) -> Vec<SyncMessage> {
        let deadline = Instant::now() + timeout;
        let mut messages = Vec::new();
        loop {
            messages.extend(self.rx.try_iter());
            if self.in_flight() == 0 {
                messages.extend(self.rx.try_iter());
                return messages;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("{} sync calls still running after {:?}", self.in_flight(), timeout);
                return messages;
            }
            match self.rx.recv_timeout(remaining.min(Duration::from_millis(20))) {
                Ok(message) => messages.push(message),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return messages,
            }
        }
    }
}
