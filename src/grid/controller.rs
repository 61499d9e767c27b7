//! The grid controller.
//!
//! One object owns everything the week grid needs at runtime: the displayed
//! week, the geometry, the active gesture, the authoring form, the working
//! set, the trash, the client-side cache and the sync dispatcher. Every entry
//! point is synchronous and infallible from the caller's point of view;
//! failures degrade to "kept locally" plus a notification.

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use egui::{Pos2, Rect};

use super::drag::{DragContext, DragPayload};
use super::form::{AuthoringForm, FormError, FormMode};
use super::handles::{EventHit, HandleRects};
use super::layout::{
    place_event, place_events, ribbon_rows_needed, EventPlacement, GridCell, GridMetrics, PlacementKind,
    ViewportTracker,
};
use super::resize::ResizeContext;
use super::selection::{CreateRequest, SelectionContext};
use crate::models::event::{CalendarEvent, Mutation};
use crate::models::settings::GridSettings;
use crate::models::trash::TrashEntry;
use crate::services::local_store::LocalStore;
use crate::services::normalize::Normalizer;
use crate::services::notification::{NoticeLevel, NotificationSink};
use crate::services::remote::{EventPatch, EventService, OutboundEvent, RemoteError};
use crate::services::sync::{SyncDispatcher, SyncMessage};
use crate::services::trash::TrashBin;
use crate::services::working_set::{CreateResolution, UpdateResolution, WorkingSet};
use crate::utils::date::{date_for_day, local_noon, minutes_of, week_start};

/// The pointer gesture in progress. Exactly one is active at a time.
#[derive(Clone, Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Selecting(SelectionContext),
    DraggingEvent(DragContext),
    ResizingEvent(ResizeContext),
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }
}

/// A trashed entry dropped on the grid, waiting for the user to confirm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreConfirmation {
    pub event_id: String,
    pub title: String,
    pub day: u8,
    pub date: NaiveDate,
    pub start: NaiveTime,
}

/// What a finished gesture asks of the host.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    None,
    /// A range was selected; the create form is open.
    CreateRequested(CreateRequest),
    /// An event was clicked; the edit form is open.
    EditRequested(String),
    Moved(String),
    Resized(String),
    /// A trashed entry was dropped; ask before restoring.
    RestorePrompt(RestoreConfirmation),
    Cancelled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyTrashReport {
    pub removed: usize,
    /// Remote deletes dispatched for server-backed entries.
    pub remote_deletes: usize,
}

pub struct GridController {
    settings: GridSettings,
    week_start: DateTime<Local>,
    metrics: GridMetrics,
    viewport: ViewportTracker,
    gesture: GestureState,
    form: Option<AuthoringForm>,
    pending_restore: Option<RestoreConfirmation>,
    working: WorkingSet,
    trash: TrashBin,
    store: LocalStore,
    sync: SyncDispatcher,
    notifier: Arc<dyn NotificationSink>,
}

impl GridController {
    pub fn new(
        settings: GridSettings,
        service: Arc<dyn EventService>,
        store: LocalStore,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let sync = SyncDispatcher::new(service, settings.calendar_id.clone())?;
        Ok(Self {
            week_start: week_start(Local::now()),
            metrics: GridMetrics::new(&settings),
            viewport: ViewportTracker::new(StdDuration::from_millis(settings.resize_debounce_ms)),
            gesture: GestureState::Idle,
            form: None,
            pending_restore: None,
            working: WorkingSet::new(),
            trash: TrashBin::new(),
            store,
            sync,
            notifier,
            settings,
        })
    }

    /// Same as [`GridController::new`] but showing the week containing `date`.
    pub fn with_week(mut self, date: NaiveDate) -> Self {
        self.set_week(date);
        self
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    pub fn week_start(&self) -> DateTime<Local> {
        self.week_start
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn form(&self) -> Option<&AuthoringForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut AuthoringForm> {
        self.form.as_mut()
    }

    pub fn pending_restore(&self) -> Option<&RestoreConfirmation> {
        self.pending_restore.as_ref()
    }

    pub fn events(&self) -> &[CalendarEvent] {
        self.working.events()
    }

    pub fn event(&self, id: &str) -> Option<&CalendarEvent> {
        self.working.get(id)
    }

    pub fn trash_entries(&self) -> &[TrashEntry] {
        self.trash.entries()
    }

    pub fn is_tombstoned(&self, id: &str) -> bool {
        self.trash.is_tombstoned(id)
    }

    /// Remote calls dispatched but not yet reported back.
    pub fn sync_in_flight(&self) -> usize {
        self.sync.in_flight()
    }

    /// Drops the gesture, the form and any pending restore prompt.
    pub fn reset(&mut self) {
        self.gesture = GestureState::Idle;
        self.form = None;
        self.pending_restore = None;
    }

    // ----- week navigation -------------------------------------------------

    pub fn set_week(&mut self, date: NaiveDate) {
        let start = week_start(local_noon(date));
        if start != self.week_start {
            self.week_start = start;
            self.gesture = GestureState::Idle;
        }
    }

    pub fn next_week(&mut self) {
        self.set_week(self.week_start.date_naive() + Duration::days(7));
    }

    pub fn previous_week(&mut self) {
        self.set_week(self.week_start.date_naive() - Duration::days(7));
    }

    pub fn today(&mut self) {
        self.set_week(Local::now().date_naive());
    }

    // ----- geometry ----------------------------------------------------------

    /// Feeds the current viewport size. Width changes are debounced; sidebar
    /// changes apply at once. Returns true when the column width changed.
    pub fn observe_viewport(&mut self, available_width: f32, sidebar_width: f32, now: Instant) -> bool {
        let applied = self
            .viewport
            .observe(available_width, sidebar_width, now)
            .or_else(|| self.viewport.settle(now));
        match applied {
            Some((width, sidebar)) => {
                let fresh = GridMetrics::from_viewport(width, sidebar, &self.settings);
                let changed = fresh.column_width != self.metrics.column_width;
                self.metrics.column_width = fresh.column_width;
                changed
            }
            None => false,
        }
    }

    pub fn viewport_settling(&self) -> bool {
        self.viewport.has_pending()
    }

    /// Pins the grid to where the host painted it this frame.
    pub fn set_grid_origin(&mut self, origin: Pos2, ribbon_top: f32) {
        self.metrics = self.metrics.with_origin(origin).with_ribbon_top(ribbon_top);
    }

    // ----- rendering ---------------------------------------------------------

    fn is_visible(&self, event: &CalendarEvent) -> bool {
        !self.trash.hides(event)
    }

    /// Placement of a single active event, or `None` when it is hidden or
    /// outside the displayed week.
    pub fn render_event(&self, id: &str) -> Option<EventPlacement> {
        let event = self.working.get(id).filter(|e| self.is_visible(e))?;
        place_event(event, self.week_start, &self.metrics)
    }

    /// Placements of every visible active event in the displayed week.
    pub fn visible_placements(&self) -> Vec<EventPlacement> {
        place_events(
            self.working.iter().filter(|e| self.is_visible(e)),
            self.week_start,
            &self.metrics,
        )
    }

    pub fn ribbon_rows(&self) -> usize {
        ribbon_rows_needed(&self.visible_placements())
    }

    /// Preview of the gesture in progress, if it has one.
    pub fn gesture_preview(&self) -> Option<Rect> {
        match &self.gesture {
            GestureState::Idle => None,
            GestureState::Selecting(selection) => {
                selection.preview_rect(&self.metrics, self.settings.default_event_minutes)
            }
            GestureState::DraggingEvent(drag) => drag.preview_rect(&self.metrics),
            GestureState::ResizingEvent(resize) => resize
                .moved
                .then(|| resize.preview_rect(&self.metrics)),
        }
    }

    /// Id of the event being dragged or resized.
    pub fn gesture_event_id(&self) -> Option<&str> {
        match &self.gesture {
            GestureState::DraggingEvent(drag) => Some(drag.payload.event_id()),
            GestureState::ResizingEvent(resize) => Some(&resize.event_id),
            _ => None,
        }
    }

    // ----- lifecycle ---------------------------------------------------------

    /// Loads the cache, sweeps expired tombstones and starts a remote fetch
    /// that will replace the working set. Returns the number of cached
    /// events shown right away.
    pub fn load_existing_events(&mut self) -> usize {
        let events = self.store.load_events().unwrap_or_else(|err| {
            log::error!("Failed to load cached events: {:#}", err);
            Vec::new()
        });
        let entries = self.store.load_trash().unwrap_or_else(|err| {
            log::error!("Failed to load cached trash: {:#}", err);
            Vec::new()
        });
        let tombstones = self.store.load_tombstones().unwrap_or_else(|err| {
            log::error!("Failed to load tombstones: {:#}", err);
            Default::default()
        });

        self.trash = TrashBin::from_parts(entries, tombstones);
        let purged = self
            .trash
            .purge_expired(Utc::now(), self.settings.tombstone_retention_days);
        if purged > 0 {
            log::info!("Purged {} expired tombstones", purged);
        }
        self.persist_tombstones();

        let visible: Vec<CalendarEvent> = events
            .into_iter()
            .filter(|e| !self.trash.hides(e))
            .collect();
        self.working = WorkingSet::from_events(visible);
        log::info!(
            "Loaded {} cached events, {} in trash",
            self.working.len(),
            self.trash.len()
        );

        self.sync.spawn_fetch();
        self.working.len()
    }

    /// Starts a remote fetch outside of init.
    pub fn refresh(&self) {
        self.sync.spawn_fetch();
    }

    // ----- trash -------------------------------------------------------------

    /// Moves an active event to the trash and deletes its remote copy when it
    /// has one. Unknown or already trashed ids are ignored.
    pub fn move_event_to_trash(&mut self, id: &str) -> bool {
        let Some(event) = self.working.remove(id) else {
            log::debug!("Ignoring trash request for unknown event {}", id);
            return false;
        };
        if self.gesture_event_id() == Some(id) {
            self.gesture = GestureState::Idle;
        }
        if self.form.as_ref().and_then(|f| f.editing_id()) == Some(id) {
            self.form = None;
        }

        if let Some(server_id) = &event.server_id {
            self.sync.spawn_delete(server_id.clone());
        }
        let title = event.title.clone();
        if !self.trash.add(event, Utc::now()) {
            log::warn!("Event {} was already trashed or purged", id);
        }
        self.persist_events();
        self.persist_trash();
        self.notifier
            .notify(NoticeLevel::Info, &format!("Moved \"{}\" to trash", title));
        true
    }

    pub fn restore_event_from_trash(&mut self, id: &str, day: u8, hour: u32) -> bool {
        self.restore_event_from_trash_at(id, day, hour.min(23) * 60)
    }

    /// Restores a trashed entry onto `day` at `start_minutes`, keeping its id
    /// and duration. Entries whose remote copy is gone are recreated.
    pub fn restore_event_from_trash_at(&mut self, id: &str, day: u8, start_minutes: u32) -> bool {
        if day > 6 {
            return false;
        }
        let date = date_for_day(self.week_start, day);
        let Some(event) = self.trash.restore(id, date, start_minutes) else {
            log::debug!("Ignoring restore of {}: not in trash", id);
            return false;
        };

        let title = event.title.clone();
        let needs_create = !event.is_server_backed();
        let outbound = OutboundEvent::from(&event);
        self.working.upsert(event);
        if needs_create {
            self.sync.spawn_create(id.to_string(), outbound);
        }
        self.persist_events();
        self.persist_trash();
        self.notifier.success(&format!("Restored \"{}\"", title));
        true
    }

    /// Permanently deletes everything in the trash. Local state (tombstones,
    /// cleared trash, notification) is settled before any network call; the
    /// remote deletes then run concurrently in the background.
    pub fn empty_trash(&mut self) -> EmptyTrashReport {
        let emptied = self.trash.empty(Utc::now());
        if emptied.removed.is_empty() {
            return EmptyTrashReport::default();
        }
        self.persist_trash();
        self.persist_tombstones();

        let removed = emptied.removed.len();
        self.notifier.success(&format!(
            "Permanently deleted {} event{}",
            removed,
            if removed == 1 { "" } else { "s" }
        ));

        let remote_deletes = emptied.server_ids.len();
        self.sync.purge(emptied.server_ids);
        EmptyTrashReport {
            removed,
            remote_deletes,
        }
    }

    // ----- pointer input -----------------------------------------------------

    /// Topmost placed event under `pos` and which part of it was hit.
    pub fn hit_event(&self, pos: Pos2) -> Option<(EventPlacement, EventHit)> {
        self.visible_placements().into_iter().rev().find_map(|placement| {
            let handles = match placement.kind {
                PlacementKind::Timed { .. } => HandleRects::for_timed_event(placement.rect),
                PlacementKind::Ribbon { .. } => HandleRects::for_ribbon_event(),
            };
            handles
                .hit_test(placement.rect, pos)
                .map(|hit| (placement, hit))
        })
    }

    pub fn pointer_down(&mut self, pos: Pos2) -> GestureOutcome {
        if self.form.is_some() || !self.gesture.is_idle() {
            return GestureOutcome::None;
        }

        if let Some((placement, hit)) = self.hit_event(pos) {
            let Some(event) = self.working.get(&placement.event_id) else {
                return GestureOutcome::None;
            };
            let resize = (hit == EventHit::ResizeHandle)
                .then(|| ResizeContext::new(event, placement.rect, pos))
                .flatten();
            self.gesture = match resize {
                Some(resize) => GestureState::ResizingEvent(resize),
                None => GestureState::DraggingEvent(DragContext::for_event(
                    event,
                    &placement,
                    pos,
                    &self.metrics,
                )),
            };
            return GestureOutcome::None;
        }

        if let Some(cell) = self.metrics.cell_at(pos) {
            self.gesture = GestureState::Selecting(SelectionContext::new(cell, pos));
        }
        GestureOutcome::None
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        let metrics = self.metrics;
        match &mut self.gesture {
            GestureState::Idle => {}
            GestureState::Selecting(selection) => selection.update(pos, &metrics),
            GestureState::DraggingEvent(drag) => drag.update(pos, &metrics),
            GestureState::ResizingEvent(resize) => resize.update(pos, &metrics),
        }
    }

    pub fn pointer_up(&mut self, pos: Pos2) -> GestureOutcome {
        self.pointer_move(pos);
        match std::mem::take(&mut self.gesture) {
            GestureState::Idle => GestureOutcome::None,
            GestureState::Selecting(selection) => {
                let request = selection.to_request(self.week_start, self.settings.default_event_minutes);
                self.open_create_form(request, pos);
                GestureOutcome::CreateRequested(request)
            }
            GestureState::DraggingEvent(drag) => self.finish_drag(drag, pos),
            GestureState::ResizingEvent(resize) => self.finish_resize(resize, pos),
        }
    }

    /// Escape: abandon the gesture without touching any event.
    pub fn cancel_gesture(&mut self) -> GestureOutcome {
        if self.gesture.is_idle() {
            return GestureOutcome::None;
        }
        self.gesture = GestureState::Idle;
        GestureOutcome::Cancelled
    }

    /// The pointer left the grid. Grid gestures are cancelled; a trashed
    /// entry drag (which starts outside the grid) only loses its hover.
    pub fn pointer_left(&mut self) -> GestureOutcome {
        if let GestureState::DraggingEvent(drag) = &mut self.gesture {
            if drag.is_trashed() {
                drag.clear_hover();
                return GestureOutcome::None;
            }
        }
        self.cancel_gesture()
    }

    /// Starts dragging a trash entry towards the grid.
    pub fn begin_trash_drag(&mut self, id: &str) -> bool {
        if !self.gesture.is_idle() {
            return false;
        }
        let Some(entry) = self.trash.get(id) else {
            return false;
        };
        self.gesture = GestureState::DraggingEvent(DragContext::for_trashed(entry));
        true
    }

    pub fn confirm_restore(&mut self) -> bool {
        match self.pending_restore.take() {
            Some(confirmation) => self.restore_event_from_trash_at(
                &confirmation.event_id,
                confirmation.day,
                minutes_of(confirmation.start),
            ),
            None => false,
        }
    }

    pub fn decline_restore(&mut self) {
        self.pending_restore = None;
    }

    fn finish_drag(&mut self, drag: DragContext, pos: Pos2) -> GestureOutcome {
        let id = match &drag.payload {
            DragPayload::Trashed(id) => {
                let Some(cell) = drag.hovered_cell else {
                    return GestureOutcome::Cancelled;
                };
                return self.prompt_restore(id, &drag.title, cell);
            }
            DragPayload::Active(id) => id.clone(),
        };

        if !drag.moved {
            return self.open_edit_form(&id, pos);
        }
        let (Some(target), Some(event)) = (drag.drop_target(&self.metrics), self.working.get(&id)) else {
            return GestureOutcome::Cancelled;
        };
        let moved = event.moved_to(target.date, target.start_minutes);
        if &moved == event {
            return GestureOutcome::None;
        }
        self.submit_geometry_change(moved);
        GestureOutcome::Moved(id)
    }

    fn finish_resize(&mut self, resize: ResizeContext, pos: Pos2) -> GestureOutcome {
        if !resize.moved {
            return self.open_edit_form(&resize.event_id, pos);
        }
        let Some(event) = self.working.get(&resize.event_id) else {
            return GestureOutcome::Cancelled;
        };
        let resized = event.resized_to(resize.current_end);
        if &resized == event {
            return GestureOutcome::None;
        }
        self.submit_geometry_change(resized);
        GestureOutcome::Resized(resize.event_id)
    }

    fn prompt_restore(&mut self, id: &str, title: &str, cell: GridCell) -> GestureOutcome {
        let confirmation = RestoreConfirmation {
            event_id: id.to_string(),
            title: title.to_string(),
            day: cell.day,
            date: date_for_day(self.week_start, cell.day),
            start: cell.time(),
        };
        self.pending_restore = Some(confirmation.clone());
        GestureOutcome::RestorePrompt(confirmation)
    }

    /// Applies a move or resize optimistically; a failed remote update rolls
    /// the event back.
    fn submit_geometry_change(&mut self, updated: CalendarEvent) {
        let patch = EventPatch::times_of(&updated);
        let id = updated.id.clone();
        let server_id = updated.server_id.clone();
        if let (Some(seq), Some(server_id)) = (self.working.apply_update(updated, true), server_id) {
            self.sync.spawn_update(id, seq, server_id, patch);
        }
        self.persist_events();
    }

    // ----- authoring form ----------------------------------------------------

    /// Opens the create form, or moves the open one to the new selection.
    pub fn open_create_form(&mut self, request: CreateRequest, anchor: Pos2) {
        match &mut self.form {
            Some(form) => form.relocate(&request, anchor),
            None => self.form = Some(AuthoringForm::for_create(&request, anchor)),
        }
    }

    fn open_edit_form(&mut self, id: &str, anchor: Pos2) -> GestureOutcome {
        let Some(event) = self.working.get(id) else {
            return GestureOutcome::None;
        };
        self.form = Some(AuthoringForm::for_edit(event, anchor));
        GestureOutcome::EditRequested(id.to_string())
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Validates and saves the form. On success the form closes and the id
    /// of the saved event is returned; on failure the form stays open with
    /// the error shown.
    pub fn submit_form(&mut self) -> Result<String, FormError> {
        let result = self.try_submit_form();
        match &result {
            Ok(_) => self.form = None,
            Err(err) => {
                if let Some(form) = self.form.as_mut() {
                    form.error_message = Some(err.to_string());
                }
            }
        }
        result
    }

    fn try_submit_form(&mut self) -> Result<String, FormError> {
        let form = self.form.as_ref().ok_or(FormError::NotOpen)?;
        let draft = form.to_draft()?;

        match form.mode.clone() {
            FormMode::Create => {
                let event = draft.into_event()?;
                let id = event.id.clone();
                log::info!("Created event {} ({})", id, event.title);
                self.sync.spawn_create(id.clone(), OutboundEvent::from(&event));
                self.working.upsert(event);
                self.persist_events();
                Ok(id)
            }
            FormMode::Edit(id) => {
                let Some(mut event) = self.working.get(&id).cloned() else {
                    return Err(FormError::NotOpen);
                };
                draft.apply_to(&mut event)?;
                match event.server_id.clone() {
                    Some(server_id) => {
                        let patch = EventPatch::full(&event);
                        if let Some(seq) = self.working.apply_update(event, false) {
                            self.sync.spawn_update(id.clone(), seq, server_id, patch);
                        }
                    }
                    None => {
                        // Never reached the server: this save retries the create.
                        event.mutation = Mutation::Pending;
                        self.sync.spawn_create(id.clone(), OutboundEvent::from(&event));
                        self.working.upsert(event);
                    }
                }
                self.persist_events();
                Ok(id)
            }
        }
    }

    // ----- sync reconciliation -------------------------------------------------

    /// Applies every remote result that arrived since the last call.
    /// Returns how many were handled.
    pub fn poll_sync(&mut self) -> usize {
        let messages = self.sync.drain();
        let count = messages.len();
        for message in messages {
            self.handle_sync(message);
        }
        count
    }

    /// Blocks until all dispatched remote calls have reported (or `timeout`
    /// passes) and applies their results.
    pub fn wait_for_sync(&mut self, timeout: StdDuration) -> usize {
        let messages = self.sync.settle(timeout);
        let count = messages.len();
        for message in messages {
            self.handle_sync(message);
        }
        count
    }

    fn handle_sync(&mut self, message: SyncMessage) {
        match message {
            SyncMessage::Fetched(Ok(payloads)) => {
                let remote = Normalizer::new().normalize_all(payloads);
                log::info!("Fetched {} events", remote.len());
                self.working
                    .replace_with_remote(remote, self.trash.tombstones(), &self.trash.trashed_ids());
                self.persist_events();
            }
            SyncMessage::Fetched(Err(err)) => {
                log::warn!("Event fetch failed: {}", err);
                self.notifier
                    .warning("Could not load events from the server; showing the cached copy");
            }
            SyncMessage::Created { local_id, result } => self.handle_created(local_id, result),
            SyncMessage::Updated {
                local_id,
                seq,
                result,
            } => self.handle_updated(&local_id, seq, result),
            SyncMessage::Deleted { server_id, result } => match result {
                Ok(()) => log::debug!("Deleted remote event {}", server_id),
                Err(RemoteError::NotFound) => log::debug!("Remote event {} was already gone", server_id),
                Err(err) => log::warn!("Failed to delete remote event {}: {}", server_id, err),
            },
            SyncMessage::PurgeFinished(summary) => {
                if summary.failed > 0 {
                    log::warn!(
                        "Purge finished: {} of {} remote deletes failed",
                        summary.failed,
                        summary.attempted
                    );
                } else {
                    log::info!("Purge finished: {} remote deletes", summary.attempted);
                }
            }
        }
    }

    fn handle_created(&mut self, local_id: String, result: Result<String, RemoteError>) {
        let server_id = result.as_ref().ok().cloned();
        match self.working.resolve_create(&local_id, result) {
            CreateResolution::Committed { server_id } => {
                log::debug!("Event {} stored remotely as {}", local_id, server_id);
                self.persist_events();
            }
            CreateResolution::Failed { title, error } => {
                log::warn!("Failed to create remote event {}: {}", local_id, error);
                self.notifier.warning(&format!(
                    "\"{}\" is saved locally but could not be synced; save it again to retry",
                    title
                ));
                self.persist_events();
            }
            CreateResolution::NotActive => {
                let Some(server_id) = server_id else {
                    return;
                };
                // The event left the grid before the server answered; its
                // remote copy must not outlive it.
                if self.trash.set_server_id(&local_id, &server_id) {
                    self.persist_trash();
                } else if self.trash.is_tombstoned(&local_id) {
                    self.trash.tombstone(&server_id, Utc::now());
                    self.persist_tombstones();
                } else {
                    log::warn!("Create result for unknown event {}", local_id);
                }
                self.sync.spawn_delete(server_id);
            }
        }
    }

    fn handle_updated(&mut self, local_id: &str, seq: u64, result: Result<(), RemoteError>) {
        match self.working.resolve_update(local_id, seq, result) {
            UpdateResolution::Committed => self.persist_events(),
            UpdateResolution::RolledBack { title, error } => {
                log::warn!("Update of {} failed, rolled back: {}", local_id, error);
                self.notifier
                    .warning(&format!("Could not save the change to \"{}\"; it was reverted", title));
                self.persist_events();
            }
            UpdateResolution::KeptLocal { title, error } => {
                log::warn!("Update of {} failed, kept locally: {}", local_id, error);
                self.notifier
                    .warning(&format!("\"{}\" is saved locally but could not be synced", title));
                self.persist_events();
            }
            UpdateResolution::Stale => log::debug!("Ignoring stale update result for {}", local_id),
            UpdateResolution::Unknown => log::debug!("Update result for removed event {}", local_id),
        }
    }

    // ----- persistence -------------------------------------------------------

    fn persist_events(&self) {
        if let Err(err) = self.store.save_events(self.working.events()) {
            log::error!("Failed to cache events: {:#}", err);
        }
    }

    fn persist_trash(&self) {
        if let Err(err) = self.store.save_trash(self.trash.entries()) {
            log::error!("Failed to cache trash: {:#}", err);
        }
    }

    fn persist_tombstones(&self) {
        if let Err(err) = self.store.save_tombstones(self.trash.tombstones()) {
            log::error!("Failed to cache tombstones: {:#}", err);
        }
    }
}
