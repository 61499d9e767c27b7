// Trash, restore and permanent deletion against an in-memory Event Service

mod fixtures;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use fixtures::{dates, payloads, Harness, CALENDAR};
use week_grid::grid::{GestureOutcome, GestureState, RestoreConfirmation};
use week_grid::models::event::Mutation;
use week_grid::services::local_store::LocalStore;
use week_grid::services::notification::NoticeLevel;
use week_grid::services::remote::InMemoryEventService;
use week_grid::utils::date::hm;

fn seeded(payload: serde_json::Value) -> Arc<InMemoryEventService> {
    let service = Arc::new(InMemoryEventService::new());
    service.seed(CALENDAR, payload);
    service
}

#[test]
fn test_trash_deletes_remote_copy_and_hides_event() {
    let mut h = Harness::new().started();
    let id = h.create_synced("Retro", 2, hm(15, 0), hm(16, 0));
    let server_id = h.controller.event(&id).unwrap().server_id.clone().unwrap();

    assert!(h.controller.move_event_to_trash(&id));
    assert!(h.controller.event(&id).is_none());
    assert!(h.controller.render_event(&id).is_none());
    assert!(h.controller.visible_placements().is_empty());

    let entry = &h.controller.trash_entries()[0];
    assert_eq!(entry.id(), id);
    assert_eq!(entry.event.server_id.as_deref(), Some(server_id.as_str()));

    h.settle();
    assert!(!h.service.contains(CALENDAR, &server_id));
    assert_eq!(h.service.deleted_ids(), vec![server_id]);
}

#[test]
fn test_restore_recreates_remote_event_with_same_id() {
    let mut h = Harness::new().started();
    let id = h.create_synced("Review", 1, hm(9, 0), hm(10, 30));
    let old_server_id = h.controller.event(&id).unwrap().server_id.clone().unwrap();
    h.controller.move_event_to_trash(&id);
    h.settle();

    assert!(h.controller.restore_event_from_trash(&id, 4, 14));

    let restored = h.controller.event(&id).unwrap();
    assert_eq!(restored.date, dates::week_day(4));
    assert_eq!(restored.start_time, Some(hm(14, 0)));
    assert_eq!(restored.end_time, Some(hm(15, 30)));
    assert_eq!(restored.server_id, None);
    assert_eq!(restored.mutation, Mutation::Pending);
    assert!(h.controller.trash_entries().is_empty());

    h.settle();
    let restored = h.controller.event(&id).unwrap();
    let new_server_id = restored.server_id.clone().unwrap();
    assert_ne!(new_server_id, old_server_id);
    assert_eq!(h.service.create_calls(), 2);
    assert!(h.service.contains(CALENDAR, &new_server_id));
}

#[test]
fn test_restored_event_is_not_duplicated_by_refresh() {
    let mut h = Harness::new().started();
    let id = h.create_synced("Once", 3, hm(11, 0), hm(12, 0));
    h.controller.move_event_to_trash(&id);
    h.settle();
    h.controller.restore_event_from_trash(&id, 3, 11);
    h.settle();

    h.controller.refresh();
    h.settle();

    let matching: Vec<_> = h
        .controller
        .events()
        .iter()
        .filter(|e| e.title == "Once")
        .collect();
    assert_eq!(matching.len(), 1);
}

#[test]
fn test_trash_then_restore_in_place_gives_back_the_same_event() {
    let mut h = Harness::new().started();
    h.service.set_offline(true);
    let id = h.create_event("Draft", 3, hm(10, 0), hm(11, 15));
    h.settle();
    let original = h.controller.event(&id).unwrap().clone();
    assert!(!original.is_server_backed());

    assert!(h.controller.move_event_to_trash(&id));
    assert!(h.controller.restore_event_from_trash(&id, 3, 10));

    assert_eq!(h.controller.event(&id), Some(&original));
    assert!(h.controller.trash_entries().is_empty());
}

#[test]
fn test_restore_keeps_all_day_events_all_day() {
    let service = seeded(payloads::all_day("srv-a", "Offsite", dates::week_day(1)));
    let mut h = Harness::with_parts(service, LocalStore::in_memory().unwrap()).started();

    h.controller.move_event_to_trash("srv-a");
    h.settle();
    assert!(h.controller.restore_event_from_trash("srv-a", 5, 10));

    let restored = h.controller.event("srv-a").unwrap();
    assert!(restored.is_all_day);
    assert_eq!(restored.date, dates::week_day(5));
    assert_eq!(restored.start_time, None);
}

#[test]
fn test_empty_trash_tombstones_and_purges_remotely() {
    let mut h = Harness::new().started();
    let first = h.create_synced("One", 1, hm(9, 0), hm(10, 0));
    let second = h.create_synced("Two", 2, hm(9, 0), hm(10, 0));
    let server_ids: Vec<String> = [&first, &second]
        .iter()
        .map(|id| h.controller.event(id).unwrap().server_id.clone().unwrap())
        .collect();
    h.controller.move_event_to_trash(&first);
    h.controller.move_event_to_trash(&second);
    h.settle();
    h.notices.drain();
    let deletes_before = h.service.delete_calls();

    let report = h.controller.empty_trash();

    assert_eq!(report.removed, 2);
    assert_eq!(report.remote_deletes, 2);
    assert!(h.controller.trash_entries().is_empty());
    for id in [&first, &second].into_iter().chain(server_ids.iter()) {
        assert!(h.controller.is_tombstoned(id), "{} should be tombstoned", id);
    }

    let notices = h.notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);

    // Already deleted at trash time, so these come back NotFound
    h.settle();
    assert_eq!(h.service.delete_calls() - deletes_before, 2);
    assert!(h.notices.is_empty());
}

#[test]
fn test_empty_trash_skips_client_only_entries_remotely() {
    let mut h = Harness::new().started();
    let first = h.create_synced("One", 1, hm(9, 0), hm(10, 0));
    let second = h.create_synced("Two", 2, hm(9, 0), hm(10, 0));

    h.service.set_offline(true);
    let local = h.create_event("Local", 3, hm(9, 0), hm(10, 0));
    h.settle();
    assert!(!h.controller.event(&local).unwrap().is_server_backed());
    h.service.set_offline(false);

    for id in [&first, &second, &local] {
        assert!(h.controller.move_event_to_trash(id));
    }
    h.settle();
    let deletes_before = h.service.delete_calls();

    let report = h.controller.empty_trash();

    assert_eq!(report.removed, 3);
    assert_eq!(report.remote_deletes, 2);
    assert!(h.controller.trash_entries().is_empty());
    assert!(h.controller.is_tombstoned(&local));

    h.settle();
    assert_eq!(h.service.delete_calls() - deletes_before, 2);
}

#[test]
fn test_tombstoned_event_is_never_resurrected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let service = seeded(payloads::canonical("srv-x", "Ghost", dates::week_day(2), "09:00", "10:00"));

    {
        let mut h = Harness::with_parts(service.clone(), LocalStore::open(&path).unwrap()).started();
        assert!(h.controller.event("srv-x").is_some());

        service.set_offline(true);
        h.controller.move_event_to_trash("srv-x");
        h.settle();
        h.controller.empty_trash();
        h.settle();
        assert!(service.contains(CALENDAR, "srv-x"), "remote delete failed while offline");

        service.set_offline(false);
        h.controller.refresh();
        h.settle();
        assert!(h.controller.event("srv-x").is_none());
    }

    let h = Harness::with_parts(service, LocalStore::open(&path).unwrap()).started();
    assert!(h.controller.is_tombstoned("srv-x"));
    assert!(h.controller.event("srv-x").is_none());
    assert!(h.controller.trash_entries().is_empty());
}

#[test]
fn test_drag_from_trash_prompts_then_restores() {
    let mut h = Harness::new().started();
    let id = h.create_synced("Lunch", 1, hm(12, 0), hm(13, 0));
    h.controller.move_event_to_trash(&id);
    h.settle();

    assert!(h.controller.begin_trash_drag(&id));
    h.controller.pointer_move(h.cell_pos(5, 13 * 60));
    let outcome = h.controller.pointer_up(h.cell_pos(5, 13 * 60));

    let expected = RestoreConfirmation {
        event_id: id.clone(),
        title: "Lunch".into(),
        day: 5,
        date: dates::week_day(5),
        start: hm(13, 0),
    };
    assert_eq!(outcome, GestureOutcome::RestorePrompt(expected.clone()));
    assert_eq!(h.controller.pending_restore(), Some(&expected));
    assert_eq!(h.controller.trash_entries().len(), 1);

    assert!(h.controller.confirm_restore());
    let restored = h.controller.event(&id).unwrap();
    assert_eq!(restored.date, dates::week_day(5));
    assert_eq!(restored.start_time, Some(hm(13, 0)));
    assert_eq!(restored.end_time, Some(hm(14, 0)));
    assert!(h.controller.pending_restore().is_none());
}

#[test]
fn test_declined_restore_leaves_entry_in_trash() {
    let mut h = Harness::new().started();
    let id = h.create_synced("Maybe", 1, hm(8, 0), hm(9, 0));
    h.controller.move_event_to_trash(&id);

    h.controller.begin_trash_drag(&id);
    h.controller.pointer_up(h.cell_pos(2, 600));
    h.controller.decline_restore();

    assert!(h.controller.event(&id).is_none());
    assert_eq!(h.controller.trash_entries().len(), 1);
    assert!(!h.controller.confirm_restore());
}

#[test]
fn test_trash_drag_survives_leaving_the_grid() {
    let mut h = Harness::new().started();
    let id = h.create_event("Wander", 1, hm(8, 0), hm(9, 0));
    h.controller.move_event_to_trash(&id);

    h.controller.begin_trash_drag(&id);
    h.controller.pointer_move(h.cell_pos(3, 600));
    assert_eq!(h.controller.pointer_left(), GestureOutcome::None);
    assert!(matches!(h.controller.gesture(), GestureState::DraggingEvent(_)));

    // Released over the header, outside any cell
    let outcome = h.controller.pointer_up(egui::pos2(fixtures::GRID_LEFT + 10.0, 5.0));
    assert_eq!(outcome, GestureOutcome::Cancelled);
    assert!(h.controller.pending_restore().is_none());
    assert_eq!(h.controller.trash_entries().len(), 1);
}

#[test]
fn test_create_finishing_after_trash_is_cleaned_up() {
    let mut h = Harness::new().started();
    let id = h.create_event("Hasty", 2, hm(9, 0), hm(10, 0));

    // The create is still unacknowledged, so no delete can be sent yet
    assert!(h.controller.move_event_to_trash(&id));
    assert_eq!(h.service.delete_calls(), 0);

    h.settle();

    let entry = &h.controller.trash_entries()[0];
    let server_id = entry.event.server_id.clone().unwrap();
    assert!(!h.service.contains(CALENDAR, &server_id));
    assert_eq!(h.service.deleted_ids(), vec![server_id]);
}

#[test]
fn test_repeated_and_unknown_trash_operations_are_ignored() {
    let mut h = Harness::new().started();
    let id = h.create_event("Twice", 2, hm(9, 0), hm(10, 0));

    assert!(h.controller.move_event_to_trash(&id));
    assert!(!h.controller.move_event_to_trash(&id));
    assert_eq!(h.controller.trash_entries().len(), 1);

    assert!(!h.controller.restore_event_from_trash("nope", 1, 9));
    assert!(!h.controller.restore_event_from_trash(&id, 9, 9));

    assert_eq!(h.controller.empty_trash().removed, 1);
    assert_eq!(h.controller.empty_trash().removed, 0);
    assert!(!h.controller.restore_event_from_trash(&id, 1, 9));
    assert!(h.controller.is_tombstoned(&id));
}
