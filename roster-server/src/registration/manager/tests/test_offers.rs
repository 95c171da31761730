use super::*;

const WINDOW: i64 = crate::registration::policy::DEFAULT_CLAIM_WINDOW_MS;

/// Rower with "a" on it and `queued` waiting
fn busy_rower(h: &TestHarness, queued: &[&str]) {
    create_equipment(&h.manager, "rower", 1);
    register_all(h, "rower", &["a"]);
    register_all(h, "rower", queued);
}

#[test]
fn test_session_end_offers_slot_to_head() {
    let mut h = create_test_manager();
    busy_rower(&h, &["b", "c"]);
    h.drain_notifications();

    let ended = h.manager.end_session("rower", "a").unwrap();

    assert_eq!(ended.status, EntryStatus::Completed);
    assert!(ended.ended_at.is_some());
    let offer = h.manager.get_active_entry("rower", "b").unwrap().unwrap();
    assert_eq!(offer.status, EntryStatus::Offered);
    assert_eq!(offer.offer_expires_at, Some(h.clock.now_millis() + WINDOW));
    assert!(offer.position.is_none());
    // the offer holds the slot
    assert_eq!(h.manager.get_resource("rower").unwrap().occupied, 1);
    assert_eq!(waitlist_of(&h.manager, "rower"), vec![("c".to_string(), 1)]);

    let sent = h.drain_notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].party_id, "b");
    assert_eq!(sent[0].title, "A slot is waiting for you");
    assert_invariants(&h.manager, "rower");
}

#[test]
fn test_claim_within_window_confirms() {
    let h = create_test_manager();
    busy_rower(&h, &["b"]);
    h.manager.end_session("rower", "a").unwrap();
    h.clock.advance(WINDOW);

    let claimed = h.manager.claim_offer("rower", "b").unwrap();

    assert_eq!(claimed.status, EntryStatus::Confirmed);
    assert!(claimed.offer_expires_at.is_none());
    assert_eq!(h.manager.get_resource("rower").unwrap().occupied, 1);
    assert_invariants(&h.manager, "rower");
}

#[test]
fn test_claim_after_deadline_expires_offer() {
    let mut h = create_test_manager();
    busy_rower(&h, &["b", "c"]);
    h.manager.end_session("rower", "a").unwrap();
    h.drain_notifications();
    h.clock.advance(WINDOW + 1);

    let err = h.manager.claim_offer("rower", "b").unwrap_err();

    assert!(matches!(err, ManagerError::OfferExpired { .. }));
    assert!(h.manager.get_active_entry("rower", "b").unwrap().is_none());
    let expired = h.manager.list_entries("rower", &[EntryStatus::Expired]).unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].party_id, "b");
    // the slot moved on to the next in line
    assert_eq!(active_status(&h.manager, "rower", "c"), Some(EntryStatus::Offered));

    let titles: Vec<String> = h.drain_notifications().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Your slot offer expired", "A slot is waiting for you"]);
    assert_invariants(&h.manager, "rower");
}

#[test]
fn test_expire_offers_sweep_cascades() {
    let h = create_test_manager();
    busy_rower(&h, &["b", "c"]);
    h.manager.end_session("rower", "a").unwrap();

    assert_eq!(h.manager.expire_offers().unwrap(), 0);

    h.clock.advance(WINDOW + 1);
    assert_eq!(h.manager.expire_offers().unwrap(), 1);
    assert_eq!(active_status(&h.manager, "rower", "c"), Some(EntryStatus::Offered));
    assert_eq!(h.manager.get_resource("rower").unwrap().occupied, 1);

    h.clock.advance(WINDOW + 1);
    assert_eq!(h.manager.expire_offers().unwrap(), 1);
    assert_eq!(h.manager.get_resource("rower").unwrap().occupied, 0);
    assert!(h.manager.waitlist("rower").unwrap().is_empty());
    assert_invariants(&h.manager, "rower");
}

#[test]
fn test_newcomer_queues_behind_pending_offer() {
    let h = create_test_manager();
    busy_rower(&h, &["b"]);
    h.manager.end_session("rower", "a").unwrap();

    let d = h.manager.register("rower", "d", "D").unwrap();

    assert_eq!(d.status, EntryStatus::Waitlisted);
    assert_eq!(d.position, Some(1));
}

#[test]
fn test_cancel_offer_passes_slot_on() {
    let h = create_test_manager();
    busy_rower(&h, &["b", "c"]);
    h.manager.end_session("rower", "a").unwrap();

    let canceled = h.manager.cancel("rower", "b").unwrap();

    assert_eq!(canceled.status, EntryStatus::Canceled);
    assert!(canceled.offer_expires_at.is_none());
    assert_eq!(active_status(&h.manager, "rower", "c"), Some(EntryStatus::Offered));
    assert_eq!(h.manager.get_resource("rower").unwrap().occupied, 1);
}

#[test]
fn test_session_rules() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a"]);
    let err = h.manager.end_session("spin", "a").unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)));

    busy_rower(&h, &["b", "c"]);
    let err = h.manager.end_session("rower", "b").unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)), "waitlisted has no session");
    let err = h.manager.end_session("rower", "zed").unwrap_err();
    assert!(matches!(err, ManagerError::NotRegistered { .. }));

    h.manager.end_session("rower", "a").unwrap();
    let err = h.manager.end_session("rower", "b").unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)), "offer must be claimed first");
    let err = h.manager.claim_offer("rower", "c").unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)), "waitlisted has no offer");
}

#[test]
fn test_class_promotion_has_no_offer() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "b"]);
    h.manager.cancel("spin", "a").unwrap();

    let b = h.manager.get_active_entry("spin", "b").unwrap().unwrap();
    assert_eq!(b.status, EntryStatus::Confirmed);
    assert!(b.offer_expires_at.is_none());

    h.clock.advance(WINDOW * 10);
    assert_eq!(h.manager.expire_offers().unwrap(), 0);
}
