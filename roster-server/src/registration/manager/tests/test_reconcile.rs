use super::*;

#[test]
fn test_reconcile_fixes_occupied_drift() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 5);
    register_all(&h, "spin", &["a", "b"]);

    let mut resource = h.manager.get_resource("spin").unwrap();
    resource.occupied = 4;
    h.manager.store().put_resource(&resource).unwrap();

    let report = h.manager.reconcile("spin").unwrap();

    assert_eq!(report.occupied_before, 4);
    assert_eq!(report.occupied_after, 2);
    assert!(report.changed());
    assert_eq!(h.manager.get_resource("spin").unwrap().occupied, 2);
    assert_invariants(&h.manager, "spin");
}

#[test]
fn test_reconcile_renumbers_by_registration_time() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "b", "c", "d"]);

    // scramble: duplicate and gapped positions
    for (party, position) in [("b", 3), ("c", 3), ("d", 9)] {
        let mut e = h.manager.get_active_entry("spin", party).unwrap().unwrap();
        e.position = Some(position);
        h.manager.store().put_entry(&e).unwrap();
    }

    let report = h.manager.reconcile("spin").unwrap();

    assert_eq!(report.positions_fixed, 3);
    assert_eq!(
        waitlist_of(&h.manager, "spin"),
        vec![("b".to_string(), 1), ("c".to_string(), 2), ("d".to_string(), 3)]
    );
    assert_invariants(&h.manager, "spin");
}

#[test]
fn test_reconcile_clears_stray_positions() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 2);
    register_all(&h, "spin", &["a"]);

    let mut a = h.manager.get_active_entry("spin", "a").unwrap().unwrap();
    a.position = Some(1);
    h.manager.store().put_entry(&a).unwrap();

    let report = h.manager.reconcile("spin").unwrap();

    assert_eq!(report.stray_positions_cleared, 1);
    let a = h.manager.get_active_entry("spin", "a").unwrap().unwrap();
    assert!(a.position.is_none());
}

#[test]
fn test_reconcile_repairs_missed_promotion() {
    let mut h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "b", "c"]);
    h.drain_notifications();

    // "a" left without the ledger or the waitlist hearing about it
    let mut a = h.manager.get_active_entry("spin", "a").unwrap().unwrap();
    a.status = EntryStatus::Canceled;
    h.manager.store().put_entry(&a).unwrap();

    let report = h.manager.reconcile("spin").unwrap();

    assert_eq!(report.occupied_before, 1);
    assert_eq!(report.occupied_after, 0);
    assert_eq!(report.promoted, 1);
    assert_eq!(active_status(&h.manager, "spin", "b"), Some(EntryStatus::Confirmed));
    assert_eq!(h.manager.get_resource("spin").unwrap().occupied, 1);
    assert_eq!(h.drain_notifications().len(), 1);
    assert_invariants(&h.manager, "spin");
}

#[test]
fn test_reconcile_is_idempotent() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 2);
    register_all(&h, "spin", &["a", "b", "c", "d"]);
    let mut resource = h.manager.get_resource("spin").unwrap();
    resource.occupied = 0;
    h.manager.store().put_resource(&resource).unwrap();

    let first = h.manager.reconcile("spin").unwrap();
    assert!(first.changed());
    let mut events = h.manager.subscribe();

    let second = h.manager.reconcile("spin").unwrap();

    assert!(!second.changed());
    assert_eq!(second.occupied_before, second.occupied_after);
    assert!(events.try_recv().is_err(), "no event for a clean pass");
}

#[test]
fn test_reconcile_keeps_over_full_count() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 3);
    register_all(&h, "spin", &["a", "b", "c"]);
    create_class(&h.manager, "spin", 2);

    let report = h.manager.reconcile("spin").unwrap();

    assert!(!report.changed());
    assert_eq!(h.manager.get_resource("spin").unwrap().occupied, 3);
}

#[test]
fn test_reconcile_all_covers_every_resource() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    create_equipment(&h.manager, "rower", 1);
    register_all(&h, "rower", &["a"]);

    let reports = h.manager.reconcile_all().unwrap();

    let mut ids: Vec<String> = reports.into_iter().map(|r| r.resource_id).collect();
    ids.sort();
    assert_eq!(ids, vec!["rower".to_string(), "spin".to_string()]);

    let err = h.manager.reconcile("missing").unwrap_err();
    assert!(matches!(err, ManagerError::ResourceNotFound(_)));
}
