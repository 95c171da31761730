use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_promotion_is_first_come_first_served() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "w1", "w2", "w3", "w4"]);

    let mut holder = "a".to_string();
    for next in ["w1", "w2", "w3", "w4"] {
        h.manager.cancel("spin", &holder).unwrap();
        assert_eq!(active_status(&h.manager, "spin", next), Some(EntryStatus::Confirmed));
        assert_invariants(&h.manager, "spin");
        holder = next.to_string();
    }
}

#[test]
fn test_single_cancellation_promotes_at_most_one() {
    let mut h = create_test_manager();
    create_class(&h.manager, "spin", 2);
    register_all(&h, "spin", &["a", "b", "c", "d", "e"]);
    h.drain_notifications();

    h.manager.cancel("spin", "b").unwrap();

    assert_eq!(h.drain_notifications().len(), 1);
    assert_eq!(
        waitlist_of(&h.manager, "spin"),
        vec![("d".to_string(), 1), ("e".to_string(), 2)]
    );
}

#[test]
fn test_promote_fills_every_vacancy() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "b", "c", "d"]);

    // capacity raised behind the manager's back
    let mut resource = h.manager.get_resource("spin").unwrap();
    resource.capacity = 3;
    h.manager.store().put_resource(&resource).unwrap();

    let promoted = h.manager.promote("spin").unwrap();

    let ids: Vec<&str> = promoted.iter().map(|e| e.party_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
    assert_eq!(waitlist_of(&h.manager, "spin"), vec![("d".to_string(), 1)]);
    assert!(h.manager.promote("spin").unwrap().is_empty());
    assert_invariants(&h.manager, "spin");
}

#[test]
fn test_promote_empty_waitlist_is_noop() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 3);
    register_all(&h, "spin", &["a"]);

    assert!(h.manager.promote("spin").unwrap().is_empty());
    assert_eq!(h.manager.get_resource("spin").unwrap().occupied, 1);
}

#[test]
fn test_reorder_waitlist_closes_gap() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "b", "c", "d"]);

    // drop "c" without compacting to leave a hole at position 2
    let mut c = h.manager.get_active_entry("spin", "c").unwrap().unwrap();
    c.status = EntryStatus::Canceled;
    c.position = None;
    h.manager.store().put_entry(&c).unwrap();
    assert_eq!(
        waitlist_of(&h.manager, "spin"),
        vec![("b".to_string(), 1), ("d".to_string(), 3)]
    );

    let shifted = h.manager.reorder_waitlist("spin", 2).unwrap();

    assert_eq!(shifted, 1);
    assert_eq!(
        waitlist_of(&h.manager, "spin"),
        vec![("b".to_string(), 1), ("d".to_string(), 2)]
    );
}

#[test]
fn test_reorder_waitlist_on_dense_queue_is_noop() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 1);
    register_all(&h, "spin", &["a", "b", "c"]);

    assert_eq!(h.manager.reorder_waitlist("spin", 1).unwrap(), 0);
    assert_eq!(h.manager.reorder_waitlist("spin", 9).unwrap(), 0);
    assert_eq!(
        waitlist_of(&h.manager, "spin"),
        vec![("b".to_string(), 1), ("c".to_string(), 2)]
    );

    let err = h.manager.reorder_waitlist("spin", 0).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)));
    let err = h.manager.reorder_waitlist("missing", 1).unwrap_err();
    assert!(matches!(err, ManagerError::ResourceNotFound(_)));
}

#[test]
fn test_random_operations_keep_invariants() {
    let h = create_test_manager();
    create_class(&h.manager, "spin", 4);
    let parties: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..300 {
        h.clock.advance(1);
        let party = &parties[rng.gen_range(0..parties.len())];
        let result = if rng.gen_bool(0.55) {
            h.manager.register("spin", party, party).map(|_| ())
        } else {
            h.manager.cancel("spin", party).map(|_| ())
        };
        match result {
            Ok(())
            | Err(ManagerError::AlreadyRegistered { .. })
            | Err(ManagerError::NotRegistered { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert_invariants(&h.manager, "spin");

        // a free slot never coexists with a non-empty waitlist
        let resource = h.manager.get_resource("spin").unwrap();
        if resource.has_vacancy() {
            assert!(h.manager.waitlist("spin").unwrap().is_empty());
        }
    }
}
