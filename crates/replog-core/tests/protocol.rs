//! Protocol tests for the replicated counter log
//!
//! Exercises the knowledge-tracking properties end to end through
//! [`ReplicatedSystem`]:
//!
//! 1. **Walkthrough**: the three-replica increment/send/deliver sequence
//! 2. **Monotonicity**: no time table cell ever decreases under random driving
//! 3. **Filtering**: events the destination is known to have never ship
//! 4. **Transitive propagation**: knowledge relays through an intermediate replica
//! 5. **Re-send**: what a second send carries with and without a reply
//! 6. **Order sensitivity**: decrements that overtake their increment are lost
//! 7. **Duplicate hazard**: relayed or duplicated deliveries double-apply

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use replog_core::{
    EventKind, ReplicaId, ReplicaState, ReplicatedSystem, SystemError, TimeTable, TransmissionId,
};

fn r(id: u32) -> ReplicaId {
    ReplicaId::new(id)
}

fn system(count: usize) -> ReplicatedSystem {
    ReplicatedSystem::new(count).expect("valid replica count")
}

fn send_and_deliver(system: &ReplicatedSystem, from: u32, to: u32) -> TransmissionId {
    let id = system.send(r(from), r(to)).unwrap();
    system.deliver(id).unwrap();
    id
}

fn diff_len(system: &ReplicatedSystem, from: u32, to: u32) -> usize {
    system
        .inspect(r(from), |replica| {
            replica.build_transmission(r(to)).unwrap().events().len()
        })
        .unwrap()
}

fn time_tables(system: &ReplicatedSystem) -> Vec<TimeTable> {
    system
        .replica_ids()
        .map(|id| system.inspect(id, |replica| replica.time_table().clone()).unwrap())
        .collect()
}

// ============================================================================
// Walkthrough
// ============================================================================

#[test]
fn test_three_replica_walkthrough() {
    let system = system(3);

    system.local_op(r(1), EventKind::Increment, "X").unwrap();
    assert_eq!(system.query(r(1), "X").unwrap(), Some(1));
    assert_eq!(system.query(r(2), "X").unwrap(), None);

    let id = system.send(r(1), r(2)).unwrap();
    assert_eq!(id, TransmissionId::new(1));

    let pending = system.network().peek(id).expect("pending transmission");
    assert_eq!(pending.source(), r(1));
    assert_eq!(pending.destination(), r(2));
    assert_eq!(pending.events().len(), 1);
    assert_eq!(pending.events()[0].kind(), EventKind::Increment);
    assert_eq!(pending.events()[0].key(), "X");
    assert_eq!(
        pending.time_table().rows(),
        vec![vec![1, 0, 0], vec![0, 0, 0], vec![0, 0, 0]]
    );

    // A later local op on the sender does not leak into the pending message.
    system.local_op(r(1), EventKind::Increment, "Y").unwrap();
    let before = system.dump_state(r(2)).unwrap();
    assert!(before.log.is_empty());
    assert_eq!(before.time_table, vec![vec![0; 3]; 3]);

    system.deliver(id).unwrap();
    assert_eq!(system.query(r(2), "X").unwrap(), Some(1));
    assert_eq!(system.query(r(2), "Y").unwrap(), None);

    let after: ReplicaState = system.dump_state(r(2)).unwrap();
    assert_eq!(
        after.time_table,
        vec![vec![1, 0, 0], vec![1, 0, 0], vec![0, 0, 0]]
    );
    assert_eq!(after.log.len(), 1);
    assert_eq!(after.log[0].origin, r(1));
    assert_eq!(after.log[0].origin_seq, 1);
}

// ============================================================================
// Monotonicity and filtering under random driving
// ============================================================================

#[test]
fn test_time_tables_never_decrease() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let system = system(4);
    let keys = ["A", "B", "C"];
    let mut previous = time_tables(&system);

    for _ in 0..500 {
        let from = rng.random_range(1..=4u32);
        match rng.random_range(0..4) {
            0 | 1 => {
                let kind = if rng.random_bool(0.7) {
                    EventKind::Increment
                } else {
                    EventKind::Decrement
                };
                let key = keys[rng.random_range(0..keys.len())];
                system.local_op(r(from), kind, key).unwrap();
            }
            2 => {
                let to = rng.random_range(1..=4u32);
                system.send(r(from), r(to)).unwrap();
            }
            _ => {
                let pending = system.pending_transmissions();
                if !pending.is_empty() {
                    let pick = pending[rng.random_range(0..pending.len())];
                    if rng.random_bool(0.1) {
                        system.drop_transmission(pick).unwrap();
                    } else {
                        system.deliver(pick).unwrap();
                    }
                }
            }
        }

        let current = time_tables(&system);
        for (now, before) in current.iter().zip(&previous) {
            assert!(now.dominates(before), "time table shrank: {before:?} -> {now:?}");
        }
        for id in system.replica_ids() {
            let (clock, diagonal) = system
                .inspect(id, |replica| (replica.local_clock(), replica.time_table().get(id, id)))
                .unwrap();
            assert_eq!(clock, diagonal);
        }
        previous = current;
    }
}

#[test]
fn test_diff_is_exactly_the_unknown_events() {
    let mut rng = StdRng::seed_from_u64(42);
    let system = system(3);

    for _ in 0..200 {
        let from = rng.random_range(1..=3u32);
        let to = rng.random_range(1..=3u32);
        if rng.random_bool(0.5) {
            system.local_op(r(from), EventKind::Increment, "X").unwrap();
        } else {
            send_and_deliver(&system, from, to);
        }

        system
            .inspect(r(from), |replica| {
                let trans = replica.build_transmission(r(to)).unwrap();
                let expected: Vec<_> = replica
                    .log()
                    .iter()
                    .filter(|event| !replica.has_knowledge_of(r(to), event))
                    .cloned()
                    .collect();
                assert_eq!(trans.events(), expected.as_slice());
                assert!(
                    trans
                        .events()
                        .iter()
                        .all(|event| !replica.has_knowledge_of(r(to), event))
                );
            })
            .unwrap();
    }
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn test_transitive_propagation() {
    let system = system(3);
    system.local_op(r(1), EventKind::Increment, "X").unwrap();

    send_and_deliver(&system, 1, 2);
    send_and_deliver(&system, 2, 3);

    assert_eq!(system.query(r(3), "X").unwrap(), Some(1));

    // C now knows that A has done one operation, without ever hearing from A.
    let table = system.dump_state(r(3)).unwrap().time_table;
    assert_eq!(table[0][0], 1);
    assert_eq!(table[2][0], 1);
}

#[test]
fn test_gossip_carries_third_party_knowledge() {
    let system = system(3);
    system.local_op(r(1), EventKind::Increment, "X").unwrap();
    send_and_deliver(&system, 1, 2);
    send_and_deliver(&system, 2, 3);

    // C replies to A: A learns C has seen its event, via C's row.
    send_and_deliver(&system, 3, 1);
    assert_eq!(diff_len(&system, 1, 3), 0);
    // A also learns, through C's snapshot, that B has seen it.
    assert_eq!(diff_len(&system, 1, 2), 0);
}

#[test]
fn test_resend_without_reply_still_carries_events() {
    let system = system(3);
    system.local_op(r(1), EventKind::Increment, "X").unwrap();
    send_and_deliver(&system, 1, 2);

    // A has no evidence B received anything, so it ships X again.
    assert_eq!(diff_len(&system, 1, 2), 1);
}

#[test]
fn test_resend_after_reply_is_empty() {
    let system = system(3);
    system.local_op(r(1), EventKind::Increment, "X").unwrap();
    send_and_deliver(&system, 1, 2);
    send_and_deliver(&system, 2, 1);

    let id = system.send(r(1), r(2)).unwrap();
    let trans = system.network().peek(id).unwrap();
    assert!(trans.is_empty());

    system.deliver(id).unwrap();
    assert_eq!(system.query(r(2), "X").unwrap(), Some(1));
}

#[test]
fn test_two_replica_ping_pong_converges() {
    let system = system(2);
    let mut rng = StdRng::seed_from_u64(9);

    for _ in 0..100 {
        let origin = rng.random_range(1..=2u32);
        let key = if rng.random_bool(0.5) { "X" } else { "Y" };
        system.local_op(r(origin), EventKind::Increment, key).unwrap();
        if rng.random_bool(0.3) {
            send_and_deliver(&system, 1, 2);
            send_and_deliver(&system, 2, 1);
        }
    }
    send_and_deliver(&system, 1, 2);
    send_and_deliver(&system, 2, 1);

    let a = system.dump_state(r(1)).unwrap();
    let b = system.dump_state(r(2)).unwrap();
    assert_eq!(a.values, b.values);
    assert_eq!(a.log.len(), 100);
    assert_eq!(b.log.len(), 100);
    // Each replica's own row now covers both clocks.
    assert_eq!(a.time_table[0], b.time_table[1]);
    assert_eq!(a.time_table[0], vec![a.local_clock, b.local_clock]);
}

// ============================================================================
// Order sensitivity and duplicate hazards
// ============================================================================

#[test]
fn test_decrement_on_absent_stays_absent() {
    let system = system(3);
    system.local_op(r(2), EventKind::Decrement, "X").unwrap();
    assert_eq!(system.query(r(2), "X").unwrap(), None);

    // Shipping the decrement elsewhere has no effect there either.
    send_and_deliver(&system, 2, 3);
    assert_eq!(system.query(r(3), "X").unwrap(), None);
    assert_eq!(system.dump_state(r(3)).unwrap().log.len(), 1);
}

#[test]
fn test_delivery_order_changes_outcome() {
    let run = |decrement_first: bool| {
        let system = system(3);
        system.local_op(r(1), EventKind::Increment, "X").unwrap();
        system.local_op(r(2), EventKind::Decrement, "X").unwrap();
        assert_eq!(system.query(r(2), "X").unwrap(), None);

        let increment = system.send(r(1), r(3)).unwrap();
        let decrement = system.send(r(2), r(3)).unwrap();
        if decrement_first {
            system.deliver(decrement).unwrap();
            system.deliver(increment).unwrap();
        } else {
            system.deliver(increment).unwrap();
            system.deliver(decrement).unwrap();
        }
        system.query(r(3), "X").unwrap()
    };

    assert_eq!(run(false), Some(0));
    // The decrement overtook the increment and its effect is gone for good.
    assert_eq!(run(true), Some(1));
}

/// Known consistency hazard: an event reaching a replica over two paths
/// before its time table reflects the first is applied twice.
#[test]
fn test_relay_paths_double_apply_increment() {
    let system = system(3);
    system.local_op(r(1), EventKind::Increment, "X").unwrap();

    let direct = system.send(r(1), r(3)).unwrap();
    send_and_deliver(&system, 1, 2);
    let relayed = system.send(r(2), r(3)).unwrap();

    system.deliver(direct).unwrap();
    system.deliver(relayed).unwrap();

    assert_eq!(system.query(r(1), "X").unwrap(), Some(1));
    assert_eq!(system.query(r(3), "X").unwrap(), Some(2));
    assert_eq!(system.dump_state(r(3)).unwrap().log.len(), 2);
}

/// Known consistency hazard: a duplicated message is applied twice.
#[test]
fn test_duplicated_delivery_double_applies() {
    let system = system(2);
    system.local_op(r(1), EventKind::Increment, "X").unwrap();
    let id = system.send(r(1), r(2)).unwrap();
    let copy = system.duplicate_transmission(id).unwrap();

    system.deliver(id).unwrap();
    system.deliver(copy).unwrap();

    assert_eq!(system.query(r(2), "X").unwrap(), Some(2));
    // The time table is unaffected by the repeat.
    assert_eq!(
        system.dump_state(r(2)).unwrap().time_table,
        vec![vec![1, 0], vec![1, 0]]
    );
}

#[test]
fn test_consumed_transmission_cannot_be_duplicated() {
    let system = system(2);
    let id = system.send(r(1), r(2)).unwrap();
    system.deliver(id).unwrap();
    assert_eq!(
        system.duplicate_transmission(id).unwrap_err(),
        SystemError::TransmissionNotFound(id)
    );
}
