//! Tests for pool capacity accounting

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use corral_core::PoolingError;

use super::PoolCapacity;

#[test]
fn increments_up_to_capacity_then_fails() {
    let cap = PoolCapacity::new(3);
    assert!(cap.try_increment().is_ok());
    assert!(cap.try_increment().is_ok());
    assert!(cap.try_increment().is_ok());
    assert_eq!(cap.count(), 3);

    let err = cap.try_increment().unwrap_err();
    assert!(matches!(err, PoolingError::CapacityExceeded { capacity: 3 }));
    assert_eq!(cap.count(), 3);
}

#[test]
fn decrement_clamps_at_zero() {
    let cap = PoolCapacity::new(2);
    cap.decrement();
    assert_eq!(cap.count(), 0);

    cap.try_increment().unwrap();
    cap.decrement();
    cap.decrement();
    assert_eq!(cap.count(), 0);
}

#[test]
fn last_slot_has_a_single_winner() {
    let cap = Arc::new(PoolCapacity::new(1));
    let winners = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..16)
        .map(|_| {
            let cap = cap.clone();
            let winners = winners.clone();
            thread::spawn(move || {
                if cap.try_increment().is_ok() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(cap.count(), 1);
}

#[test]
fn count_never_exceeds_capacity_under_contention() {
    let cap = Arc::new(PoolCapacity::new(5));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let cap = cap.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    if cap.try_increment().is_ok() {
                        assert!(cap.count() <= 5);
                        cap.decrement();
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(cap.count(), 0);
}
