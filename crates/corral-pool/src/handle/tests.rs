//! Tests for resource handles and busy/free state

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use corral_core::{PooledResource, ResourceSpec, TransactionRef};

use super::{ResourceHandle, ResourceState};

#[derive(Debug)]
struct MockResource {
    closed: AtomicBool,
}

impl MockResource {
    fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
        }
    }
}

impl PooledResource for MockResource {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct MockTransaction {
    id: Uuid,
    enlisted: Mutex<Vec<Uuid>>,
    delisted: Mutex<Vec<Uuid>>,
}

impl MockTransaction {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            enlisted: Mutex::new(Vec::new()),
            delisted: Mutex::new(Vec::new()),
        }
    }
}

impl TransactionRef for MockTransaction {
    fn id(&self) -> Uuid {
        self.id
    }

    fn enlist(&self, handle_id: Uuid) {
        self.enlisted.lock().push(handle_id);
    }

    fn delist(&self, handle_id: Uuid) {
        self.delisted.lock().push(handle_id);
    }
}

fn handle() -> ResourceHandle {
    ResourceHandle::new(Arc::new(MockResource::new()), ResourceSpec::new("test"))
}

// ============================================================
// ResourceState
// ============================================================

#[test]
fn state_starts_free() {
    let state = ResourceState::new();
    assert!(state.is_free());
    assert!(!state.is_busy());
}

#[test]
fn busy_and_free_are_one_state() {
    let state = ResourceState::new();
    state.set_busy(true);
    assert!(state.is_busy());
    assert!(!state.is_free());
    state.set_busy(false);
    assert!(!state.is_busy());
    assert!(state.is_free());
}

#[test]
fn try_claim_moves_free_to_busy() {
    let state = ResourceState::new();
    assert!(state.try_claim());
    assert!(state.is_busy());
    assert!(!state.try_claim());
}

#[test]
fn try_claim_has_a_single_winner() {
    let state = Arc::new(ResourceState::new());
    let winners = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..16)
        .map(|_| {
            let state = state.clone();
            let winners = winners.clone();
            thread::spawn(move || {
                if state.try_claim() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(state.is_busy());
}

#[test]
fn touch_resets_the_idle_clock() {
    let state = ResourceState::new();
    thread::sleep(Duration::from_millis(20));
    let before = state.idle_duration();
    state.touch();
    assert!(state.idle_duration() < before);
}

// ============================================================
// ResourceHandle
// ============================================================

#[test]
fn handles_compare_by_id() {
    let a = handle();
    let b = handle();
    assert_ne!(a, b);
    assert_eq!(a, a);
}

#[test]
fn error_flag_is_sticky() {
    let h = handle();
    assert!(!h.has_error());
    h.mark_error();
    assert!(h.has_error());
    h.mark_error();
    assert!(h.has_error());
}

#[test]
fn enlist_and_delist_notify_the_transaction() {
    let h = handle();
    let tx = Arc::new(MockTransaction::new());

    h.enlist(tx.clone());
    assert!(h.is_enlisted());
    assert!(h.enlisted_in(tx.id));
    assert_eq!(tx.enlisted.lock().as_slice(), &[h.id()]);

    h.delist();
    assert!(!h.is_enlisted());
    assert_eq!(tx.delisted.lock().as_slice(), &[h.id()]);
}

#[test]
fn delist_without_enlistment_is_a_noop() {
    let h = handle();
    h.delist();
    assert!(!h.is_enlisted());
}

#[test]
fn clear_enlistment_skips_the_delist_notification() {
    let h = handle();
    let tx = Arc::new(MockTransaction::new());

    h.enlist(tx.clone());
    h.clear_enlistment();
    assert!(!h.is_enlisted());
    assert!(tx.delisted.lock().is_empty());
}

#[test]
fn enlistment_is_independent_of_busy_state() {
    let h = handle();
    let tx = Arc::new(MockTransaction::new());

    assert!(h.try_claim());
    h.enlist(tx.clone());
    h.set_busy(false);
    assert!(h.is_free());
    assert!(h.is_enlisted());
}
