//! Tests for the resource set

use std::any::Any;
use std::sync::Arc;

use corral_core::{PooledResource, ResourceAllocator, ResourceSpec};

use crate::handle::ResourceHandle;

use super::ResourceSet;

#[derive(Debug)]
struct MockResource;

impl PooledResource for MockResource {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn close(&self) {}
}

/// Allocator that matches only identical specs.
struct ExactMatchAllocator;

impl ResourceAllocator for ExactMatchAllocator {
    fn create(&self, _spec: &ResourceSpec) -> anyhow::Result<Arc<dyn PooledResource>> {
        Ok(Arc::new(MockResource))
    }

    fn matches(&self, actual: &ResourceSpec, wanted: &ResourceSpec) -> bool {
        actual == wanted
    }
}

fn handle(spec: &ResourceSpec) -> Arc<ResourceHandle> {
    Arc::new(ResourceHandle::new(Arc::new(MockResource), spec.clone()))
}

#[test]
fn claim_prefers_insertion_order() {
    let set = ResourceSet::new();
    let spec = ResourceSpec::new("db");
    let first = handle(&spec);
    let second = handle(&spec);
    set.add(first.clone());
    set.add(second);

    let claimed = set
        .claim_free_match(&spec, &ExactMatchAllocator, true)
        .unwrap();
    assert_eq!(claimed.id(), first.id());
    assert!(claimed.is_busy());
}

#[test]
fn claim_skips_busy_and_errored_handles() {
    let set = ResourceSet::new();
    let spec = ResourceSpec::new("db");
    let busy = handle(&spec);
    assert!(busy.try_claim());
    let errored = handle(&spec);
    errored.mark_error();
    let clean = handle(&spec);
    set.add(busy);
    set.add(errored);
    set.add(clean.clone());

    let claimed = set
        .claim_free_match(&spec, &ExactMatchAllocator, true)
        .unwrap();
    assert_eq!(claimed.id(), clean.id());
}

#[test]
fn claim_honors_the_matching_flag() {
    let set = ResourceSet::new();
    let actual = ResourceSpec::new("db").with_param("user", "alice");
    let wanted = ResourceSpec::new("db").with_param("user", "bob");
    set.add(handle(&actual));

    assert!(
        set.claim_free_match(&wanted, &ExactMatchAllocator, true)
            .is_none()
    );
    // With matching disabled any free handle will do.
    assert!(
        set.claim_free_match(&wanted, &ExactMatchAllocator, false)
            .is_some()
    );
}

#[test]
fn has_free_match_mirrors_claim_without_claiming() {
    let set = ResourceSet::new();
    let alice = ResourceSpec::new("db").with_param("user", "alice");
    let bob = ResourceSpec::new("db").with_param("user", "bob");
    set.add(handle(&alice));

    assert!(set.has_free_match(&alice, &ExactMatchAllocator, true));
    assert!(!set.has_free_match(&bob, &ExactMatchAllocator, true));
    assert!(set.has_free_match(&bob, &ExactMatchAllocator, false));

    let claimed = set
        .claim_free_match(&alice, &ExactMatchAllocator, true)
        .unwrap();
    assert!(claimed.is_busy());
    assert!(!set.has_free_match(&alice, &ExactMatchAllocator, true));
}

#[test]
fn claim_returns_none_when_everything_is_taken() {
    let set = ResourceSet::new();
    let spec = ResourceSpec::new("db");
    set.add(handle(&spec));

    let first = set.claim_free_match(&spec, &ExactMatchAllocator, true);
    assert!(first.is_some());
    assert!(
        set.claim_free_match(&spec, &ExactMatchAllocator, true)
            .is_none()
    );
}

#[test]
fn remove_returns_the_handle() {
    let set = ResourceSet::new();
    let spec = ResourceSpec::new("db");
    let h = handle(&spec);
    set.add(h.clone());

    assert!(set.contains(h.id()));
    let removed = set.remove(h.id()).unwrap();
    assert_eq!(removed.id(), h.id());
    assert!(set.remove(h.id()).is_none());
    assert!(set.is_empty());
}

#[test]
fn counts_track_state() {
    let set = ResourceSet::new();
    let spec = ResourceSpec::new("db");
    let a = handle(&spec);
    let b = handle(&spec);
    set.add(a.clone());
    set.add(b);

    assert_eq!(set.len(), 2);
    assert_eq!(set.free_count(), 2);
    assert_eq!(set.busy_count(), 0);

    assert!(a.try_claim());
    assert_eq!(set.free_count(), 1);
    assert_eq!(set.busy_count(), 1);
}

#[test]
fn drain_empties_regardless_of_state() {
    let set = ResourceSet::new();
    let spec = ResourceSpec::new("db");
    let busy = handle(&spec);
    assert!(busy.try_claim());
    set.add(busy);
    set.add(handle(&spec));

    let drained = set.drain();
    assert_eq!(drained.len(), 2);
    assert!(set.is_empty());
}
