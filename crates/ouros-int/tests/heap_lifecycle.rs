//! Tests for the lifecycle of heap-resident integers.
//!
//! Covers mark-sweep collection from host-supplied roots, slot reuse, the global
//! collection switch, teardown, ownership of kernel values, and the diagnostic dump.

use num_bigint::BigInt;
use ouros_int::{
    Heap, HeapData, HeapId, INSPECT_LINE_LEN, LongInt, NoLimitTracker, RecordingTracer, TraceEvent, Value,
};
use pretty_assertions::assert_eq;

fn big(heap: &mut Heap<NoLimitTracker>, text: &str) -> Value {
    Value::parse(text, 10, heap).unwrap()
}

fn ids(values: &[Value]) -> Vec<HeapId> {
    values.iter().filter_map(Value::ref_id).collect()
}

// =============================================================================
// 1. Collection
// =============================================================================

/// Only slots reachable from the roots survive a collection.
#[test]
fn unreachable_slots_are_collected() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let keep = big(&mut heap, "100000000000000000000");
    let drop_a = big(&mut heap, "200000000000000000000");
    let drop_b = big(&mut heap, "-300000000000000000000");

    let freed = heap.collect_garbage(ids(&[keep, Value::Int(7)]));
    assert_eq!(freed, 2);
    assert!(heap.is_live(keep.ref_id().unwrap()));
    assert!(!heap.is_live(drop_a.ref_id().unwrap()));
    assert!(!heap.is_live(drop_b.ref_id().unwrap()));
    assert_eq!(keep.to_s(10, &heap).unwrap(), "100000000000000000000");
}

/// Collected slots are reused by later allocations.
#[test]
fn collected_slots_are_reused() {
    let mut heap = Heap::new(16, NoLimitTracker);
    for _ in 0..3 {
        big(&mut heap, "100000000000000000000");
    }
    assert_eq!(heap.collect_garbage([]), 3);
    let stats = heap.heap_stats();
    assert_eq!(stats.free_slots, 3);
    assert_eq!(stats.live_objects, 0);

    big(&mut heap, "400000000000000000000");
    assert_eq!(heap.size(), 3);
    assert_eq!(heap.heap_stats().free_slots, 2);
}

/// Arithmetic intermediates that nothing holds are garbage after the next pass.
#[test]
fn intermediates_become_garbage() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let mut acc = Value::Int(i64::MAX);
    for i in 1..=10 {
        acc = acc.add(&Value::Int(i), &mut heap).unwrap();
    }
    assert_eq!(heap.live_count(), 10);
    assert_eq!(heap.collect_garbage(acc.ref_id()), 9);
    assert_eq!(acc.to_s(10, &heap).unwrap(), "9223372036854775862");
}

/// While collection is disabled nothing is reclaimed and `should_gc` stays false.
#[test]
fn disabled_collector_keeps_everything() {
    let mut heap = Heap::new(16, NoLimitTracker);
    heap.gc_disable();
    assert!(!heap.is_gc_enabled());
    big(&mut heap, "100000000000000000000");
    big(&mut heap, "100000000000000000000");

    assert_eq!(heap.collect_garbage([]), 0);
    assert_eq!(heap.live_count(), 2);
    assert!(!heap.should_gc());

    heap.gc_enable();
    assert_eq!(heap.collect_garbage([]), 2);
}

/// `collect_all` frees every live slot, even with collection disabled.
#[test]
fn collect_all_tears_down() {
    let mut heap = Heap::with_tracer(16, NoLimitTracker, RecordingTracer::new());
    heap.gc_disable();
    for text in ["100000000000000000000", "-100000000000000000000"] {
        Value::parse(text, 10, &mut heap).unwrap();
    }
    heap.tracer_mut().clear();

    assert_eq!(heap.collect_all(), 2);
    assert_eq!(heap.live_count(), 0);
    assert_eq!(
        heap.tracer().events().last(),
        Some(&TraceEvent::Collect { freed: 2, live: 0 })
    );
}

// =============================================================================
// 2. Explicit release
// =============================================================================

/// Freeing a slot twice is a no-op the second time.
#[test]
fn double_free_is_guarded() {
    let mut heap = Heap::with_tracer(16, NoLimitTracker, RecordingTracer::new());
    let value = Value::parse("100000000000000000000", 10, &mut heap).unwrap();
    let id = value.ref_id().unwrap();
    heap.tracer_mut().clear();

    assert!(heap.free(id));
    assert!(!heap.free(id));
    assert_eq!(heap.tracer().events(), &[TraceEvent::Free { id }]);
    assert_eq!(heap.heap_stats().free_slots, 1);
    assert!(heap.get_if_live(id).is_none());
}

// =============================================================================
// 3. Ownership
// =============================================================================

/// A kernel value handed in is copied; mutating the caller's copy changes nothing.
#[test]
fn kernel_values_are_copied_in() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let mut kernel = BigInt::from(u64::MAX) * 4;
    let value = Value::from_bigint(&kernel, &mut heap).unwrap();
    kernel += 1;
    assert_eq!(value.to_s(10, &heap).unwrap(), "73786976294838206460");
    assert_eq!(kernel.to_string(), "73786976294838206461");
}

/// `copy_with_heap` allocates an independent slot that outlives the original.
#[test]
fn copies_own_their_kernel() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let original = big(&mut heap, "-123456789012345678901234567890");
    let copy = original.copy_with_heap(&mut heap).unwrap();
    assert_ne!(original.ref_id(), copy.ref_id());

    heap.free(original.ref_id().unwrap());
    assert_eq!(copy.to_s(10, &heap).unwrap(), "-123456789012345678901234567890");
    assert!(matches!(Value::Int(3).copy_with_heap(&mut heap).unwrap(), Value::Int(3)));
}

/// `to_bigint` hands out a copy; the heap value stays intact.
#[test]
fn kernel_values_are_copied_out() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let value = big(&mut heap, "100000000000000000000");
    let mut out = value.to_bigint(&heap);
    out *= 2;
    assert_eq!(out.to_string(), "200000000000000000000");
    assert_eq!(value.to_s(10, &heap).unwrap(), "100000000000000000000");
}

// =============================================================================
// 4. Inspection
// =============================================================================

/// The dump renders one line per live slot in slot order.
#[test]
fn dump_lists_live_slots() {
    let mut heap = Heap::new(16, NoLimitTracker);
    big(&mut heap, "18446744073709551616");
    let gone = big(&mut heap, "36893488147419103232");
    big(&mut heap, "-18446744073709551616");
    heap.free(gone.ref_id().unwrap());

    let mut out = String::new();
    heap.dump_to(&mut out).unwrap();
    assert_eq!(
        out,
        "<IntegerObject #0 bignum=18446744073709551616>\n\
         <IntegerObject #2 bignum=-18446744073709551616>\n"
    );
}

/// Inspection of a huge value truncates to the fixed line capacity.
#[test]
fn inspect_truncates_huge_values() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let huge = "9".repeat(1000);
    let value = big(&mut heap, &huge);
    let line = heap.inspect(value.ref_id().unwrap()).unwrap();
    assert!(line.is_truncated());
    assert_eq!(line.as_str().len(), INSPECT_LINE_LEN);
    assert!(line.as_str().starts_with("<IntegerObject #0 bignum=9999"));

    heap.free(value.ref_id().unwrap());
    assert!(heap.inspect(value.ref_id().unwrap()).is_none());
}

/// Inspection does not allocate on the heap.
#[test]
fn inspection_leaves_heap_unchanged() {
    let mut heap = Heap::new(16, NoLimitTracker);
    big(&mut heap, "18446744073709551616");
    let before = heap.heap_stats();
    let mut lines = 0;
    heap.dump(|_, _| lines += 1);
    assert_eq!(lines, 1);
    assert_eq!(heap.heap_stats(), before);
}

// =============================================================================
// 5. Snapshots
// =============================================================================

/// `deep_clone` yields an independent heap where the same ids resolve to equal values.
#[test]
fn deep_clone_preserves_ids() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let a = big(&mut heap, "100000000000000000000");
    let b = big(&mut heap, "-999999999999999999999999");
    heap.free(a.ref_id().unwrap());

    let mut clone = heap.deep_clone().unwrap();
    assert_eq!(b.to_s(10, &clone).unwrap(), "-999999999999999999999999");
    assert_eq!(clone.heap_stats(), heap.heap_stats());

    clone.collect_garbage([]);
    assert!(heap.is_live(b.ref_id().unwrap()));
}

/// Slots hold `LongInt` data directly.
#[test]
fn slots_expose_long_int_data() {
    let mut heap = Heap::new(16, NoLimitTracker);
    let id = heap
        .allocate(HeapData::LongInt(LongInt::new(BigInt::from(1) << 100)))
        .unwrap();
    let HeapData::LongInt(li) = heap.get(id);
    assert_eq!(li.bits(), 101);
    assert_eq!(heap.get(id).variant_name(), "LongInt");
}
