//! Heap and representation tracing.
//!
//! Provides a trait-based tracing system for the integer heap with zero-cost abstraction.
//! When using [`NoopTracer`], all trace methods compile away entirely via monomorphization,
//! the same way [`NoLimitTracker`](crate::resource::NoLimitTracker) eliminates resource
//! checking overhead.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable event log to stderr |
//! | [`RecordingTracer`] | Full event recording for tests or post-mortem |
//!
//! The heap is parameterized as `Heap<T: ResourceTracker, Tr: HeapTracer>`:
//!
//! ```
//! use ouros_int::{Heap, NoLimitTracker, RecordingTracer, Value};
//!
//! let mut heap = Heap::with_tracer(16, NoLimitTracker, RecordingTracer::new());
//! let max = Value::Int(i64::MAX);
//! let sum = max.add(&Value::Int(1), &mut heap).unwrap();
//! assert!(sum.is_bignum());
//! assert_eq!(heap.tracer().events().len(), 2); // promote + allocate
//! ```

use crate::{heap::HeapId, policy::IntOp};

/// Trace event emitted by the heap or the integer facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// An Extended integer was allocated.
    Allocate {
        id: HeapId,
        /// Estimated size in bytes, as reported to the resource tracker.
        size: usize,
    },
    /// A slot was released, by `free` or by a collection sweep.
    Free { id: HeapId },
    /// A collection pass finished.
    Collect {
        /// Slots reclaimed by this pass.
        freed: usize,
        /// Slots still live afterwards.
        live: usize,
    },
    /// A compact operation overflowed and was retried on the Kernel.
    Promote { op: IntOp },
    /// An operation on an Extended operand produced a compact result.
    Demote { op: IntOp },
}

/// Trait for heap tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait HeapTracer: std::fmt::Debug {
    #[inline(always)]
    fn on_allocate(&mut self, _id: HeapId, _size: usize) {}

    #[inline(always)]
    fn on_free(&mut self, _id: HeapId) {}

    /// Called after a mark-sweep pass.
    ///
    /// # Arguments
    /// * `freed` - Number of slots reclaimed
    /// * `live` - Number of slots still live
    #[inline(always)]
    fn on_collect(&mut self, _freed: usize, _live: usize) {}

    #[inline(always)]
    fn on_promote(&mut self, _op: IntOp) {}

    #[inline(always)]
    fn on_demote(&mut self, _op: IntOp) {}
}

// ============================================================================
// NoopTracer: zero-cost production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl HeapTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable event log
// ============================================================================

/// Tracer that prints a human-readable event log to stderr.
///
/// Output format:
/// ```text
///   ^^^ PROMOTE +
///   +++ ALLOC   HeapId(0)  size=32
///   vvv DEMOTE  -
///   --- FREE    HeapId(0)
///   *** GC      freed=1 live=0
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of events to print before stopping. None = unlimited.
    limit: Option<usize>,
    count: usize,
    stopped: bool,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new stderr tracer that stops after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} events) ---");
            self.stopped = true;
        }
    }
}

impl HeapTracer for StderrTracer {
    fn on_allocate(&mut self, id: HeapId, size: usize) {
        self.emit(format_args!("  +++ ALLOC   {id:?}  size={size}"));
    }

    fn on_free(&mut self, id: HeapId) {
        self.emit(format_args!("  --- FREE    {id:?}"));
    }

    fn on_collect(&mut self, freed: usize, live: usize) {
        self.emit(format_args!("  *** GC      freed={freed} live={live}"));
    }

    fn on_promote(&mut self, op: IntOp) {
        self.emit(format_args!("  ^^^ PROMOTE {op}"));
    }

    fn on_demote(&mut self, op: IntOp) {
        self.emit(format_args!("  vvv DEMOTE  {op}"));
    }
}

// ============================================================================
// RecordingTracer: full event capture
// ============================================================================

/// Tracer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Drops all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Consumes the tracer and returns its events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl HeapTracer for RecordingTracer {
    fn on_allocate(&mut self, id: HeapId, size: usize) {
        self.events.push(TraceEvent::Allocate { id, size });
    }

    fn on_free(&mut self, id: HeapId) {
        self.events.push(TraceEvent::Free { id });
    }

    fn on_collect(&mut self, freed: usize, live: usize) {
        self.events.push(TraceEvent::Collect { freed, live });
    }

    fn on_promote(&mut self, op: IntOp) {
        self.events.push(TraceEvent::Promote { op });
    }

    fn on_demote(&mut self, op: IntOp) {
        self.events.push(TraceEvent::Demote { op });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tracer_stops_at_limit() {
        let mut tracer = StderrTracer::with_limit(2);
        tracer.on_promote(IntOp::Add);
        tracer.on_demote(IntOp::Sub);
        tracer.on_collect(0, 0);
        assert!(tracer.stopped);
        assert_eq!(tracer.count, 2);
    }

    #[test]
    fn recording_tracer_keeps_order() {
        let mut tracer = RecordingTracer::new();
        tracer.on_promote(IntOp::Mul);
        tracer.on_collect(3, 1);
        assert_eq!(
            tracer.into_events(),
            vec![TraceEvent::Promote { op: IntOp::Mul }, TraceEvent::Collect { freed: 3, live: 1 }]
        );
    }
}
