use std::{
    collections::BTreeMap,
    fmt::{self, Write},
};

use crate::{
    resource::{ResourceError, ResourceTracker},
    tracer::{HeapTracer, NoopTracer},
    types::LongInt,
};

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_type` map uses `BTreeMap` for deterministic iteration order,
/// making snapshots suitable for display and comparison without sort overhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total heap capacity (live + free).
    pub total_slots: usize,
    /// Breakdown of live objects by `HeapData` variant name.
    pub objects_by_type: BTreeMap<&'static str, usize>,
    /// Resource tracker allocation count, if using `LimitedTracker`.
    pub tracker_allocations: Option<usize>,
    /// Resource tracker memory usage in bytes, if using `LimitedTracker`.
    pub tracker_memory_bytes: Option<usize>,
}

/// Difference between two heap snapshots.
///
/// Computed by comparing a "before" and "after" `HeapStats` via
/// [`HeapStats::diff`]. Positive deltas mean growth, negative means shrinkage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapDiff {
    /// Change in live object count (`after - before`).
    pub live_objects_delta: isize,
    /// Change in free slot count.
    pub free_slots_delta: isize,
    /// Change in total slot count.
    pub total_slots_delta: isize,
    /// Per-type deltas. Only includes types present in either snapshot.
    pub objects_by_type_delta: BTreeMap<&'static str, isize>,
    /// Change in tracker allocations (only if both snapshots have the value).
    pub tracker_allocations_delta: Option<isize>,
    /// Change in tracker memory bytes (only if both snapshots have the value).
    pub tracker_memory_bytes_delta: Option<isize>,
}

impl HeapStats {
    /// Computes the difference between `self` ("before") and `other` ("after").
    ///
    /// # Example
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use ouros_int::HeapStats;
    /// let before = HeapStats {
    ///     live_objects: 2, free_slots: 0, total_slots: 2,
    ///     objects_by_type: BTreeMap::new(),
    ///     tracker_allocations: None, tracker_memory_bytes: None,
    /// };
    /// let after = HeapStats {
    ///     live_objects: 5, free_slots: 1, total_slots: 6,
    ///     objects_by_type: BTreeMap::new(),
    ///     tracker_allocations: None, tracker_memory_bytes: None,
    /// };
    /// let diff = before.diff(&after);
    /// assert_eq!(diff.live_objects_delta, 3);
    /// ```
    #[must_use]
    pub fn diff(&self, other: &Self) -> HeapDiff {
        let mut objects_by_type_delta = BTreeMap::new();
        for (&type_name, &count) in &self.objects_by_type {
            let after_count = other.objects_by_type.get(type_name).copied().unwrap_or(0);
            objects_by_type_delta.insert(type_name, isize_delta(count, after_count));
        }
        for (&type_name, &count) in &other.objects_by_type {
            objects_by_type_delta
                .entry(type_name)
                .or_insert_with(|| isize_delta(0, count));
        }

        HeapDiff {
            live_objects_delta: isize_delta(self.live_objects, other.live_objects),
            free_slots_delta: isize_delta(self.free_slots, other.free_slots),
            total_slots_delta: isize_delta(self.total_slots, other.total_slots),
            objects_by_type_delta,
            tracker_allocations_delta: optional_isize_delta(self.tracker_allocations, other.tracker_allocations),
            tracker_memory_bytes_delta: optional_isize_delta(self.tracker_memory_bytes, other.tracker_memory_bytes),
        }
    }
}

impl HeapDiff {
    /// Returns `true` when all deltas are zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_objects_delta == 0
            && self.free_slots_delta == 0
            && self.total_slots_delta == 0
            && self.objects_by_type_delta.values().all(|&v| v == 0)
            && self.tracker_allocations_delta.is_none_or(|d| d == 0)
            && self.tracker_memory_bytes_delta.is_none_or(|d| d == 0)
    }
}

impl fmt::Display for HeapDiff {
    /// Produces a human-readable summary, for example:
    ///
    /// ```text
    /// HeapDiff: +3 live objects, +4 slots
    ///   LongInt: +3
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "HeapDiff: no changes");
        }

        write!(
            f,
            "HeapDiff: {:+} live objects, {:+} slots",
            self.live_objects_delta, self.total_slots_delta
        )?;
        for (&type_name, &delta) in &self.objects_by_type_delta {
            if delta != 0 {
                write!(f, "\n  {type_name}: {delta:+}")?;
            }
        }
        if let Some(alloc_delta) = self.tracker_allocations_delta
            && alloc_delta != 0
        {
            write!(f, "\n  Tracker allocations: {alloc_delta:+}")?;
        }
        if let Some(mem_delta) = self.tracker_memory_bytes_delta
            && mem_delta != 0
        {
            write!(f, "\n  Tracker memory: {mem_delta:+} bytes")?;
        }
        Ok(())
    }
}

/// Computes `after - before` as `isize`, handling the `usize -> isize` conversion.
fn isize_delta(before: usize, after: usize) -> isize {
    (after as isize).wrapping_sub(before as isize)
}

/// Returns `Some(delta)` only when both values are `Some`.
fn optional_isize_delta(before: Option<usize>, after: Option<usize>) -> Option<isize> {
    match (before, after) {
        (Some(b), Some(a)) => Some(isize_delta(b, a)),
        _ => None,
    }
}

/// Unique identifier for values stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Capacity of an [`InspectLine`] in bytes.
pub const INSPECT_LINE_LEN: usize = 256;

/// Fixed-size buffer receiving one diagnostic line from [`GcInspect`].
///
/// Writes past the capacity are truncated on a character boundary, never
/// reallocated, so the dump path has a bounded footprint however large the
/// inspected value is.
pub struct InspectLine {
    buf: [u8; INSPECT_LINE_LEN],
    len: usize,
    truncated: bool,
}

impl InspectLine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: [0; INSPECT_LINE_LEN],
            len: 0,
            truncated: false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // only whole characters are ever copied in
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// Whether some output did not fit.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Default for InspectLine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for InspectLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = INSPECT_LINE_LEN - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            self.truncated = true;
        }
        Ok(())
    }
}

impl fmt::Debug for InspectLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InspectLine").field(&self.as_str()).finish()
    }
}

impl fmt::Display for InspectLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic hook invoked by the heap dump path.
///
/// Implementations get no access to the heap, so they cannot allocate on it or
/// start a collection while the dump is running.
pub trait GcInspect {
    fn gc_inspect(&self, id: HeapId, out: &mut InspectLine);
}

/// Payload stored in a heap slot.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum HeapData {
    /// Extended integer owning its Kernel value.
    LongInt(LongInt),
}

impl HeapData {
    /// Static variant name used by [`HeapStats`].
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::LongInt(_) => "LongInt",
        }
    }

    /// Approximate size in bytes, reported to the resource tracker.
    #[must_use]
    pub fn estimate_size(&self) -> usize {
        match self {
            Self::LongInt(li) => li.estimate_size(),
        }
    }

    /// Pushes the ids this object references onto the mark work list.
    fn collect_child_ids(&self, _work_list: &mut Vec<HeapId>) {
        match self {
            // Leaf: owns a Kernel value and nothing else
            Self::LongInt(_) => {}
        }
    }
}

impl GcInspect for HeapData {
    fn gc_inspect(&self, id: HeapId, out: &mut InspectLine) {
        match self {
            Self::LongInt(li) => li.gc_inspect(id, out),
        }
    }
}

/// Arena that backs every heap-resident integer.
///
/// Uses a free list to reuse slots from freed values, keeping memory usage
/// constant for long-running loops that repeatedly promote and drop values.
/// Objects live until a mark-sweep pass finds them unreachable from the roots
/// the host supplies, or until they are freed explicitly.
///
/// Generic over `T: ResourceTracker` (limits, GC scheduling) and `Tr: HeapTracer`
/// (event log). With `NoLimitTracker` and `NoopTracer` all hooks compile away.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "T: serde::Serialize",
    deserialize = "T: serde::Deserialize<'de>, Tr: Default"
))]
pub struct Heap<T: ResourceTracker, Tr: HeapTracer = NoopTracer> {
    entries: Vec<Option<HeapData>>,
    /// IDs of freed slots available for reuse. Populated by `free` and sweeps, consumed by `allocate`.
    free_list: Vec<HeapId>,
    tracker: T,
    /// Not serialized; a restored heap starts with a fresh tracer.
    #[serde(skip)]
    tracer: Tr,
    /// Global collection switch; while false, `collect_garbage` is a no-op.
    gc_enabled: bool,
    /// Number of allocations since the last collection pass.
    allocations_since_gc: usize,
}

impl<T: ResourceTracker> Heap<T> {
    /// Creates a new heap with the given resource tracker and no tracing.
    #[must_use]
    pub fn new(capacity: usize, tracker: T) -> Self {
        Self::with_tracer(capacity, tracker, NoopTracer)
    }
}

impl<T: ResourceTracker, Tr: HeapTracer> Heap<T, Tr> {
    /// Creates a new heap that reports events to `tracer`.
    #[must_use]
    pub fn with_tracer(capacity: usize, tracker: T, tracer: Tr) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            tracker,
            tracer,
            gc_enabled: true,
            allocations_since_gc: 0,
        }
    }

    /// Creates an independent deep copy of this heap via a `postcard` round-trip.
    ///
    /// Heap identities (`HeapId`) remain valid in the clone because the arena layout
    /// is preserved, so values held by the host can be used against either heap.
    /// The clone gets a default tracer.
    pub fn deep_clone(&self) -> Result<Self, postcard::Error>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        Tr: Default,
    {
        let bytes = postcard::to_allocvec(self)?;
        postcard::from_bytes(&bytes)
    }

    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    /// Allocates a new heap entry.
    ///
    /// Returns `Err(ResourceError)` if allocation would exceed configured limits.
    /// The heap never collects from inside `allocate`: collection needs roots, which
    /// only the host knows, so it happens at the host's safepoints via
    /// [`Self::should_gc`] and [`Self::collect_garbage`].
    pub fn allocate(&mut self, data: HeapData) -> Result<HeapId, ResourceError> {
        let size = data.estimate_size();
        self.tracker.on_allocate(|| size)?;
        self.allocations_since_gc = self.allocations_since_gc.saturating_add(1);

        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id.index()] = Some(data);
            id
        } else {
            let id = HeapId::from_index(self.entries.len());
            self.entries.push(Some(data));
            id
        };
        self.tracer.on_allocate(id, size);
        Ok(id)
    }

    /// Returns an immutable reference to the heap data stored at the given ID.
    ///
    /// # Panics
    /// Panics if the value ID is invalid or the value has already been freed.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.entries
            .get(id.index())
            .expect("Heap::get: slot missing")
            .as_ref()
            .expect("Heap::get: object already freed")
    }

    /// Returns heap data if the slot is live, `None` if it is missing or freed.
    #[must_use]
    pub fn get_if_live(&self, id: HeapId) -> Option<&HeapData> {
        self.entries.get(id.index())?.as_ref()
    }

    /// Returns the Extended integer stored at `id`.
    ///
    /// # Panics
    /// Panics if the value ID is invalid or the value has already been freed.
    #[must_use]
    pub fn long_int(&self, id: HeapId) -> &LongInt {
        match self.get(id) {
            HeapData::LongInt(li) => li,
        }
    }

    #[must_use]
    pub fn is_live(&self, id: HeapId) -> bool {
        self.get_if_live(id).is_some()
    }

    /// Releases a slot immediately.
    ///
    /// The payload (and with it the owned Kernel value) is dropped before the slot
    /// is pushed onto the free list. Freeing an already-free or unknown slot is a
    /// no-op and returns `false`.
    pub fn free(&mut self, id: HeapId) -> bool {
        let Some(data) = self.entries.get_mut(id.index()).and_then(Option::take) else {
            return false;
        };
        self.release(id, data);
        true
    }

    fn release(&mut self, id: HeapId, data: HeapData) {
        self.tracker.on_free(|| data.estimate_size());
        drop(data);
        self.free_list.push(id);
        self.tracer.on_free(id);
    }

    /// Re-enables collection passes.
    pub fn gc_enable(&mut self) {
        self.gc_enabled = true;
    }

    /// Disables collection passes until [`Self::gc_enable`] is called.
    ///
    /// Allocation is unaffected; unreachable objects simply accumulate.
    pub fn gc_disable(&mut self) {
        self.gc_enabled = false;
    }

    #[must_use]
    pub fn is_gc_enabled(&self) -> bool {
        self.gc_enabled
    }

    /// Returns whether garbage collection should run.
    ///
    /// True if collection is enabled and the number of allocations since the last
    /// pass reached the tracker's interval.
    #[inline]
    #[must_use]
    pub fn should_gc(&self) -> bool {
        self.gc_enabled && self.allocations_since_gc >= self.tracker.gc_interval()
    }

    /// Runs mark-sweep garbage collection and returns the number of slots freed.
    ///
    /// Marks everything reachable from `roots`, then frees every other live slot.
    /// Does nothing (and returns 0) while collection is disabled.
    ///
    /// # Arguments
    /// * `roots` - HeapIds the host still holds
    pub fn collect_garbage(&mut self, roots: impl IntoIterator<Item = HeapId>) -> usize {
        if !self.gc_enabled {
            return 0;
        }

        // Mark phase
        let mut reachable = vec![false; self.entries.len()];
        let mut work_list: Vec<HeapId> = roots.into_iter().collect();
        while let Some(id) = work_list.pop() {
            let idx = id.index();
            if idx >= reachable.len() || reachable[idx] {
                continue;
            }
            if let Some(Some(data)) = self.entries.get(idx) {
                reachable[idx] = true;
                data.collect_child_ids(&mut work_list);
            }
        }

        // Sweep phase
        let mut freed = 0;
        for (idx, is_reachable) in reachable.into_iter().enumerate() {
            if is_reachable {
                continue;
            }
            if let Some(data) = self.entries[idx].take() {
                self.release(HeapId::from_index(idx), data);
                freed += 1;
            }
        }

        self.allocations_since_gc = 0;
        self.tracer.on_collect(freed, self.live_count());
        freed
    }

    /// Frees every live slot regardless of the collection switch.
    ///
    /// Used at process teardown so exit-time accounting sees an empty heap.
    pub fn collect_all(&mut self) -> usize {
        let mut freed = 0;
        for idx in 0..self.entries.len() {
            if let Some(data) = self.entries[idx].take() {
                self.release(HeapId::from_index(idx), data);
                freed += 1;
            }
        }
        self.allocations_since_gc = 0;
        self.tracer.on_collect(freed, 0);
        freed
    }

    /// Renders one live slot through its [`GcInspect`] hook.
    #[must_use]
    pub fn inspect(&self, id: HeapId) -> Option<InspectLine> {
        let data = self.get_if_live(id)?;
        let mut line = InspectLine::new();
        data.gc_inspect(id, &mut line);
        Some(line)
    }

    /// Diagnostic dump: passes every live slot's inspection line to `sink`, in slot order.
    pub fn dump(&self, mut sink: impl FnMut(HeapId, &InspectLine)) {
        let mut line = InspectLine::new();
        for (idx, slot) in self.entries.iter().enumerate() {
            if let Some(data) = slot {
                let id = HeapId::from_index(idx);
                line.len = 0;
                line.truncated = false;
                data.gc_inspect(id, &mut line);
                sink(id, &line);
            }
        }
    }

    /// Writes the dump to any `fmt::Write` sink, one line per live slot.
    pub fn dump_to(&self, out: &mut impl Write) -> fmt::Result {
        let mut result = Ok(());
        self.dump(|_, line| {
            if result.is_ok() {
                result = writeln!(out, "{line}");
            }
        });
        result
    }

    /// Number of live slots.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }

    /// Total number of slots, live or free.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Captures a [`HeapStats`] snapshot.
    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        let mut objects_by_type = BTreeMap::new();
        let mut live_objects = 0;
        for data in self.entries.iter().flatten() {
            live_objects += 1;
            *objects_by_type.entry(data.variant_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects,
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
            objects_by_type,
            tracker_allocations: self.tracker.allocation_count(),
            tracker_memory_bytes: self.tracker.current_memory_bytes(),
        }
    }
}
