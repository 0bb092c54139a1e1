#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "radix digits are always below 36")]
#![expect(clippy::cast_possible_wrap, reason = "heap deltas use wrapping arithmetic")]
mod heap;

mod compact;
mod exception;
pub mod policy;
mod resource;
pub mod tracer;
pub mod types;
mod value;

pub use crate::{
    compact::{MAX_RADIX, MIN_RADIX},
    exception::{ExcType, RunError, RunResult, SimpleException},
    heap::{GcInspect, Heap, HeapData, HeapDiff, HeapId, HeapStats, INSPECT_LINE_LEN, InspectLine},
    policy::{IntOp, Representation},
    resource::{
        DEFAULT_GC_INTERVAL, LARGE_RESULT_THRESHOLD, LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits,
        ResourceTracker,
    },
    tracer::{HeapTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
    types::{IntOperand, LongInt},
    value::Value,
};
