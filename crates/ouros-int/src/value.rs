use std::{borrow::Cow, cmp::Ordering};

use num_bigint::BigInt;

use crate::{
    compact,
    exception::{ExcType, RunResult},
    heap::{Heap, HeapId},
    policy::{self, IntOp, Representation},
    resource::{LARGE_RESULT_THRESHOLD, ResourceError, ResourceTracker},
    tracer::HeapTracer,
    types::{IntOperand, LongInt, hash_i64},
};

/// An integer of unbounded magnitude, in exactly one of two representations.
///
/// Small values are stored inline as `Int`; values outside the i64 range live in the
/// heap arena as a `LongInt` and are referenced via `Ref(HeapId)`. Callers never
/// pick the representation: every constructor and arithmetic result goes through the
/// promotion policy in [`crate::policy`].
///
/// `Value` is `Copy`. Copying a `Ref` shares the heap slot for reading only; the
/// Kernel value is never mutated in place, so sharing is observationally the same as
/// holding an equal value. Use [`Value::copy_with_heap`] when an independent Extended
/// object is required.
///
/// There is no `PartialEq`: equality of two `Ref`s depends on heap
/// contents. Use [`Value::eq`] for numeric equality and [`Value::is`] for identity.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub enum Value {
    /// Compact representation.
    Int(i64),
    /// Extended representation: a `HeapData::LongInt` slot.
    Ref(HeapId),
}

impl Value {
    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        Self::Int(value)
    }

    /// Builds a value equal to `kernel`, demoting to `Int` when it fits.
    ///
    /// The Extended case owns a fresh copy; `kernel` is left untouched.
    pub fn from_bigint(
        kernel: &BigInt,
        heap: &mut Heap<impl ResourceTracker, impl HeapTracer>,
    ) -> Result<Self, ResourceError> {
        LongInt::from_kernel(kernel).into_value(heap)
    }

    /// Builds an Extended value without the demotion check.
    ///
    /// Useful for hosts that hand over a Kernel value directly. A small magnitude is
    /// allowed here; the next arithmetic result settles back to `Int`.
    pub fn extended(
        kernel: &BigInt,
        heap: &mut Heap<impl ResourceTracker, impl HeapTracer>,
    ) -> Result<Self, ResourceError> {
        LongInt::from_kernel(kernel).into_extended(heap)
    }

    /// Converts a float by truncating toward zero.
    ///
    /// Raises `FloatDomainError` for NaN and the infinities.
    pub fn from_f64(value: f64, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        let long_int = LongInt::from_f64(value)?;
        Ok(long_int.into_value(heap)?)
    }

    /// Parses a numeral in `radix` (2 to 36).
    ///
    /// Numerals that fit in i64 never touch the Kernel. Anything else is parsed by
    /// the Kernel and, if it really is out of range, allocated as Extended.
    pub fn parse(text: &str, radix: u32, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        compact::check_radix(radix)?;
        let numeral = compact::normalize_numeral(text).ok_or_else(|| ExcType::invalid_numeral(text))?;
        if let Some(i) = compact::parse(&numeral, radix) {
            return Ok(Self::Int(i));
        }

        let long_int = LongInt::parse(text, radix)?;
        if long_int.has_to_be_bignum() {
            Ok(long_int.into_extended(heap)?)
        } else {
            Ok(long_int.into_value(heap)?)
        }
    }

    /// Allocates an independent copy.
    ///
    /// `Int` is returned as is. A `Ref` gets a new slot holding its own Kernel value
    /// of equal magnitude; the representation is preserved.
    pub fn copy_with_heap(
        &self,
        heap: &mut Heap<impl ResourceTracker, impl HeapTracer>,
    ) -> Result<Self, ResourceError> {
        match self {
            Self::Int(i) => Ok(Self::Int(*i)),
            Self::Ref(id) => LongInt::from_kernel(heap.long_int(*id).inner()).into_extended(heap),
        }
    }

    // ------------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------------

    pub fn add(&self, rhs: &Self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Add, rhs, heap)
    }

    pub fn sub(&self, rhs: &Self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Sub, rhs, heap)
    }

    pub fn mul(&self, rhs: &Self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Mul, rhs, heap)
    }

    /// Floor division. Raises `ZeroDivisionError` when `rhs` is zero.
    pub fn div(&self, rhs: &Self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Div, rhs, heap)
    }

    /// Floor modulo, carrying the sign of `rhs`. Raises `ZeroDivisionError` when `rhs` is zero.
    pub fn modulo(&self, rhs: &Self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Mod, rhs, heap)
    }

    pub fn negate(&self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Neg, &Self::Int(0), heap)
    }

    pub fn abs(&self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<Self> {
        self.binary_op(IntOp::Abs, &Self::Int(0), heap)
    }

    /// Floor quotient and modulus, satisfying `self == q * rhs + r`.
    pub fn divmod(
        &self,
        rhs: &Self,
        heap: &mut Heap<impl ResourceTracker, impl HeapTracer>,
    ) -> RunResult<(Self, Self)> {
        if let (Self::Int(a), Self::Int(b)) = (self, rhs) {
            if *b == 0 {
                return Err(ExcType::zero_division(IntOp::Div, a).into());
            }
            if let (Some(q), Some(r)) = (compact::floor_div(*a, *b), compact::floor_mod(*a, *b)) {
                return Ok((Self::Int(q), Self::Int(r)));
            }
            heap.tracer_mut().on_promote(IntOp::Div);
        }

        let (q, r) = {
            let lhs = self.long_operand(heap);
            lhs.divmod(rhs.operand(heap))?
        };
        let q = q.into_value(heap)?;
        let r = r.into_value(heap)?;
        Ok((q, r))
    }

    /// Attempt compact, promote on overflow, settle the Kernel result.
    ///
    /// Operands are only borrowed from the heap while the Kernel computes an owned
    /// result; the heap is mutated once, afterwards, to store it.
    fn binary_op<T: ResourceTracker, Tr: HeapTracer>(
        &self,
        op: IntOp,
        rhs: &Self,
        heap: &mut Heap<T, Tr>,
    ) -> RunResult<Self> {
        if let (Self::Int(a), Self::Int(b)) = (self, rhs) {
            if op.divides() && *b == 0 {
                return Err(ExcType::zero_division(op, a).into());
            }
            if let Some(result) = policy::compact_eval(op, *a, *b) {
                return Ok(Self::Int(result));
            }
            heap.tracer_mut().on_promote(op);
        }

        let result = {
            let lhs = self.long_operand(heap);
            let rhs_operand = rhs.operand(heap);
            match op {
                IntOp::Add => lhs.add(rhs_operand),
                IntOp::Sub => lhs.sub(rhs_operand),
                IntOp::Mul => {
                    if let Some(estimated) = LongInt::estimate_mult_bytes(lhs.bits(), rhs_operand.bits())
                        && estimated > LARGE_RESULT_THRESHOLD
                    {
                        heap.tracker().check_large_result(estimated)?;
                    }
                    lhs.mul(rhs_operand)
                }
                IntOp::Div => lhs.div(rhs_operand)?,
                IntOp::Mod => lhs.modulo(rhs_operand)?,
                IntOp::Neg => lhs.negate(),
                IntOp::Abs => lhs.abs(),
            }
        };

        let had_extended = self.is_bignum() || (!op.is_unary() && rhs.is_bignum());
        let value = result.into_value(heap)?;
        if had_extended && !value.is_bignum() {
            heap.tracer_mut().on_demote(op);
        }
        Ok(value)
    }

    /// Left operand as a Kernel-backed `LongInt`, borrowed when already Extended.
    fn long_operand<'h>(&self, heap: &'h Heap<impl ResourceTracker, impl HeapTracer>) -> Cow<'h, LongInt> {
        match self {
            Self::Int(i) => Cow::Owned(LongInt::from(*i)),
            Self::Ref(id) => Cow::Borrowed(heap.long_int(*id)),
        }
    }

    fn operand<'h>(&self, heap: &'h Heap<impl ResourceTracker, impl HeapTracer>) -> IntOperand<'h> {
        match self {
            Self::Int(i) => IntOperand::Compact(*i),
            Self::Ref(id) => IntOperand::Extended(heap.long_int(*id)),
        }
    }

    // ------------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------------

    /// Three-way numeric comparison across representations.
    #[must_use]
    pub fn cmp(&self, other: &Self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Ref(id), _) => heap.long_int(*id).cmp_operand(other.operand(heap)),
            (Self::Int(_), Self::Ref(id)) => heap.long_int(*id).cmp_operand(self.operand(heap)).reverse(),
        }
    }

    #[must_use]
    pub fn eq(&self, other: &Self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        self.cmp(other, heap) == Ordering::Equal
    }

    #[must_use]
    pub fn lt(&self, other: &Self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        self.cmp(other, heap) == Ordering::Less
    }

    #[must_use]
    pub fn lte(&self, other: &Self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        self.cmp(other, heap) != Ordering::Greater
    }

    #[must_use]
    pub fn gt(&self, other: &Self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        self.cmp(other, heap) == Ordering::Greater
    }

    #[must_use]
    pub fn gte(&self, other: &Self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        self.cmp(other, heap) != Ordering::Less
    }

    /// Identity: same inline value, or the same heap slot.
    ///
    /// Two Extended values of equal magnitude in different slots are `eq` but not `is`.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn is_odd(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        match self {
            Self::Int(i) => compact::is_odd(*i),
            Self::Ref(id) => heap.long_int(*id).is_odd(),
        }
    }

    #[must_use]
    pub fn is_even(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        !self.is_odd(heap)
    }

    #[must_use]
    pub fn is_zero(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        match self {
            Self::Int(i) => *i == 0,
            Self::Ref(id) => heap.long_int(*id).is_zero(),
        }
    }

    #[must_use]
    pub fn is_negative(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> bool {
        match self {
            Self::Int(i) => *i < 0,
            Self::Ref(id) => heap.long_int(*id).is_negative(),
        }
    }

    /// Whether this value is held in the Extended representation.
    #[must_use]
    pub fn is_bignum(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    #[must_use]
    pub fn representation(&self) -> Representation {
        match self {
            Self::Int(_) => Representation::Compact,
            Self::Ref(_) => Representation::Extended,
        }
    }

    /// The heap slot of an Extended value, for use as a collection root.
    #[must_use]
    pub fn ref_id(&self) -> Option<HeapId> {
        match self {
            Self::Int(_) => None,
            Self::Ref(id) => Some(*id),
        }
    }

    /// Hash that is equal for equal values regardless of representation.
    #[must_use]
    pub fn hash_value(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> u64 {
        match self {
            Self::Int(i) => hash_i64(*i),
            Self::Ref(id) => heap.long_int(*id).hash(),
        }
    }

    // ------------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------------

    /// Renders the value in `radix` (2 to 36) with lowercase digits.
    ///
    /// Equal values render identically in either representation.
    pub fn to_s(&self, radix: u32, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> RunResult<String> {
        match self {
            Self::Int(i) => {
                compact::check_radix(radix)?;
                Ok(compact::to_str_radix(*i, radix))
            }
            Self::Ref(id) => heap.long_int(*id).to_s(radix),
        }
    }

    /// Returns an owned Kernel value equal to this integer.
    #[must_use]
    pub fn to_bigint(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> BigInt {
        match self {
            Self::Int(i) => BigInt::from(*i),
            Self::Ref(id) => heap.long_int(*id).inner().clone(),
        }
    }

    /// Returns the value as i64 if it fits.
    #[must_use]
    pub fn to_i64(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Ref(id) => heap.long_int(*id).to_i64(),
        }
    }

    /// Nearest `f64`; magnitudes beyond `f64::MAX` become infinite.
    #[must_use]
    pub fn to_f64(&self, heap: &Heap<impl ResourceTracker, impl HeapTracer>) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Ref(id) => heap.long_int(*id).to_f64(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{heap::HeapData, resource::NoLimitTracker, tracer::RecordingTracer};

    /// Creates a heap and directly allocates a LongInt with the given value.
    ///
    /// This bypasses `LongInt::into_value()`, which would demote i64-fitting values,
    /// so tests can exercise the transient small-Extended state.
    fn heap_with_long_int(value: i64) -> (Heap<NoLimitTracker>, Value) {
        let mut heap = Heap::new(16, NoLimitTracker);
        let id = heap.allocate(HeapData::LongInt(LongInt::from(value))).unwrap();
        (heap, Value::Ref(id))
    }

    #[test]
    fn small_extended_settles_on_next_result() {
        let (mut heap, five) = heap_with_long_int(5);
        let result = five.add(&Value::Int(-3), &mut heap).unwrap();
        assert!(matches!(result, Value::Int(2)));
    }

    #[test]
    fn small_extended_compares_like_compact() {
        let (heap, five) = heap_with_long_int(5);
        assert!(five.eq(&Value::Int(5), &heap));
        assert!(Value::Int(5).eq(&five, &heap));
        assert!(five.lt(&Value::Int(6), &heap));
        assert!(Value::Int(6).gt(&five, &heap));
        assert_eq!(five.is_odd(&heap), Value::Int(5).is_odd(&heap));
        assert_eq!(five.hash_value(&heap), Value::Int(5).hash_value(&heap));
    }

    #[test]
    fn compact_results_skip_the_heap() {
        let mut heap = Heap::with_tracer(4, NoLimitTracker, RecordingTracer::new());
        let result = Value::Int(20).mul(&Value::Int(3), &mut heap).unwrap();
        assert!(matches!(result, Value::Int(60)));
        assert_eq!(heap.size(), 0);
        assert!(heap.tracer().events().is_empty());
    }

    #[test]
    fn copy_preserves_representation() {
        let (mut heap, five) = heap_with_long_int(5);
        let copy = five.copy_with_heap(&mut heap).unwrap();
        assert!(copy.is_bignum());
        assert!(!copy.is(&five));
        assert!(copy.eq(&five, &heap));
    }
}
