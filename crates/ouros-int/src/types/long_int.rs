//! LongInt wrapper for arbitrary precision integer support.
//!
//! `LongInt` is the Extended representation: a heap-resident wrapper that exclusively
//! owns one `num_bigint::BigInt` (the Kernel). Named `LongInt` to avoid confusion with
//! the external `BigInt` type. Integers that fit use `Value::Int(i64)`; `LongInt` only
//! appears when a result or a parsed numeral leaves the i64 range.
//!
//! Arithmetic here never allocates on the heap. Each operation computes an owned
//! `LongInt`, and [`LongInt::into_value`] then applies the demotion policy in a single
//! allocation step.

use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt::{self, Display, Write},
    hash::{DefaultHasher, Hash, Hasher},
    ops::Neg,
};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, Num, Signed, ToPrimitive, Zero};

use crate::{
    compact,
    exception::{ExcType, RunResult},
    heap::{GcInspect, Heap, HeapData, HeapId, InspectLine},
    policy::{self, IntOp, Settled},
    resource::{ResourceError, ResourceTracker},
    tracer::HeapTracer,
    value::Value,
};

/// Wrapper around `num_bigint::BigInt` for arbitrary precision integers.
///
/// The inner `BigInt` is accessible via `.0` for code that needs the Kernel directly.
/// A `LongInt` never shares its Kernel value: cloning one clones the digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct LongInt(pub BigInt);

/// Right-hand operand of an Extended operation, in either representation.
///
/// A Compact operand is widened to a Kernel value on demand; an Extended operand
/// is borrowed.
#[derive(Debug, Clone, Copy)]
pub enum IntOperand<'a> {
    Compact(i64),
    Extended(&'a LongInt),
}

impl<'a> IntOperand<'a> {
    /// The operand as a Kernel value.
    #[must_use]
    pub fn kernel(self) -> Cow<'a, BigInt> {
        match self {
            Self::Compact(i) => Cow::Owned(BigInt::from(i)),
            Self::Extended(li) => Cow::Borrowed(&li.0),
        }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Compact(i) => i == 0,
            Self::Extended(li) => li.is_zero(),
        }
    }

    /// Number of significant bits, used to size products before computing them.
    #[must_use]
    pub fn bits(self) -> u64 {
        match self {
            Self::Compact(i) => u64::from(64 - i.unsigned_abs().leading_zeros()),
            Self::Extended(li) => li.bits(),
        }
    }
}

impl Display for IntOperand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact(i) => write!(f, "{i}"),
            Self::Extended(li) => write!(f, "{li}"),
        }
    }
}

impl LongInt {
    /// Creates a new `LongInt` from a `BigInt`.
    #[must_use]
    pub fn new(bi: BigInt) -> Self {
        Self(bi)
    }

    /// Creates a `LongInt` holding a copy of `kernel`.
    ///
    /// The caller keeps its own value; the two never alias.
    #[must_use]
    pub fn from_kernel(kernel: &BigInt) -> Self {
        Self(kernel.clone())
    }

    /// Parses a numeral in the given radix (2 to 36).
    ///
    /// Accepts surrounding whitespace, one leading sign and single underscores
    /// between digits. Returns `ArgumentError` for anything else, including an
    /// out-of-range radix.
    pub fn parse(text: &str, radix: u32) -> RunResult<Self> {
        compact::check_radix(radix)?;
        let numeral = compact::normalize_numeral(text).ok_or_else(|| ExcType::invalid_numeral(text))?;
        match BigInt::from_str_radix(&numeral, radix) {
            Ok(bi) => Ok(Self(bi)),
            Err(_) => Err(ExcType::invalid_numeral(text).into()),
        }
    }

    /// Converts a float by truncating toward zero.
    ///
    /// NaN and the infinities raise `FloatDomainError`.
    pub fn from_f64(value: f64) -> RunResult<Self> {
        if !value.is_finite() {
            return Err(ExcType::float_domain(value).into());
        }
        let bi = BigInt::from_f64(value.trunc()).ok_or_else(|| ExcType::float_domain(value))?;
        Ok(Self(bi))
    }

    /// Converts to a `Value`, demoting to i64 if it fits.
    ///
    /// This is the single allocation point for arithmetic results: the Kernel result
    /// is already computed and owned when the heap is asked for a slot.
    pub fn into_value(self, heap: &mut Heap<impl ResourceTracker, impl HeapTracer>) -> Result<Value, ResourceError> {
        match policy::settle(self.0) {
            Settled::Compact(i) => Ok(Value::Int(i)),
            Settled::Extended(bi) => {
                let heap_id = heap.allocate(HeapData::LongInt(Self(bi)))?;
                Ok(Value::Ref(heap_id))
            }
        }
    }

    /// Allocates this value on the heap without applying the demotion policy.
    ///
    /// The resulting Extended value may hold a magnitude that fits in i64, which is a
    /// valid transient state: the next arithmetic result settles back to Compact.
    pub fn into_extended(
        self,
        heap: &mut Heap<impl ResourceTracker, impl HeapTracer>,
    ) -> Result<Value, ResourceError> {
        let heap_id = heap.allocate(HeapData::LongInt(self))?;
        Ok(Value::Ref(heap_id))
    }

    #[must_use]
    pub fn add(&self, rhs: IntOperand<'_>) -> Self {
        Self(&self.0 + &*rhs.kernel())
    }

    #[must_use]
    pub fn sub(&self, rhs: IntOperand<'_>) -> Self {
        Self(&self.0 - &*rhs.kernel())
    }

    #[must_use]
    pub fn mul(&self, rhs: IntOperand<'_>) -> Self {
        Self(&self.0 * &*rhs.kernel())
    }

    /// Floor division. Raises `ZeroDivisionError` for a zero divisor.
    pub fn div(&self, rhs: IntOperand<'_>) -> RunResult<Self> {
        if rhs.is_zero() {
            return Err(ExcType::zero_division(IntOp::Div, self).into());
        }
        Ok(Self(self.0.div_floor(&rhs.kernel())))
    }

    /// Floor modulo: a non-zero result carries the sign of the divisor.
    pub fn modulo(&self, rhs: IntOperand<'_>) -> RunResult<Self> {
        if rhs.is_zero() {
            return Err(ExcType::zero_division(IntOp::Mod, self).into());
        }
        Ok(Self(self.0.mod_floor(&rhs.kernel())))
    }

    /// Floor quotient and modulus in one Kernel call.
    pub fn divmod(&self, rhs: IntOperand<'_>) -> RunResult<(Self, Self)> {
        if rhs.is_zero() {
            return Err(ExcType::zero_division(IntOp::Div, self).into());
        }
        let (q, r) = self.0.div_mod_floor(&rhs.kernel());
        Ok((Self(q), Self(r)))
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self(-&self.0)
    }

    /// Returns the absolute value as a new `LongInt`.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Three-way comparison against either representation.
    #[must_use]
    pub fn cmp_operand(&self, rhs: IntOperand<'_>) -> Ordering {
        match rhs {
            IntOperand::Compact(i) => self.0.cmp(&BigInt::from(i)),
            IntOperand::Extended(other) => self.0.cmp(&other.0),
        }
    }

    #[must_use]
    pub fn eq_operand(&self, rhs: IntOperand<'_>) -> bool {
        self.cmp_operand(rhs) == Ordering::Equal
    }

    #[must_use]
    pub fn lt(&self, rhs: IntOperand<'_>) -> bool {
        self.cmp_operand(rhs) == Ordering::Less
    }

    #[must_use]
    pub fn lte(&self, rhs: IntOperand<'_>) -> bool {
        self.cmp_operand(rhs) != Ordering::Greater
    }

    #[must_use]
    pub fn gt(&self, rhs: IntOperand<'_>) -> bool {
        self.cmp_operand(rhs) == Ordering::Greater
    }

    #[must_use]
    pub fn gte(&self, rhs: IntOperand<'_>) -> bool {
        self.cmp_operand(rhs) != Ordering::Less
    }

    /// Parity from the last digit of the decimal rendering.
    ///
    /// An empty rendering counts as odd. `BigInt` never renders empty, so that arm
    /// is not reachable in practice.
    #[must_use]
    pub fn is_odd(&self) -> bool {
        let text = self.0.to_str_radix(10);
        match text.as_bytes().last() {
            Some(digit) => (digit - b'0') % 2 == 1,
            None => true,
        }
    }

    /// Renders the value in `radix` (2 to 36) with lowercase digits.
    pub fn to_s(&self, radix: u32) -> RunResult<String> {
        compact::check_radix(radix)?;
        Ok(self.0.to_str_radix(radix))
    }

    /// True iff the magnitude lies strictly outside `[i64::MIN, i64::MAX]`.
    #[must_use]
    pub fn has_to_be_bignum(&self) -> bool {
        policy::exceeds_compact_range(&self.0)
    }

    /// Hash that agrees with [`hash_i64`] whenever the value fits in i64.
    #[must_use]
    pub fn hash(&self) -> u64 {
        if let Some(i) = self.0.to_i64() {
            return hash_i64(i);
        }
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish()
    }

    /// Estimates memory size in bytes.
    ///
    /// Used for resource tracking. Rounds up bits to bytes to avoid underestimating
    /// (1 bit = 1 byte, not 0 bytes).
    #[must_use]
    pub fn estimate_size(&self) -> usize {
        let bits = self.0.bits();
        // On 32-bit platforms, saturate if bits is too large
        let bit_bytes = usize::try_from(bits).unwrap_or(usize::MAX).saturating_add(7) / 8;
        bit_bytes + std::mem::size_of::<BigInt>()
    }

    /// Estimates the result size of `a * b` in bytes.
    ///
    /// Returns `None` on overflow. The product of two numbers has at most
    /// `a_bits + b_bits` bits.
    #[must_use]
    pub fn estimate_mult_bytes(a_bits: u64, b_bits: u64) -> Option<usize> {
        let result_bits = a_bits.checked_add(b_bits)?;
        usize::try_from(result_bits.div_ceil(8)).ok()
    }

    /// Returns a reference to the inner `BigInt`.
    #[must_use]
    pub fn inner(&self) -> &BigInt {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    /// Nearest `f64`; magnitudes beyond `f64::MAX` become infinite.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(if self.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        })
    }

    /// Returns the number of significant bits. Zero has 0 bits.
    #[must_use]
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }
}

/// Hash of a Compact integer.
///
/// Equal values hash equally across representations: [`LongInt::hash`] defers
/// here whenever its value fits.
#[must_use]
pub fn hash_i64(value: i64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl GcInspect for LongInt {
    fn gc_inspect(&self, id: HeapId, out: &mut InspectLine) {
        // InspectLine truncates instead of failing
        let _ = write!(out, "<IntegerObject #{} bignum={}>", id.index(), self.0);
    }
}

// === Trait Implementations ===

impl From<BigInt> for LongInt {
    fn from(bi: BigInt) -> Self {
        Self(bi)
    }
}

impl From<i64> for LongInt {
    fn from(i: i64) -> Self {
        Self(BigInt::from(i))
    }
}

impl Neg for LongInt {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for LongInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
