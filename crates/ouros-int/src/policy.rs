//! Promotion and demotion policy for integer results.
//!
//! Both halves of the policy are pure functions so they can be tested without a
//! heap: [`compact_eval`] attempts an operation in `i64` and reports when the
//! Kernel is needed, and [`settle`] picks the representation of a Kernel result.
//! The facade in [`crate::value`] strings them together:
//!
//! ```text
//! compact_eval(op, a, b) ── Some(n) ──> Compact(n)
//!        │
//!       None (promotion required)
//!        ▼
//! Kernel op on both operands ──> settle(result) ──> Compact | Extended
//! ```

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use strum::{Display, IntoStaticStr};

use crate::compact;

/// Integer operations subject to the promotion policy.
///
/// `Display` renders the operator the way error reports show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum IntOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "-@")]
    Neg,
    #[strum(serialize = "abs")]
    Abs,
}

impl IntOp {
    /// Whether a zero right-hand operand is a domain error for this operation.
    #[must_use]
    pub fn divides(self) -> bool {
        matches!(self, Self::Div | Self::Mod)
    }

    /// Whether the operation ignores its right-hand operand.
    #[must_use]
    pub fn is_unary(self) -> bool {
        matches!(self, Self::Neg | Self::Abs)
    }
}

/// Which variant backs an integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, serde::Serialize, serde::Deserialize)]
pub enum Representation {
    /// Inline `i64`, no heap allocation.
    Compact,
    /// Heap-resident `LongInt` owning a Kernel value.
    Extended,
}

/// Outcome of [`settle`]: the representation a Kernel result should take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Compact(i64),
    Extended(BigInt),
}

/// Attempts `op` on two compact operands.
///
/// Returns `None` when the result (or a zero divisor) requires the Kernel path.
/// For unary operations `rhs` is ignored.
#[must_use]
pub fn compact_eval(op: IntOp, lhs: i64, rhs: i64) -> Option<i64> {
    match op {
        IntOp::Add => compact::add(lhs, rhs),
        IntOp::Sub => compact::sub(lhs, rhs),
        IntOp::Mul => compact::mul(lhs, rhs),
        IntOp::Div => compact::floor_div(lhs, rhs),
        IntOp::Mod => compact::floor_mod(lhs, rhs),
        IntOp::Neg => compact::negate(lhs),
        IntOp::Abs => compact::abs(lhs),
    }
}

/// True iff `value` lies strictly outside `[i64::MIN, i64::MAX]`.
#[must_use]
pub fn exceeds_compact_range(value: &BigInt) -> bool {
    value.to_i64().is_none()
}

/// Returns the representation a value of this magnitude must take.
#[must_use]
pub fn representation_of(value: &BigInt) -> Representation {
    if exceeds_compact_range(value) {
        Representation::Extended
    } else {
        Representation::Compact
    }
}

/// Applies the demotion policy to a Kernel result.
#[must_use]
pub fn settle(value: BigInt) -> Settled {
    match value.to_i64() {
        Some(i) => Settled::Compact(i),
        None => Settled::Extended(value),
    }
}
