//! Heap-resident integer types.

pub mod long_int;

pub use long_int::{IntOperand, LongInt, hash_i64};
