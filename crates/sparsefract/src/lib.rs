//! Sparse dyadic fraction arithmetic
//!
//! A [`SparseFraction`] packs two widely separated clusters of significant
//! fraction bits into a 168-bit encoding covering the open interval (-1, 1):
//! a dense "big" term in positions [0, 64) after the binary point and a
//! left-aligned "small" term another `64 + offset` positions down. The
//! arithmetic engine (addition, subtraction, multiplication, negation,
//! doubling) operates directly on the encoding; the zero gap between the
//! clusters is never materialized.

mod bits;
mod error;
mod fraction;
mod term;

pub use error::{FractionError, Result};
pub use fraction::SparseFraction;
