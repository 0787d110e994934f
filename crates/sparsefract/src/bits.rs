//! Magnitude-level bit primitives
//!
//! Free helpers shared by the term-combination and multiplication layers.
//! Every variable shift here is bounds-checked; a shift count of 64 or more
//! is a defined no-op, never an undefined shift.

/// Full 64x64 -> 128-bit unsigned multiply, split into (hi, lo) halves.
pub(crate) fn wide_mul(lhs: u64, rhs: u64) -> (u64, u64) {
    let product = u128::from(lhs) * u128::from(rhs);
    ((product >> 64) as u64, product as u64)
}

/// Add `rhs >> delta` into `acc` in place.
///
/// `rhs` sits `delta` bit positions to the right of `acc`'s frame; bits
/// shifted out of the frame are truncated. Returns true when the 64-bit sum
/// wrapped past 2^64. `delta >= 64` contributes nothing.
pub(crate) fn shifted_add(acc: &mut u64, rhs: u64, delta: u32) -> bool {
    if delta >= 64 {
        return false;
    }
    let (sum, carried) = acc.overflowing_add(rhs >> delta);
    *acc = sum;
    carried
}

/// Subtract `rhs >> delta` from `acc` in place.
///
/// Returns true when the subtraction wrapped below zero. `delta >= 64`
/// contributes nothing.
pub(crate) fn shifted_sub(acc: &mut u64, rhs: u64, delta: u32) -> bool {
    if delta >= 64 {
        return false;
    }
    let (diff, borrowed) = acc.overflowing_sub(rhs >> delta);
    *acc = diff;
    borrowed
}

/// Left-align a 128-bit magnitude into a single 64-bit word.
///
/// Returns the aligned top 64 significant bits together with the left-shift
/// count `s` in `[0, 128)` that was applied, so the caller can fold `s` into
/// an offset. Bits pushed past the 64-bit window are truncated. Returns
/// `None` for a zero magnitude.
pub(crate) fn normalize_wide(hi: u64, lo: u64) -> Option<(u64, u32)> {
    if hi != 0 {
        let shift = hi.leading_zeros();
        let mag = if shift == 0 {
            hi
        } else {
            (hi << shift) | (lo >> (64 - shift))
        };
        Some((mag, shift))
    } else if lo != 0 {
        let shift = lo.leading_zeros();
        Some((lo << shift, 64 + shift))
    } else {
        None
    }
}
