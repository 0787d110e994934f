//! Signed magnitude/offset term combination
//!
//! A [`SignedTerm`] is one dyadic component of a fraction: a 64-bit magnitude
//! carrying its own sign, positioned `off` bits to the right of a shared
//! reference frame. Combination first resolves mixed sign pairings through
//! the identities `a + (-b) = a - b` and `(-a) - b = -(a + b)`, so the
//! arithmetic itself only ever runs on two same-signed operands aligned by
//! their offset difference.

use crate::bits::{shifted_add, shifted_sub};

/// One signed magnitude at a bit offset within a shared 64-bit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SignedTerm {
    pub sign: bool,
    pub mag: u64,
    pub off: u32,
}

impl SignedTerm {
    pub(crate) fn new(sign: bool, mag: u64, off: u32) -> Self {
        Self { sign, mag, off }
    }

    fn negated(self) -> Self {
        Self {
            sign: !self.sign,
            ..self
        }
    }
}

/// Total order deciding which operand is the accumulator (minuend).
///
/// Returns true when `r` has the larger effective magnitude once aligned and
/// the operands must swap: `r` is nonzero at a strictly smaller offset, or
/// the offsets tie and `r`'s raw magnitude is larger, or `l` is zero. The
/// exact shape of this tie-break keeps the mixed-sign identities from
/// recursing forever.
fn must_swap(l: &SignedTerm, r: &SignedTerm) -> bool {
    (l.off > r.off && r.mag != 0) || (l.off == r.off && r.mag > l.mag) || l.mag == 0
}

/// Combine `l + r` into a single signed term.
///
/// The returned flag is true when the magnitude sum overflowed the 64-bit
/// frame by exactly one unit of 2^64 and the result sits at offset 0, where
/// the caller must fold the excess into the adjacent term as one ULP. An
/// overflow at a positive offset is absorbed here instead, by shifting the
/// 65-bit result one place back into frame and decrementing the offset.
pub(crate) fn combine_add(l: SignedTerm, r: SignedTerm) -> (SignedTerm, bool) {
    if l.sign != r.sign {
        // a + (-b) = a - b and (-a) + b = -(a - b): flip r into l's sign
        // class and hand off to the sibling operation.
        return combine_sub(l, r.negated());
    }
    let (l, r) = if must_swap(&l, &r) { (r, l) } else { (l, r) };
    if l.mag == 0 || r.mag == 0 {
        return (SignedTerm::new(l.sign, l.mag, l.off), false);
    }
    let delta = r.off - l.off;
    let mut mag = l.mag;
    let mut off = l.off;
    let mut carry = shifted_add(&mut mag, r.mag, delta);
    if carry && off > 0 {
        mag = (1 << 63) | (mag >> 1);
        off -= 1;
        carry = false;
    }
    (SignedTerm::new(l.sign, mag, off), carry)
}

/// Combine `l - r` into a single signed term.
///
/// Swapping to put the larger effective magnitude first flips the result
/// sign. Never reports a carry: if offset truncation still leaves the
/// aligned subtrahend above the minuend, the wrapped difference is the two's
/// complement of the exact one, so the magnitude is negated and the sign
/// flipped instead.
pub(crate) fn combine_sub(l: SignedTerm, r: SignedTerm) -> (SignedTerm, bool) {
    if l.sign != r.sign {
        // a - (-b) = a + b and (-a) - b = -(a + b): same reduction as above.
        return combine_add(l, r.negated());
    }
    let (l, r, sign) = if must_swap(&l, &r) {
        (r, l, !l.sign)
    } else {
        (l, r, l.sign)
    };
    if l.mag == 0 || r.mag == 0 {
        return (SignedTerm::new(sign, l.mag, l.off), false);
    }
    let delta = r.off - l.off;
    let mut mag = l.mag;
    if shifted_sub(&mut mag, r.mag, delta) {
        return (SignedTerm::new(!sign, mag.wrapping_neg(), l.off), false);
    }
    (SignedTerm::new(sign, mag, l.off), false)
}
