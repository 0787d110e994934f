//! Sparse dyadic fraction type and its arithmetic engine

use std::fmt;
use std::ops::Neg;

use crate::bits::{normalize_wide, wide_mul};
use crate::error::{FractionError, Result};
use crate::term::{combine_add, combine_sub, SignedTerm};

/// A signed fraction strictly inside (-1, 1), encoded as the sum of two
/// independently-signed dyadic terms:
///
/// ```text
/// value = sign_big * (big / 2^64) + sign_small * (small / 2^(128 + offset))
/// ```
///
/// `big` occupies bit positions [0, 64) after the binary point. `small`
/// continues the expansion after skipping `offset` zero bits beyond the big
/// term, so two widely separated clusters of significant bits fit in 168
/// bits without storing the gap.
///
/// Invariants: a nonzero `small` is left-aligned (top bit set); a zero
/// `small` has `offset == 0` and a positive sign. All arithmetic preserves
/// these; [`SparseFraction::from_parts`] enforces them on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SparseFraction {
    /// Sign of the dense term (true = negative)
    pub sign_big: bool,
    /// Sign of the sparse term; the two terms may disagree
    pub sign_small: bool,
    /// Dense 64-bit fractional magnitude
    pub big: u64,
    /// Sparse 64-bit fractional magnitude, left-aligned when nonzero
    pub small: u64,
    /// Zero-bit gap between the two terms, meaningful only when `small != 0`
    pub offset: u32,
}

impl SparseFraction {
    /// The canonical zero value (all fields zero).
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a fraction from a native double inside the open interval
    /// (-1, 1).
    ///
    /// Exact for dyadic values representable within 64 fractional bits;
    /// anything else is truncated (not rounded) to 64 bits in `big`. The
    /// small term is left zero. Non-finite input and input at or beyond ±1
    /// are rejected with [`FractionError::OutOfRange`].
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= -1.0 || value >= 1.0 {
            return Err(FractionError::OutOfRange { value });
        }
        let sign_big = value < 0.0;
        let mut rest = value.abs();
        let mut big = 0u64;
        for bit in (0..64).rev() {
            if rest >= 0.5 {
                big |= 1 << bit;
                rest -= 0.5;
            }
            rest *= 2.0;
        }
        Ok(Self {
            sign_big,
            sign_small: false,
            big,
            small: 0,
            offset: 0,
        })
    }

    /// Build a fraction from its raw fields. Debug/test escape hatch.
    ///
    /// Validates the normalization invariant and fails fast with
    /// [`FractionError::NotNormalized`] instead of letting downstream
    /// arithmetic misbehave on a non-left-aligned small term.
    pub fn from_parts(
        sign_big: bool,
        big: u64,
        sign_small: bool,
        offset: u32,
        small: u64,
    ) -> Result<Self> {
        if small == 0 {
            if offset != 0 || sign_small {
                return Err(FractionError::NotNormalized { small, offset });
            }
        } else if small >> 63 == 0 {
            return Err(FractionError::NotNormalized { small, offset });
        }
        Ok(Self {
            sign_big,
            sign_small,
            big,
            small,
            offset,
        })
    }

    /// Lossy double-precision approximation.
    ///
    /// Reconstructs from `big` alone, bit by bit; the small term and its
    /// offset are ignored entirely. Never fails.
    pub fn to_f64(&self) -> f64 {
        let mut x = 0.0;
        for bit in 0..64 {
            x /= 2.0;
            if self.big >> bit & 1 != 0 {
                x += 0.5;
            }
        }
        if self.sign_big {
            -x
        } else {
            x
        }
    }

    /// In-place addition. On error the receiver is left unmodified.
    pub fn add_assign(&mut self, rhs: &Self) -> Result<()> {
        *self = add_impl(*self, *rhs)?;
        Ok(())
    }

    /// `self + rhs`, reporting [`FractionError::RangeExceeded`] when the
    /// mathematical sum lies at or beyond ±1.
    pub fn add(mut self, rhs: Self) -> Result<Self> {
        self.add_assign(&rhs)?;
        Ok(self)
    }

    /// In-place subtraction. On error the receiver is left unmodified.
    pub fn sub_assign(&mut self, rhs: &Self) -> Result<()> {
        *self = sub_impl(*self, *rhs)?;
        Ok(())
    }

    /// `self - rhs`, with the same range policy as [`SparseFraction::add`].
    pub fn sub(mut self, rhs: Self) -> Result<Self> {
        self.sub_assign(&rhs)?;
        Ok(self)
    }

    /// In-place multiplication.
    ///
    /// The product of two in-range operands is always in range; the `Result`
    /// reports [`FractionError::OffsetOverflow`] when a cross term's offset
    /// no longer fits the 32-bit gap field, and otherwise only reflects the
    /// internal cross-term summation.
    pub fn mul_assign(&mut self, rhs: &Self) -> Result<()> {
        *self = mul_impl(*self, *rhs)?;
        Ok(())
    }

    /// `self * rhs`.
    pub fn mul(mut self, rhs: Self) -> Result<Self> {
        self.mul_assign(&rhs)?;
        Ok(self)
    }

    /// Negation: flips both sign bits in one step, magnitudes untouched.
    ///
    /// Negating a zero-magnitude term yields a noncanonical sign encoding;
    /// the next arithmetic operation re-canonicalizes it.
    pub fn neg(self) -> Self {
        Self {
            sign_big: !self.sign_big,
            sign_small: !self.sign_small,
            ..self
        }
    }

    /// In-place multiply by 2^n, one range-checked doubling per step.
    ///
    /// Reports [`FractionError::RangeExceeded`] as soon as a doubling would
    /// reach ±1; on error the receiver is left unmodified.
    pub fn shl_assign(&mut self, n: u32) -> Result<()> {
        let mut v = *self;
        for _ in 0..n {
            v = double(v)?;
        }
        *self = v;
        Ok(())
    }

    /// `self * 2^n`, with the same range policy as
    /// [`SparseFraction::shl_assign`].
    pub fn shl(mut self, n: u32) -> Result<Self> {
        self.shl_assign(n)?;
        Ok(self)
    }

    /// Reset zero-magnitude terms to their canonical sign/offset encoding.
    fn canonical(mut self) -> Self {
        if self.big == 0 {
            self.sign_big = false;
        }
        if self.small == 0 {
            self.sign_small = false;
            self.offset = 0;
        }
        self
    }
}

impl Neg for SparseFraction {
    type Output = SparseFraction;

    fn neg(self) -> SparseFraction {
        SparseFraction::neg(self)
    }
}

impl fmt::Display for SparseFraction {
    /// Diagnostic layout `<±big offset ±small>`, all magnitudes in hex. Not
    /// a parseable persisted format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}{:x} {:x} {}{:x}>",
            if self.sign_big { '-' } else { '+' },
            self.big,
            self.offset,
            if self.sign_small { '-' } else { '+' },
            self.small
        )
    }
}

#[derive(Clone, Copy)]
enum TermOp {
    Add,
    Sub,
}

/// `a + b` over the four big-sign pairings.
///
/// Mixed pairings reduce through `(-x) + b = -(x - b)` and
/// `a + (-y) = a - y` into a same-signed call of the sibling operation, as
/// pure recursion on fresh values rather than in-place sign toggling.
fn add_impl(a: SparseFraction, b: SparseFraction) -> Result<SparseFraction> {
    if a.sign_big == b.sign_big {
        combine_same_sign(a, b, TermOp::Add)
    } else if a.sign_big {
        Ok(sub_impl(a.neg(), b)?.neg().canonical())
    } else {
        sub_impl(a, b.neg())
    }
}

/// `a - b`, the mirror of [`add_impl`] via `(-x) - b = -(x + b)` and
/// `a - (-y) = a + y`.
fn sub_impl(a: SparseFraction, b: SparseFraction) -> Result<SparseFraction> {
    if a.sign_big == b.sign_big {
        combine_same_sign(a, b, TermOp::Sub)
    } else if a.sign_big {
        Ok(add_impl(a.neg(), b)?.neg().canonical())
    } else {
        add_impl(a, b.neg())
    }
}

/// Same-big-sign combination: big terms in one shared frame, small terms
/// aligned by offset, then small-term renormalization and carry folding.
fn combine_same_sign(a: SparseFraction, b: SparseFraction, op: TermOp) -> Result<SparseFraction> {
    let lb = SignedTerm::new(a.sign_big, a.big, 0);
    let rb = SignedTerm::new(b.sign_big, b.big, 0);
    let ls = SignedTerm::new(a.sign_small, a.small, a.offset);
    let rs = SignedTerm::new(b.sign_small, b.small, b.offset);

    let (big_term, big_carry) = match op {
        TermOp::Add => combine_add(lb, rb),
        TermOp::Sub => combine_sub(lb, rb),
    };
    // Carry out of the big term's top bit means the result reached ±1.
    if big_carry {
        return Err(FractionError::RangeExceeded);
    }
    let (small_term, small_carry) = match op {
        TermOp::Add => combine_add(ls, rs),
        TermOp::Sub => combine_sub(ls, rs),
    };

    let mut sign_big = big_term.sign;
    let mut big = big_term.mag;

    // Left-align the surviving small term, or reset it to canonical zero.
    let (sign_small, small, offset) = if small_term.mag == 0 {
        (false, 0, 0)
    } else {
        let shift = small_term.mag.leading_zeros();
        (small_term.sign, small_term.mag << shift, small_term.off + shift)
    };

    if small_carry {
        // One unit of 2^-64 escaped the small frame (only emitted at offset
        // zero, where it equals exactly one ULP of big). Fold it in the
        // small term's direction, flipping the big sign when the fold
        // crosses zero.
        if small_term.sign == sign_big {
            big = big.checked_add(1).ok_or(FractionError::RangeExceeded)?;
        } else if big > 0 {
            big -= 1;
        } else {
            big = 1;
            sign_big = small_term.sign;
        }
    }

    Ok(SparseFraction {
        sign_big,
        sign_small,
        big,
        small,
        offset,
    }
    .canonical())
}

/// One range-checked doubling.
fn double(mut v: SparseFraction) -> Result<SparseFraction> {
    if v.big >> 63 != 0 {
        return Err(FractionError::RangeExceeded);
    }
    v.big <<= 1;
    if v.small != 0 {
        if v.offset > 0 {
            // The whole small cluster slides one position toward big.
            v.offset -= 1;
        } else {
            // No gap left: the small term's top bit (set, by normalization)
            // crosses into the vacated bottom bit of big, honoring the two
            // terms' independent signs.
            v.small <<= 1;
            if v.sign_small == v.sign_big {
                v.big |= 1;
            } else if v.big != 0 {
                v.big -= 1;
            } else {
                v.big = 1;
                v.sign_big = v.sign_small;
            }
            if v.small == 0 {
                v.sign_small = false;
            } else {
                let shift = v.small.leading_zeros();
                v.small <<= shift;
                v.offset += shift;
            }
        }
    }
    Ok(v)
}

/// Full cross-multiplication of the two operands' big/small terms.
///
/// Each of the four cross products is widened to 128 bits, left-aligned into
/// a fresh single-term fraction at its combined bit weight, signed with the
/// XOR of its source signs, and the four are reduced with the adder. When
/// both big terms are zero only the small-small product survives.
fn mul_impl(a: SparseFraction, b: SparseFraction) -> Result<SparseFraction> {
    let ss = cross_small_small(&a, &b)?;
    if a.big == 0 && b.big == 0 {
        return Ok(ss);
    }
    let bb = cross_big_big(&a, &b);
    let ba = cross_big_small(b.sign_big, b.big, &a)?;
    let ab = cross_big_small(a.sign_big, a.big, &b)?;
    // The adder truncates by offset, so the reduction order is observable in
    // the low bit of the small term. Order the two big-by-small terms by
    // their own contents, not by which operand produced them, keeping the
    // product independent of operand order.
    let (first, second) = if cross_key(&ba) <= cross_key(&ab) {
        (ba, ab)
    } else {
        (ab, ba)
    };
    add_impl(add_impl(add_impl(bb, first)?, second)?, ss)
}

/// Total order on the small-only cross terms for the reduction above.
fn cross_key(t: &SparseFraction) -> (u32, u64, bool) {
    (t.offset, t.small, t.sign_small)
}

/// Narrow an offset computed in 64 bits back into the `u32` gap field,
/// failing deterministically instead of wrapping.
fn cross_offset(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| FractionError::OffsetOverflow { offset })
}

/// big * big: the high product half stays dense, a nonzero low half becomes
/// the small term with its alignment shift as the offset.
fn cross_big_big(a: &SparseFraction, b: &SparseFraction) -> SparseFraction {
    let (hi, lo) = wide_mul(a.big, b.big);
    let sign = a.sign_big != b.sign_big;
    let (sign_small, small, offset) = if lo != 0 {
        let shift = lo.leading_zeros();
        (sign, lo << shift, shift)
    } else {
        (false, 0, 0)
    };
    SparseFraction {
        sign_big: sign && hi != 0,
        sign_small,
        big: hi,
        small,
        offset,
    }
}

/// One big-by-small cross product: a small-only term at the small operand's
/// offset plus the product's alignment shift.
fn cross_big_small(big_sign: bool, big: u64, other: &SparseFraction) -> Result<SparseFraction> {
    let (hi, lo) = wide_mul(big, other.small);
    match normalize_wide(hi, lo) {
        Some((mag, shift)) => Ok(SparseFraction {
            sign_big: false,
            sign_small: big_sign != other.sign_small,
            big: 0,
            small: mag,
            offset: cross_offset(u64::from(other.offset) + u64::from(shift))?,
        }),
        None => Ok(SparseFraction::zero()),
    }
}

/// small * small: lands a further 64 bit positions down, past both offsets.
fn cross_small_small(a: &SparseFraction, b: &SparseFraction) -> Result<SparseFraction> {
    let (hi, lo) = wide_mul(a.small, b.small);
    match normalize_wide(hi, lo) {
        Some((mag, shift)) => Ok(SparseFraction {
            sign_big: false,
            sign_small: a.sign_small != b.sign_small,
            big: 0,
            small: mag,
            offset: cross_offset(
                u64::from(a.offset) + u64::from(b.offset) + 64 + u64::from(shift),
            )?,
        }),
        None => Ok(SparseFraction::zero()),
    }
}
