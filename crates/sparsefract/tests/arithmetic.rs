//! SparseFract integration tests
//!
//! Algebraic properties of the arithmetic engine over the public API, plus
//! deterministic randomized checks with a seeded RNG.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sparsefract::{FractionError, SparseFraction};

const HALF: u64 = 0x8000_0000_0000_0000;
const QUARTER: u64 = 0x4000_0000_0000_0000;

/// A random well-formed fraction in the canonical encoding arithmetic
/// produces: zero-magnitude terms carry a positive sign, and the big
/// magnitude keeps its top bit clear so that any two generated values can be
/// added without leaving (-1, 1).
fn random_fraction(rng: &mut ChaCha20Rng) -> SparseFraction {
    let big = rng.next_u64() >> 1;
    let sign_big = big != 0 && rng.gen_bool(0.5);
    let raw_small = rng.next_u64();
    if raw_small == 0 {
        return SparseFraction::from_parts(sign_big, big, false, 0, 0).unwrap();
    }
    let small = raw_small << raw_small.leading_zeros();
    let offset = rng.next_u32() % 512;
    let sign_small = rng.gen_bool(0.5);
    SparseFraction::from_parts(sign_big, big, sign_small, offset, small).unwrap()
}

/// Same distribution restricted to a dense term only.
fn random_dense_fraction(rng: &mut ChaCha20Rng) -> SparseFraction {
    let big = rng.next_u64() >> 1;
    let sign_big = big != 0 && rng.gen_bool(0.5);
    SparseFraction::from_parts(sign_big, big, false, 0, 0).unwrap()
}

fn assert_normalized(v: &SparseFraction) {
    if v.small == 0 {
        assert_eq!(v.offset, 0, "zero small term with leftover offset: {v}");
        assert!(!v.sign_small, "zero small term with leftover sign: {v}");
    } else {
        assert!(v.small >> 63 != 0, "small term not left-aligned: {v}");
    }
}

// =============================================================================
// Section 1: Identities and involutions
// =============================================================================

mod identities {
    use super::*;

    #[test]
    fn test_default_round_trips_canonical_zero() {
        let zero = SparseFraction::default();
        assert_eq!(zero, SparseFraction::from_parts(false, 0, false, 0, 0).unwrap());
        assert_eq!(zero.to_f64(), 0.0);
    }

    #[test]
    fn test_negation_involution() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..1000 {
            let x = random_fraction(&mut rng);
            assert_eq!(x.neg().neg(), x);
        }
    }

    #[test]
    fn test_additive_identity() {
        let zero = SparseFraction::zero();
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        for _ in 0..1000 {
            let x = random_fraction(&mut rng);
            assert_eq!(x.add(zero).unwrap(), x, "x + 0 != x for {x}");
            assert_eq!(zero.add(x).unwrap(), x, "0 + x != x for {x}");
        }
    }

    #[test]
    fn test_additive_inverse_cancels_to_canonical_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        for _ in 0..1000 {
            let x = random_fraction(&mut rng);
            let sum = x.add(x.neg()).unwrap();
            assert_eq!(sum, SparseFraction::zero(), "x + (-x) != 0 for {x}");
        }
    }

    #[test]
    fn test_subtracting_self_cancels() {
        let mut rng = ChaCha20Rng::seed_from_u64(14);
        for _ in 0..1000 {
            let x = random_fraction(&mut rng);
            assert_eq!(x.sub(x).unwrap(), SparseFraction::zero());
        }
    }
}

// =============================================================================
// Section 2: Commutativity
// =============================================================================

mod commutativity {
    use super::*;

    #[test]
    fn test_addition_commutes() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        for _ in 0..1000 {
            let a = random_fraction(&mut rng);
            let b = random_fraction(&mut rng);
            assert_eq!(
                a.add(b).unwrap(),
                b.add(a).unwrap(),
                "a + b != b + a for a = {a}, b = {b}"
            );
        }
    }

    #[test]
    fn test_multiplication_commutes_dense() {
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        for _ in 0..1000 {
            let a = random_dense_fraction(&mut rng);
            let b = random_dense_fraction(&mut rng);
            assert_eq!(a.mul(b).unwrap(), b.mul(a).unwrap());
        }
    }

    #[test]
    fn test_multiplication_commutes_mixed() {
        // One sparse operand against one dense operand exercises both
        // big-by-small cross terms.
        let mut rng = ChaCha20Rng::seed_from_u64(23);
        for _ in 0..1000 {
            let a = random_fraction(&mut rng);
            let b = random_dense_fraction(&mut rng);
            assert_eq!(
                a.mul(b).unwrap(),
                b.mul(a).unwrap(),
                "a * b != b * a for a = {a}, b = {b}"
            );
        }
    }

    #[test]
    fn test_multiplication_commutes_sparse() {
        // Two fully sparse operands: the cross-term reduction order must not
        // depend on which operand each term came from, or offset truncation
        // makes the low bit of the small term order-sensitive.
        let mut rng = ChaCha20Rng::seed_from_u64(24);
        for _ in 0..5000 {
            let a = random_fraction(&mut rng);
            let b = random_fraction(&mut rng);
            assert_eq!(
                a.mul(b).unwrap(),
                b.mul(a).unwrap(),
                "a * b != b * a for a = {a}, b = {b}"
            );
        }
    }
}

// =============================================================================
// Section 3: Normalization invariant
// =============================================================================

mod normalization {
    use super::*;

    #[test]
    fn test_add_sub_results_stay_normalized() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        for _ in 0..1000 {
            let a = random_fraction(&mut rng);
            let b = random_fraction(&mut rng);
            assert_normalized(&a.add(b).unwrap());
            assert_normalized(&a.sub(b).unwrap());
        }
    }

    #[test]
    fn test_mul_results_stay_normalized() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        for _ in 0..1000 {
            let a = random_fraction(&mut rng);
            let b = random_fraction(&mut rng);
            assert_normalized(&a.mul(b).unwrap());
        }
    }

    #[test]
    fn test_accumulated_sums_stay_normalized() {
        let mut rng = ChaCha20Rng::seed_from_u64(33);
        let mut acc = SparseFraction::zero();
        for _ in 0..200 {
            let x = random_fraction(&mut rng);
            // Alternate add and sub so the accumulator stays in range.
            acc.add_assign(&x).unwrap();
            assert_normalized(&acc);
            acc.sub_assign(&x).unwrap();
            assert_normalized(&acc);
        }
        assert_eq!(acc, SparseFraction::zero());
    }
}

// =============================================================================
// Section 4: Range detection
// =============================================================================

mod range {
    use super::*;

    #[test]
    fn test_add_past_one_is_range_exceeded() {
        let a = SparseFraction::from_f64(0.75).unwrap();
        let b = SparseFraction::from_f64(0.5).unwrap();
        assert!(matches!(a.add(b), Err(FractionError::RangeExceeded)));
    }

    #[test]
    fn test_add_past_minus_one_is_range_exceeded() {
        let a = SparseFraction::from_f64(-0.75).unwrap();
        let b = SparseFraction::from_f64(-0.5).unwrap();
        assert!(matches!(a.add(b), Err(FractionError::RangeExceeded)));
    }

    #[test]
    fn test_sub_past_one_is_range_exceeded() {
        let a = SparseFraction::from_f64(0.75).unwrap();
        let b = SparseFraction::from_f64(-0.5).unwrap();
        assert!(matches!(a.sub(b), Err(FractionError::RangeExceeded)));
    }

    #[test]
    fn test_error_leaves_receiver_unmodified() {
        let mut a = SparseFraction::from_f64(0.75).unwrap();
        let before = a;
        let b = SparseFraction::from_f64(0.5).unwrap();
        assert!(a.add_assign(&b).is_err());
        assert_eq!(a, before);
    }

    #[test]
    fn test_shl_to_one_is_range_exceeded() {
        let half = SparseFraction::from_f64(0.5).unwrap();
        assert!(matches!(half.shl(1), Err(FractionError::RangeExceeded)));
        // In-range shifts still succeed
        let thirty_second = SparseFraction::from_f64(0.03125).unwrap();
        assert_eq!(
            thirty_second.shl(4).unwrap(),
            SparseFraction::from_f64(0.5).unwrap()
        );
    }
}

// =============================================================================
// Section 5: Reference scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_half_plus_quarter_and_product() {
        let half = SparseFraction::from_f64(0.5).unwrap();
        let quarter = SparseFraction::from_f64(0.25).unwrap();
        assert_eq!(half.big, HALF);
        assert_eq!(quarter.big, QUARTER);
        assert_eq!(half.small, 0);
        assert_eq!(quarter.offset, 0);

        let sum = half.add(quarter).unwrap();
        assert_eq!(sum, SparseFraction::from_f64(0.75).unwrap());
        assert_eq!(sum.big, 0xc000_0000_0000_0000);

        let product = half.mul(quarter).unwrap();
        assert_eq!(product, SparseFraction::from_f64(0.125).unwrap());
        assert_eq!(product.big, 0x2000_0000_0000_0000);
    }

    #[test]
    fn test_negative_half_from_double() {
        let pos = SparseFraction::from_f64(0.5).unwrap();
        let neg = SparseFraction::from_f64(-0.5).unwrap();
        assert!(neg.sign_big);
        assert_eq!(neg.big, pos.big);
        assert_eq!(neg.small, pos.small);
        assert_eq!(neg.to_f64(), -0.5);
    }

    #[test]
    fn test_half_squared_is_quarter() {
        let half = SparseFraction::from_parts(false, HALF, false, 0, 0).unwrap();
        let squared = half.mul(half).unwrap();
        assert_eq!(squared.big, QUARTER);
        assert_eq!(squared.small, 0);
        assert_eq!(squared.offset, 0);
    }

    #[test]
    fn test_multiply_chain_tracks_double_arithmetic() {
        // The original exerciser's loop: alternate multiplying by -0.5 and
        // +0.5. Every step is a pure exponent shift, exact in both
        // representations.
        let mut a = SparseFraction::from_parts(true, 0x8888_0000_0000_0000, false, 0, 0).unwrap();
        let b = SparseFraction::from_f64(-0.5).unwrap();
        let c = SparseFraction::from_f64(0.5).unwrap();
        let mut expected = a.to_f64();
        for _ in 0..16 {
            a.mul_assign(&b).unwrap();
            expected *= -0.5;
            assert_eq!(a.to_f64(), expected);
            a.mul_assign(&c).unwrap();
            expected *= 0.5;
            assert_eq!(a.to_f64(), expected);
        }
        // One net sign flip per round, an even count of them: the final sign
        // matches the negative seed.
        assert!(a.sign_big);
        assert!(expected < 0.0);
    }

    #[test]
    fn test_product_drains_into_small_term() {
        // 2^-64 * 0.5 has no dense bits left; the result lives entirely in
        // the small term.
        let ulp = SparseFraction::from_parts(false, 1, false, 0, 0).unwrap();
        let half = SparseFraction::from_f64(0.5).unwrap();
        let product = ulp.mul(half).unwrap();
        assert_eq!(product.big, 0);
        assert_eq!(product.small, HALF);
        assert_eq!(product.offset, 0);
        assert_eq!(product.to_f64(), 0.0);
    }
}
