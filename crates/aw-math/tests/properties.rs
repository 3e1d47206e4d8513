//! Property-based tests for aw-math numerical functions.
//!
//! Uses proptest to verify distributional and estimator properties hold
//! across many random inputs.

use aw_math::{quantile, quantiles, Gev};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

// ============================================================================
// Empirical quantile properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Quantiles at ascending levels never decrease.
    #[test]
    fn quantiles_are_monotone(
        data in prop::collection::vec(0.0..1_000.0f64, 1..200),
        mut levels in prop::collection::vec(0.01..0.99f64, 1..8),
    ) {
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let qs = quantiles(&data, &levels);
        for pair in qs.windows(2) {
            prop_assert!(pair[0] <= pair[1] + TOL, "non-monotone quantiles: {:?}", qs);
        }
    }

    /// Every quantile lies within the sample range.
    #[test]
    fn quantile_within_range(
        data in prop::collection::vec(-500.0..500.0f64, 1..100),
        q in 0.0..=1.0f64,
    ) {
        let lo = data.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let v = quantile(&data, q);
        prop_assert!(v >= lo - TOL && v <= hi + TOL, "q={} v={} range=[{},{}]", q, v, lo, hi);
    }

    /// Input order does not matter.
    #[test]
    fn quantile_order_invariant(
        data in prop::collection::vec(0.0..100.0f64, 1..50),
        q in 0.0..=1.0f64,
    ) {
        let mut reversed = data.clone();
        reversed.reverse();
        prop_assert_eq!(quantile(&data, q).to_bits(), quantile(&reversed, q).to_bits());
    }
}

// ============================================================================
// GEV distribution properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// cdf(ppf(p)) == p across shapes.
    #[test]
    fn gev_ppf_roundtrip(
        shape in -0.5..0.5f64,
        loc in -100.0..100.0f64,
        scale in 0.1..50.0f64,
        p in 0.01..0.99f64,
    ) {
        let d = Gev::new(shape, loc, scale);
        let x = d.ppf(p);
        prop_assert!(x.is_finite());
        prop_assert!((d.cdf(x) - p).abs() < 1e-7, "cdf(ppf({}))={}", p, d.cdf(x));
    }

    /// The upper edge of the central interval grows with its mass.
    #[test]
    fn gev_interval_upper_monotone(
        shape in -0.5..0.5f64,
        loc in 0.0..100.0f64,
        scale in 0.1..50.0f64,
        a in 0.01..0.98f64,
        gap in 0.001..0.01f64,
    ) {
        let d = Gev::new(shape, loc, scale);
        let (_, hi_a) = d.interval(a);
        let (_, hi_b) = d.interval(a + gap);
        prop_assert!(hi_b >= hi_a, "interval({})={} > interval({})={}", a, hi_a, a + gap, hi_b);
    }

    /// The log density is finite inside the support and the cdf stays in [0, 1].
    #[test]
    fn gev_cdf_bounded(
        shape in -0.5..0.5f64,
        scale in 0.1..50.0f64,
        x in -1_000.0..1_000.0f64,
    ) {
        let d = Gev::new(shape, 0.0, scale);
        let c = d.cdf(x);
        prop_assert!((0.0..=1.0).contains(&c), "cdf({})={}", x, c);
    }
}
