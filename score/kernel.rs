// ========================================================================================
//
//                      The kernel: A pure SIMD execution engine
//
// ========================================================================================
//
// This module contains the innermost loop of the native scoring path. It is
// allocation-free and branch-free in the vector body: every lane evaluates all three
// outcomes of the boost rule and a pair of lane masks picks the surviving one. A scalar
// tail handles the last `len % LANE_COUNT` items with the exact same rule, so the output
// is bit-identical to the managed path for every batch length.

use crate::types::BoostParams;
use std::simd::cmp::{SimdPartialEq, SimdPartialOrd};
use std::simd::num::{SimdFloat, SimdInt, SimdUint};
use std::simd::{Mask, Simd, f32x8};

// --- Type Aliases for Readability ---
// These types are part of the public API of the kernel.
pub type SimdVec = f32x8;
pub const LANE_COUNT: usize = SimdVec::LEN;

/// The score assigned to a prosale-only item that is excluded outright.
pub const EXCLUDED_SCORE: f32 = -1.0;

/// The per-item boost rule. This is the single scalar definition shared by the managed
/// transformer and the kernel tail.
///
/// The operation order is part of the contract: `weight * slope + intercept` is two
/// separately rounded operations, and the clamp applies the lower bound before the upper
/// one, so inverted bounds collapse to `max_adv_boost`. A NaN on either side of the clamp
/// is carried through to the score.
#[inline(always)]
pub fn boost_score(score: f32, adv_weight: f32, prosale_only: bool, params: &BoostParams) -> f32 {
    if !prosale_only {
        score
    } else if score <= 0.0 && score < params.min_score {
        EXCLUDED_SCORE
    } else {
        let raw = adv_weight * params.slope + params.intercept;
        let boost = nan_min(nan_max(raw, params.min_adv_boost), params.max_adv_boost);
        params.max_score * boost
    }
}

/// `max` that returns a NaN operand instead of skipping it. `a` wins when both are NaN.
#[inline(always)]
fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() {
        a
    } else if b.is_nan() {
        b
    } else {
        a.max(b)
    }
}

#[inline(always)]
fn nan_min(a: f32, b: f32) -> f32 {
    if a.is_nan() {
        a
    } else if b.is_nan() {
        b
    } else {
        a.min(b)
    }
}

/// Picks `yes` where `mask` is set and `no` elsewhere, bit for bit.
#[inline(always)]
fn blend(mask: Mask<i32, LANE_COUNT>, yes: SimdVec, no: SimdVec) -> SimdVec {
    let bits = mask.to_simd().cast::<u32>();
    SimdVec::from_bits((yes.to_bits() & bits) | (no.to_bits() & !bits))
}

/// Lane-wise `nan_max`.
#[inline(always)]
fn simd_nan_max(a: SimdVec, b: SimdVec) -> SimdVec {
    blend(a.is_nan(), a, blend(b.is_nan(), b, a.simd_max(b)))
}

/// Lane-wise `nan_min`.
#[inline(always)]
fn simd_nan_min(a: SimdVec, b: SimdVec) -> SimdVec {
    blend(a.is_nan(), a, blend(b.is_nan(), b, a.simd_min(b)))
}

/// Applies the boost rule in place to `scores`, eight lanes at a time.
///
/// `prosale_only_flags` holds one byte per item: zero is false, anything else is true.
/// Equal lengths are a caller contract, checked in debug and `checked` builds only.
#[inline]
pub fn transform_lanes(
    scores: &mut [f32],
    adv_weights: &[f32],
    prosale_only_flags: &[u8],
    params: &BoostParams,
) {
    contract!(crate::error::check_batch_lengths(
        scores.len(),
        adv_weights.len(),
        prosale_only_flags.len()
    ));

    let zero = SimdVec::splat(0.0);
    let min_scores = SimdVec::splat(params.min_score);
    let max_scores = SimdVec::splat(params.max_score);
    let min_adv_boosts = SimdVec::splat(params.min_adv_boost);
    let max_adv_boosts = SimdVec::splat(params.max_adv_boost);
    let slopes = SimdVec::splat(params.slope);
    let intercepts = SimdVec::splat(params.intercept);
    let excluded = SimdVec::splat(EXCLUDED_SCORE);
    let no_flag = Simd::<u32, LANE_COUNT>::splat(0);

    let mut score_chunks = scores.chunks_exact_mut(LANE_COUNT);
    let mut weight_chunks = adv_weights.chunks_exact(LANE_COUNT);
    let mut flag_chunks = prosale_only_flags.chunks_exact(LANE_COUNT);

    for ((score_chunk, weight_chunk), flag_chunk) in (&mut score_chunks)
        .zip(&mut weight_chunks)
        .zip(&mut flag_chunks)
    {
        let scores_vec = SimdVec::from_slice(score_chunk);
        let weights_vec = SimdVec::from_slice(weight_chunk);
        let is_prosale_only = Simd::<u8, LANE_COUNT>::from_slice(flag_chunk)
            .cast::<u32>()
            .simd_ne(no_flag);

        let is_excluded = scores_vec.simd_le(zero) & scores_vec.simd_lt(min_scores);
        let boosts = simd_nan_min(
            simd_nan_max(weights_vec * slopes + intercepts, min_adv_boosts),
            max_adv_boosts,
        );
        let prosale_scores = blend(is_excluded, excluded, max_scores * boosts);

        blend(is_prosale_only, prosale_scores, scores_vec).copy_to_slice(score_chunk);
    }

    for ((score, &adv_weight), &flag) in score_chunks
        .into_remainder()
        .iter_mut()
        .zip(weight_chunks.remainder())
        .zip(flag_chunks.remainder())
    {
        *score = boost_score(*score, adv_weight, flag != 0, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(scores: &[f32], weights: &[f32], flags: &[u8], params: &BoostParams) -> Vec<f32> {
        scores
            .iter()
            .zip(weights)
            .zip(flags)
            .map(|((&s, &w), &f)| boost_score(s, w, f != 0, params))
            .collect()
    }

    #[test]
    fn boost_rule_follows_the_three_branches() {
        let params = BoostParams::default();
        assert_eq!(boost_score(5.0, 10.0, true, &params), 1000.0);
        assert_eq!(boost_score(-2.0, 10.0, true, &params), -1.0);
        assert_eq!(boost_score(50.0, 10.0, false, &params), 50.0);
        // Zero is below `min_score`, so a flagged zero is excluded.
        assert_eq!(boost_score(0.0, 10.0, true, &params), -1.0);
        // Positive scores below `min_score` still get boosted.
        assert_eq!(boost_score(0.5, 1000.0, true, &params), 20_000.0);
    }

    #[test]
    fn non_positive_scores_at_or_above_min_score_are_boosted() {
        let params = BoostParams {
            min_score: -5.0,
            ..BoostParams::default()
        };
        assert_eq!(boost_score(-5.0, 0.0, true, &params), 1000.0);
        assert_eq!(boost_score(-6.0, 0.0, true, &params), -1.0);
    }

    #[test]
    fn inverted_bounds_collapse_to_the_upper_bound() {
        let params = BoostParams {
            min_adv_boost: 200.0,
            max_adv_boost: 10.0,
            ..BoostParams::default()
        };
        for weight in [-1e6, 0.0, 3.0, 1e6] {
            assert_eq!(boost_score(7.0, weight, true, &params), 1000.0);
        }
    }

    #[test]
    fn nan_in_the_clamp_reaches_the_score() {
        // An infinite weight times a zero slope is NaN.
        let flat = BoostParams {
            slope: 0.0,
            ..BoostParams::default()
        };
        assert!(boost_score(5.0, f32::INFINITY, true, &flat).is_nan());

        let nan_bound = BoostParams {
            min_adv_boost: f32::NAN,
            ..BoostParams::default()
        };
        assert!(boost_score(5.0, 10.0, true, &nan_bound).is_nan());
        let nan_bound = BoostParams {
            max_adv_boost: f32::NAN,
            ..BoostParams::default()
        };
        assert!(boost_score(5.0, 10.0, true, &nan_bound).is_nan());

        // Exclusion and unflagged items never reach the clamp.
        assert_eq!(boost_score(-2.0, f32::INFINITY, true, &flat), EXCLUDED_SCORE);
        assert_eq!(boost_score(5.0, f32::INFINITY, false, &flat), 5.0);
    }

    #[test]
    fn lanes_carry_nan_exactly_like_the_scalar_rule() {
        let params = BoostParams {
            slope: 0.0,
            ..BoostParams::default()
        };
        let scores = [5.0f32; 11];
        let mut weights = [10.0f32; 11];
        weights[1] = f32::INFINITY;
        weights[6] = f32::NEG_INFINITY;
        weights[9] = f32::INFINITY;
        let flags = [1u8; 11];
        let expected = reference(&scores, &weights, &flags, &params);

        let mut actual = scores;
        transform_lanes(&mut actual, &weights, &flags, &params);

        for (i, (score, expected)) in actual.iter().zip(&expected).enumerate() {
            assert_eq!(score.is_nan(), matches!(i, 1 | 6 | 9), "item {i}");
            assert_eq!(score.is_nan(), expected.is_nan(), "item {i}");
            if !score.is_nan() {
                assert_eq!(score, expected, "item {i}");
            }
        }
    }

    #[test]
    fn lanes_match_the_scalar_rule_including_the_tail() {
        let params = BoostParams::default();
        let scores: Vec<f32> = (0..19).map(|i| i as f32 - 4.0).collect();
        let weights: Vec<f32> = (0..19).map(|i| 1.0 / (i as f32)).collect();
        let flags: Vec<u8> = (0..19).map(|i| (i % 3 != 0) as u8).collect();
        let expected = reference(&scores, &weights, &flags, &params);

        let mut actual = scores.clone();
        transform_lanes(&mut actual, &weights, &flags, &params);

        let expected_bits: Vec<u32> = expected.iter().map(|v| v.to_bits()).collect();
        let actual_bits: Vec<u32> = actual.iter().map(|v| v.to_bits()).collect();
        assert_eq!(actual_bits, expected_bits);
    }

    #[test]
    fn any_non_zero_flag_byte_counts_as_set() {
        let params = BoostParams::default();
        let mut scores = [5.0f32; 8];
        let weights = [10.0f32; 8];
        let flags = [0u8, 1, 2, 0x80, 0xFF, 0, 0, 7];
        transform_lanes(&mut scores, &weights, &flags, &params);
        assert_eq!(scores, [5.0, 1000.0, 1000.0, 1000.0, 1000.0, 5.0, 5.0, 1000.0]);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut scores: [f32; 0] = [];
        transform_lanes(&mut scores, &[], &[], &BoostParams::default());
    }
}
