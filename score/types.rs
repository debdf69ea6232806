// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// Types used by more than one module live here. Types private to one module stay in it.

use serde::Deserialize;
use std::fmt;

/// The six scalar parameters of the boost transform.
///
/// All values are single precision. Inverted boost bounds are accepted and
/// produce the degenerate clamp result rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoostParams {
    pub min_score: f32,
    pub max_score: f32,
    pub min_adv_boost: f32,
    pub max_adv_boost: f32,
    pub slope: f32,
    pub intercept: f32,
}

impl Default for BoostParams {
    /// The reference parameters the scoring benchmarks were tuned against.
    fn default() -> Self {
        Self {
            min_score: 1.0,
            max_score: 100.0,
            min_adv_boost: 10.0,
            max_adv_boost: 200.0,
            slope: 0.2,
            intercept: 0.5,
        }
    }
}

/// One batch of candidate items as three parallel slices.
///
/// The batch borrows the caller's storage for the duration of a single transform
/// call. Only `scores` is ever written.
#[derive(Debug)]
pub struct ScoreBatch<'a> {
    pub scores: &'a mut [f32],
    pub adv_weights: &'a [f32],
    pub prosale_only_flags: &'a [bool],
}

impl<'a> ScoreBatch<'a> {
    /// Bundles the three slices. Equal lengths are a caller contract, checked only
    /// in debug builds or with the `checked` feature.
    #[inline]
    pub fn new(
        scores: &'a mut [f32],
        adv_weights: &'a [f32],
        prosale_only_flags: &'a [bool],
    ) -> Self {
        contract!(crate::error::check_batch_lengths(
            scores.len(),
            adv_weights.len(),
            prosale_only_flags.len()
        ));
        Self {
            scores,
            adv_weights,
            prosale_only_flags,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Reborrows the batch so it can be handed to a transform without giving up
    /// the caller's slices.
    #[inline]
    pub fn reborrow(&mut self) -> ScoreBatch<'_> {
        ScoreBatch {
            scores: &mut *self.scores,
            adv_weights: self.adv_weights,
            prosale_only_flags: self.prosale_only_flags,
        }
    }
}

/// The byte order a buffer's multi-byte values are encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// The byte order of the running platform. Resolved at compile time, so there
/// is no first-use initialization to order against.
pub const NATIVE_ORDER: ByteOrder = if cfg!(target_endian = "little") {
    ByteOrder::Little
} else {
    ByteOrder::Big
};

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => f.write_str("little-endian"),
            ByteOrder::Big => f.write_str("big-endian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_reference_benchmark() {
        let params = BoostParams::default();
        assert_eq!(params.min_score, 1.0);
        assert_eq!(params.max_score, 100.0);
        assert_eq!(params.min_adv_boost, 10.0);
        assert_eq!(params.max_adv_boost, 200.0);
        assert_eq!(params.slope, 0.2);
        assert_eq!(params.intercept, 0.5);
    }

    #[test]
    fn native_order_matches_target_endianness() {
        let probe = 1u16.to_ne_bytes();
        let expected = if probe[0] == 1 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(NATIVE_ORDER, expected);
    }

    #[test]
    fn reborrow_leaves_caller_slices_usable() {
        let mut scores = [1.0f32, 2.0];
        let weights = [0.0f32, 0.0];
        let flags = [false, true];
        let mut batch = ScoreBatch::new(&mut scores, &weights, &flags);
        batch.reborrow().scores[0] = 7.0;
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
        assert_eq!(scores, [7.0, 2.0]);
    }

    #[test]
    #[cfg(any(debug_assertions, feature = "checked"))]
    #[should_panic(expected = "contract violation")]
    fn mismatched_lengths_are_rejected_in_checked_builds() {
        let mut scores = [1.0f32, 2.0];
        let weights = [0.0f32];
        let flags = [false, true];
        ScoreBatch::new(&mut scores, &weights, &flags);
    }
}
