// ========================================================================================
//                          The native scoring entry point (C ABI)
// ========================================================================================
//
// Foreign callers stage a batch into natively-ordered memory (typically three
// `AlignedRegion`s) and pass the raw buffers here. The scores buffer is rewritten in
// place; nothing is copied on the way in or out.

use crate::kernel;
use crate::types::BoostParams;
use std::slice;

/// The outcome of a native scoring call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStatus {
    Ok = 0,
    NullPointer = 1,
    Misaligned = 2,
}

/// Applies the boost transform in place to `size` items.
///
/// - `scores`: `size` native-order `f32` values, rewritten in place.
/// - `adv_weights`: `size` native-order `f32` values.
/// - `prosale_only_flags`: `size` bytes, zero for false and anything else for true.
///
/// A `size` of zero returns `Ok` without touching any buffer. Null buffers and float
/// buffers that are not 4-byte aligned are reported through [`ScoreStatus`].
///
/// # Safety
///
/// - Each non-null buffer must be valid for `size` elements of its type for the whole
///   call, and `scores` must be writable.
/// - `scores` must not overlap `adv_weights` or `prosale_only_flags`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn advscore_calc_scores(
    size: usize,
    scores: *mut f32, // in-out argument
    adv_weights: *const f32,
    prosale_only_flags: *const u8,
    min_score: f32,
    max_score: f32,
    min_adv_boost: f32,
    max_adv_boost: f32,
    slope: f32,
    intercept: f32,
) -> ScoreStatus {
    if size == 0 {
        return ScoreStatus::Ok;
    }
    if scores.is_null() || adv_weights.is_null() || prosale_only_flags.is_null() {
        return ScoreStatus::NullPointer;
    }
    if !scores.is_aligned() || !adv_weights.is_aligned() {
        return ScoreStatus::Misaligned;
    }

    let params = BoostParams {
        min_score,
        max_score,
        min_adv_boost,
        max_adv_boost,
        slope,
        intercept,
    };

    // SAFETY: the pointers are non-null and aligned (checked above); the caller guarantees
    // each is valid for `size` elements and that `scores` aliases neither input.
    let (scores, adv_weights, prosale_only_flags) = unsafe {
        (
            slice::from_raw_parts_mut(scores, size),
            slice::from_raw_parts(adv_weights, size),
            slice::from_raw_parts(prosale_only_flags, size),
        )
    };
    kernel::transform_lanes(scores, adv_weights, prosale_only_flags, &params);

    ScoreStatus::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn call(scores: &mut [f32], weights: &[f32], flags: &[u8], params: &BoostParams) -> ScoreStatus {
        unsafe {
            advscore_calc_scores(
                scores.len(),
                scores.as_mut_ptr(),
                weights.as_ptr(),
                flags.as_ptr(),
                params.min_score,
                params.max_score,
                params.min_adv_boost,
                params.max_adv_boost,
                params.slope,
                params.intercept,
            )
        }
    }

    #[test]
    fn reference_scenario_through_the_c_abi() {
        let mut scores = [5.0f32, -2.0, 50.0];
        let status = call(&mut scores, &[10.0; 3], &[1, 1, 0], &BoostParams::default());
        assert_eq!(status, ScoreStatus::Ok);
        assert_eq!(scores, [1000.0, -1.0, 50.0]);
    }

    #[test]
    fn empty_batches_accept_null_buffers() {
        let status = unsafe {
            advscore_calc_scores(
                0,
                ptr::null_mut(),
                ptr::null(),
                ptr::null(),
                1.0,
                100.0,
                10.0,
                200.0,
                0.2,
                0.5,
            )
        };
        assert_eq!(status, ScoreStatus::Ok);
    }

    #[test]
    fn null_buffers_are_reported() {
        let mut scores = [1.0f32; 4];
        let status = unsafe {
            advscore_calc_scores(
                scores.len(),
                scores.as_mut_ptr(),
                ptr::null(),
                [1u8; 4].as_ptr(),
                1.0,
                100.0,
                10.0,
                200.0,
                0.2,
                0.5,
            )
        };
        assert_eq!(status, ScoreStatus::NullPointer);
        assert_eq!(scores, [1.0; 4]);
    }

    #[test]
    fn misaligned_float_buffers_are_reported() {
        let mut raw = [0u8; 4 * 5];
        let weights = [0.0f32; 4];
        let flags = [1u8; 4];
        let base = raw.as_mut_ptr();
        let misaligned = if base as usize % 4 == 0 {
            base.wrapping_add(1)
        } else {
            base
        }
        .cast::<f32>();
        let status = unsafe {
            advscore_calc_scores(
                4,
                misaligned,
                weights.as_ptr(),
                flags.as_ptr(),
                1.0,
                100.0,
                10.0,
                200.0,
                0.2,
                0.5,
            )
        };
        assert_eq!(status, ScoreStatus::Misaligned);
    }
}
