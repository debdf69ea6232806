// ========================================================================================
//
//              Staged batches: one batch laid out for the native entry point
//
// ========================================================================================
//
// A staged batch owns three aligned regions, one per parallel array, sized for a fixed
// capacity. Staging copies a caller's batch in through raw views, `run` hands the region
// pointers straight to `advscore_calc_scores`, and unstaging reads the rewritten scores
// back out. The regions are reused for every batch that fits.

use crate::aligned::AlignedRegion;
use crate::ffi::{self, ScoreStatus};
use crate::raw::RawMemoryView;
use crate::types::{BoostParams, ScoreBatch};

const F32_WIDTH: usize = size_of::<f32>();

#[derive(Debug)]
pub struct StagedBatch {
    scores: AlignedRegion,
    adv_weights: AlignedRegion,
    prosale_only_flags: AlignedRegion,
    capacity: usize,
    len: usize,
}

impl StagedBatch {
    /// Allocates regions for up to `capacity` items, each starting on an `alignment`
    /// boundary. The alignment must be a positive multiple of 4 (caller contract).
    pub fn with_capacity(capacity: usize, alignment: usize) -> Self {
        contract!(crate::error::check_lane_alignment(alignment));
        Self {
            scores: AlignedRegion::create(capacity * F32_WIDTH, alignment),
            adv_weights: AlignedRegion::create(capacity * F32_WIDTH, alignment),
            prosale_only_flags: AlignedRegion::create(capacity, alignment),
            capacity,
            len: 0,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of items currently staged.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.scores.alignment()
    }

    #[inline(always)]
    pub fn scores_region(&self) -> &AlignedRegion {
        &self.scores
    }

    #[inline(always)]
    pub fn adv_weights_region(&self) -> &AlignedRegion {
        &self.adv_weights
    }

    #[inline(always)]
    pub fn prosale_only_flags_region(&self) -> &AlignedRegion {
        &self.prosale_only_flags
    }

    /// Copies `batch` into the regions. The slices must have equal lengths that fit the
    /// capacity (caller contract).
    pub fn stage(&mut self, batch: &ScoreBatch<'_>) {
        contract!(crate::error::check_batch_lengths(
            batch.scores.len(),
            batch.adv_weights.len(),
            batch.prosale_only_flags.len()
        ));
        contract!(crate::error::check_capacity(batch.len(), self.capacity));

        let mut scores = RawMemoryView::new(&mut self.scores);
        let mut adv_weights = RawMemoryView::new(&mut self.adv_weights);
        let mut flags = RawMemoryView::new(&mut self.prosale_only_flags);
        for (i, ((&score, &adv_weight), &flag)) in batch
            .scores
            .iter()
            .zip(batch.adv_weights)
            .zip(batch.prosale_only_flags)
            .enumerate()
        {
            // SAFETY: `i < batch.len() <= capacity`, and the float regions hold
            // `capacity * 4` bytes while the flag region holds `capacity` bytes.
            unsafe {
                scores.write_f32(i * F32_WIDTH, score);
                adv_weights.write_f32(i * F32_WIDTH, adv_weight);
                flags.write_u8(i, u8::from(flag));
            }
        }
        self.len = batch.len();
    }

    /// Runs the native entry point over the staged items, rewriting the scores region.
    pub fn run(&mut self, params: &BoostParams) -> ScoreStatus {
        // SAFETY: each region holds at least `len` items of its type, is aligned to a
        // multiple of 4 and is owned by `self`, so the three buffers cannot overlap.
        unsafe {
            ffi::advscore_calc_scores(
                self.len,
                self.scores.as_mut_ptr().cast::<f32>(),
                self.adv_weights.as_ptr().cast::<f32>(),
                self.prosale_only_flags.as_ptr(),
                params.min_score,
                params.max_score,
                params.min_adv_boost,
                params.max_adv_boost,
                params.slope,
                params.intercept,
            )
        }
    }

    /// Copies the staged scores back into `scores`, which must have the staged length
    /// (caller contract).
    pub fn unstage(&mut self, scores: &mut [f32]) {
        contract!(crate::error::check_batch_lengths(
            scores.len(),
            self.len,
            self.len
        ));

        let view = RawMemoryView::new(&mut self.scores);
        for (i, score) in scores.iter_mut().enumerate() {
            // SAFETY: `i < len <= capacity`, inside a region of `capacity * 4` bytes.
            *score = unsafe { view.read_f32(i * F32_WIDTH) };
        }
    }
}
