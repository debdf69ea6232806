// ========================================================================================
//
//                 Score transformers: two substitutable paths, one contract
//
// ========================================================================================
//
// The boost transform has a managed implementation, which walks the caller's slices in
// place, and a native one, which stages the batch into aligned regions and runs the SIMD
// kernel through the C entry point. Both sit behind `ScoreTransform` and produce
// bit-identical scores, so callers pick a path without touching the branching rules.

use crate::ffi::ScoreStatus;
use crate::kernel::boost_score;
use crate::staging::StagedBatch;
use crate::types::{BoostParams, ScoreBatch};
use clap::ValueEnum;
use itertools::izip;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Deserialize;

/// An in-place implementation of the boost transform.
pub trait ScoreTransform {
    /// A short, stable label for logs and reports.
    fn name(&self) -> &'static str;

    /// Rewrites `batch.scores` in place. `adv_weights` and `prosale_only_flags` are only
    /// read. Equal slice lengths are a caller contract.
    fn transform(&mut self, batch: ScoreBatch<'_>, params: &BoostParams);
}

/// Selects a `ScoreTransform` implementation from configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransformPath {
    /// Scalar loop over the caller's slices.
    #[default]
    Managed,
    /// The managed loop spread over disjoint chunks with rayon.
    Parallel,
    /// Aligned staging plus the SIMD kernel behind the C entry point.
    Native,
}

impl TransformPath {
    pub const ALL: [TransformPath; 3] = [
        TransformPath::Managed,
        TransformPath::Parallel,
        TransformPath::Native,
    ];
}

/// Applies the boost rule to each item of three equally long slices.
#[inline]
pub fn transform_in_place(
    scores: &mut [f32],
    adv_weights: &[f32],
    prosale_only_flags: &[bool],
    params: &BoostParams,
) {
    for (score, &adv_weight, &prosale_only) in izip!(scores, adv_weights, prosale_only_flags) {
        *score = boost_score(*score, adv_weight, prosale_only, params);
    }
}

/// The managed path: scores are rewritten directly in the caller's slice.
#[derive(Debug, Clone, Copy)]
pub struct ManagedTransformer {
    parallel_chunk: Option<usize>,
}

impl ManagedTransformer {
    pub fn sequential() -> Self {
        Self {
            parallel_chunk: None,
        }
    }

    /// Splits each batch into disjoint chunks of `chunk` items and transforms them on the
    /// rayon pool. No two workers ever write the same index.
    pub fn parallel(chunk: usize) -> Self {
        Self {
            parallel_chunk: Some(chunk.max(1)),
        }
    }
}

impl ScoreTransform for ManagedTransformer {
    fn name(&self) -> &'static str {
        match self.parallel_chunk {
            None => "managed",
            Some(_) => "parallel",
        }
    }

    fn transform(&mut self, batch: ScoreBatch<'_>, params: &BoostParams) {
        contract!(crate::error::check_batch_lengths(
            batch.scores.len(),
            batch.adv_weights.len(),
            batch.prosale_only_flags.len()
        ));

        match self.parallel_chunk {
            None => transform_in_place(
                batch.scores,
                batch.adv_weights,
                batch.prosale_only_flags,
                params,
            ),
            Some(chunk) => batch
                .scores
                .par_chunks_mut(chunk)
                .zip(batch.adv_weights.par_chunks(chunk))
                .zip(batch.prosale_only_flags.par_chunks(chunk))
                .for_each(|((scores, adv_weights), flags)| {
                    transform_in_place(scores, adv_weights, flags, params)
                }),
        }
    }
}

/// The native path: each batch is staged into aligned regions, scored by the SIMD kernel
/// through `advscore_calc_scores`, and copied back.
#[derive(Debug)]
pub struct NativeTransformer {
    staged: StagedBatch,
}

impl NativeTransformer {
    /// Pre-allocates staging for `capacity` items. Larger batches grow the staging
    /// regions on demand. `alignment` must be a positive multiple of 4 (caller contract).
    pub fn with_capacity(capacity: usize, alignment: usize) -> Self {
        Self {
            staged: StagedBatch::with_capacity(capacity, alignment),
        }
    }

    pub fn capacity(&self) -> usize {
        self.staged.capacity()
    }

    /// Copies the staged scores back. If the entry point refused the staged regions,
    /// which only an alignment that is not a multiple of 4 can cause, the batch is
    /// scored in place with the same rule instead.
    fn finish(&mut self, status: ScoreStatus, batch: ScoreBatch<'_>, params: &BoostParams) {
        match status {
            ScoreStatus::Ok => self.staged.unstage(batch.scores),
            refused => {
                warn!(
                    "native entry point refused {}-byte aligned staging ({refused:?}); scoring in place",
                    self.staged.alignment()
                );
                transform_in_place(
                    batch.scores,
                    batch.adv_weights,
                    batch.prosale_only_flags,
                    params,
                );
            }
        }
    }
}

impl ScoreTransform for NativeTransformer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn transform(&mut self, batch: ScoreBatch<'_>, params: &BoostParams) {
        contract!(crate::error::check_batch_lengths(
            batch.scores.len(),
            batch.adv_weights.len(),
            batch.prosale_only_flags.len()
        ));

        if batch.len() > self.staged.capacity() {
            debug!(
                "growing native staging from {} to {} items",
                self.staged.capacity(),
                batch.len()
            );
            self.staged = StagedBatch::with_capacity(batch.len(), self.staged.alignment());
        }

        self.staged.stage(&batch);
        let status = self.staged.run(params);
        self.finish(status, batch, params);
    }
}

/// Transforms `batch` in consecutive sub-batches of at most `batch_size` items.
pub fn transform_in_batches(
    transformer: &mut dyn ScoreTransform,
    batch: ScoreBatch<'_>,
    batch_size: usize,
    params: &BoostParams,
) {
    let batch_size = batch_size.max(1);
    for ((scores, adv_weights), flags) in batch
        .scores
        .chunks_mut(batch_size)
        .zip(batch.adv_weights.chunks(batch_size))
        .zip(batch.prosale_only_flags.chunks(batch_size))
    {
        transformer.transform(ScoreBatch::new(scores, adv_weights, flags), params);
    }
}
