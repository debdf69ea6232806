// ========================================================================================
//                                Contract violations
// ========================================================================================
//
// The compute core has no recoverable errors. A broken precondition is a programming
// defect: `ContractError` describes it, the `contract!` macro turns it into a panic in
// debug and `checked` builds, and optimized builds skip the check entirely. The outer
// surfaces (configuration, file I/O) define their own error types next to their code.

use crate::types::ByteOrder;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error(
        "batch slices differ in length (scores: {scores}, adv_weights: {adv_weights}, prosale_only_flags: {flags})"
    )]
    LengthMismatch {
        scores: usize,
        adv_weights: usize,
        flags: usize,
    },
    #[error("alignment must be greater than zero")]
    ZeroAlignment,
    #[error("alignment must be even, got {0}")]
    OddAlignment(usize),
    #[error("alignment {alignment} is not a multiple of the {lane}-byte lane width")]
    NotLaneAligned { alignment: usize, lane: usize },
    #[error("buffer is {found}, but raw access requires the native {expected} order")]
    ForeignByteOrder { expected: ByteOrder, found: ByteOrder },
    #[error("access of {width} bytes at offset {offset} overruns a region of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },
    #[error("batch of {len} items exceeds the staged capacity of {capacity}")]
    OverCapacity { len: usize, capacity: usize },
}

/// Fails unless all three parallel sequences have the same length.
#[inline]
pub fn check_batch_lengths(
    scores: usize,
    adv_weights: usize,
    flags: usize,
) -> Result<(), ContractError> {
    if scores == adv_weights && scores == flags {
        Ok(())
    } else {
        Err(ContractError::LengthMismatch {
            scores,
            adv_weights,
            flags,
        })
    }
}

/// Fails unless `alignment` is positive and even.
///
/// Evenness is the historical requirement. The padding arithmetic in
/// `AlignedRegion::create` uses a modulo rather than a mask, so any positive
/// alignment yields a correctly aligned start address.
#[inline]
pub fn check_alignment(alignment: usize) -> Result<(), ContractError> {
    if alignment == 0 {
        Err(ContractError::ZeroAlignment)
    } else if alignment % 2 != 0 {
        Err(ContractError::OddAlignment(alignment))
    } else {
        Ok(())
    }
}

/// Fails unless `alignment` is valid and also keeps `f32` lanes naturally aligned.
#[inline]
pub fn check_lane_alignment(alignment: usize) -> Result<(), ContractError> {
    check_alignment(alignment)?;
    let lane = size_of::<f32>();
    if alignment % lane == 0 {
        Ok(())
    } else {
        Err(ContractError::NotLaneAligned { alignment, lane })
    }
}

#[inline]
pub fn check_native_order(found: ByteOrder) -> Result<(), ContractError> {
    if found == crate::types::NATIVE_ORDER {
        Ok(())
    } else {
        Err(ContractError::ForeignByteOrder {
            expected: crate::types::NATIVE_ORDER,
            found,
        })
    }
}

/// Fails unless `width` bytes starting at `offset` fit inside `len` bytes.
#[inline]
pub fn check_span(offset: usize, width: usize, len: usize) -> Result<(), ContractError> {
    match offset.checked_add(width) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ContractError::OutOfBounds { offset, width, len }),
    }
}

#[inline]
pub fn check_capacity(len: usize, capacity: usize) -> Result<(), ContractError> {
    if len <= capacity {
        Ok(())
    } else {
        Err(ContractError::OverCapacity { len, capacity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NATIVE_ORDER;

    #[test]
    fn batch_lengths_must_agree() {
        assert!(check_batch_lengths(3, 3, 3).is_ok());
        assert_eq!(
            check_batch_lengths(3, 2, 3),
            Err(ContractError::LengthMismatch {
                scores: 3,
                adv_weights: 2,
                flags: 3
            })
        );
    }

    #[test]
    fn alignment_must_be_positive_and_even() {
        assert_eq!(check_alignment(0), Err(ContractError::ZeroAlignment));
        assert_eq!(check_alignment(7), Err(ContractError::OddAlignment(7)));
        assert!(check_alignment(6).is_ok());
        assert!(check_alignment(32).is_ok());
    }

    #[test]
    fn lane_alignment_needs_a_multiple_of_four() {
        assert_eq!(
            check_lane_alignment(6),
            Err(ContractError::NotLaneAligned {
                alignment: 6,
                lane: 4
            })
        );
        assert_eq!(check_lane_alignment(0), Err(ContractError::ZeroAlignment));
        assert!(check_lane_alignment(16).is_ok());
    }

    #[test]
    fn foreign_order_is_described() {
        let foreign = match NATIVE_ORDER {
            ByteOrder::Little => ByteOrder::Big,
            ByteOrder::Big => ByteOrder::Little,
        };
        let err = check_native_order(foreign).unwrap_err();
        assert!(err.to_string().contains("native"));
        assert!(check_native_order(NATIVE_ORDER).is_ok());
    }

    #[test]
    fn span_check_handles_edges_and_overflow() {
        assert!(check_span(0, 4, 4).is_ok());
        assert!(check_span(4, 4, 8).is_ok());
        assert!(check_span(5, 4, 8).is_err());
        assert!(check_span(usize::MAX, 4, 8).is_err());
    }

    #[test]
    fn capacity_check_allows_exact_fit() {
        assert!(check_capacity(8, 8).is_ok());
        assert_eq!(
            check_capacity(9, 8),
            Err(ContractError::OverCapacity {
                len: 9,
                capacity: 8
            })
        );
    }
}
