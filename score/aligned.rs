// ========================================================================================
//
//                  Aligned regions: over-allocate, then slice to a boundary
//
// ========================================================================================
//
// Vectorized consumers want their input to start on a 16, 32 or 64 byte boundary. A
// region is carved out of a plain byte allocation that is `alignment` bytes larger than
// requested, starting at the first aligned address inside it. The region owns that
// backing allocation, so the memory lives exactly as long as the region does.

use crate::types::{ByteOrder, NATIVE_ORDER};
use log::debug;

/// A byte range of exactly the requested size whose first byte sits on the requested
/// alignment boundary.
#[derive(Debug)]
pub struct AlignedRegion {
    backing: Box<[u8]>,
    pad: usize,
    len: usize,
    alignment: usize,
    order: ByteOrder,
}

impl AlignedRegion {
    /// Allocates `size + alignment` zeroed bytes and exposes the `size` bytes that start
    /// at the first multiple of `alignment`.
    ///
    /// `alignment` must be positive and even. This is a caller contract, checked in
    /// debug builds and with the `checked` feature only.
    pub fn create(size: usize, alignment: usize) -> Self {
        contract!(crate::error::check_alignment(alignment));

        let backing = vec![0u8; size + alignment].into_boxed_slice();
        let address = backing.as_ptr() as usize;
        let over_aligned = address % alignment;
        let pad = if over_aligned > 0 {
            alignment - over_aligned
        } else {
            0
        };
        debug!(
            "aligned region: {size} bytes at {:#x} (backing {address:#x}, pad {pad}, alignment {alignment})",
            address + pad
        );

        Self {
            backing,
            pad,
            len: size,
            alignment,
            order: NATIVE_ORDER,
        }
    }

    /// The numeric address of the region's first byte.
    #[inline(always)]
    pub fn base_address(&self) -> usize {
        self.as_ptr() as usize
    }

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
        self.alignment
    }

    #[inline(always)]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Retags the region with a different byte order. Regions are created native; a
    /// foreign tag marks a buffer that raw views must refuse.
    #[inline]
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_bytes().as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.as_bytes_mut().as_mut_ptr()
    }

    /// The region's bytes. The padding on either side is not reachable.
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.backing[self.pad..self.pad + self.len]
    }

    #[inline(always)]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.backing[self.pad..self.pad + self.len]
    }
}
