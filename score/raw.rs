// ========================================================================================
//
//                 Raw views: unchecked fixed-width access by byte offset
//
// ========================================================================================
//
// This is the "trust the caller" access path. A view resolves the base address of an
// aligned region once and then reads or writes native-order values at `base + offset`
// with no bounds check in optimized builds. Debug builds (and the `checked` feature)
// additionally remember the region length so an overrun panics instead of corrupting
// memory.

use crate::aligned::AlignedRegion;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// An exclusive, unchecked view over an [`AlignedRegion`].
///
/// The view borrows the region mutably, so the backing memory cannot be released or
/// aliased while the view is alive.
pub struct RawMemoryView<'a> {
    base: NonNull<u8>,
    #[cfg(any(debug_assertions, feature = "checked"))]
    len: usize,
    region: PhantomData<&'a mut [u8]>,
}

macro_rules! raw_access {
    ($($read:ident, $write:ident, $ty:ty;)*) => {
        $(
            #[doc = concat!("Reads a native-order `", stringify!($ty), "` at `base + offset`.")]
            ///
            /// # Safety
            /// The caller must guarantee that the whole value lies inside the region.
            #[inline(always)]
            pub unsafe fn $read(&self, offset: usize) -> $ty {
                contract!(crate::error::check_span(offset, size_of::<$ty>(), self.len));
                // SAFETY: the caller guarantees `offset + size_of::<$ty>() <= len`, and the
                // borrowed region keeps the memory alive. The read tolerates misalignment.
                unsafe { self.base.as_ptr().add(offset).cast::<$ty>().read_unaligned() }
            }

            #[doc = concat!("Writes a native-order `", stringify!($ty), "` at `base + offset`.")]
            ///
            /// # Safety
            /// The caller must guarantee that the whole value lies inside the region.
            #[inline(always)]
            pub unsafe fn $write(&mut self, offset: usize, value: $ty) {
                contract!(crate::error::check_span(offset, size_of::<$ty>(), self.len));
                // SAFETY: as for the read; the view holds the only borrow of the region.
                unsafe {
                    self.base
                        .as_ptr()
                        .add(offset)
                        .cast::<$ty>()
                        .write_unaligned(value)
                }
            }
        )*
    };
}

impl<'a> RawMemoryView<'a> {
    /// Resolves and caches the base address of `region`.
    ///
    /// The region must be tagged with the platform's native byte order. This is a
    /// caller contract, checked in debug builds and with the `checked` feature only.
    pub fn new(region: &'a mut AlignedRegion) -> Self {
        contract!(crate::error::check_native_order(region.order()));
        #[cfg(any(debug_assertions, feature = "checked"))]
        let len = region.len();
        // A slice pointer is never null, even for an empty region.
        let base = NonNull::from(region.as_bytes_mut()).cast::<u8>();
        Self {
            base,
            #[cfg(any(debug_assertions, feature = "checked"))]
            len,
            region: PhantomData,
        }
    }

    /// The cached base address.
    #[inline(always)]
    pub fn base_address(&self) -> usize {
        self.base.as_ptr() as usize
    }

    raw_access! {
        read_u8, write_u8, u8;
        read_i16, write_i16, i16;
        read_i32, write_i32, i32;
        read_i64, write_i64, i64;
        read_f32, write_f32, f32;
        read_f64, write_f64, f64;
    }
}
