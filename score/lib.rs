#![feature(portable_simd)] // Do not remove this
#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

/// Enforces a caller contract in debug builds and in builds with the `checked`
/// feature. Optimized builds expand to nothing: a violated contract there is
/// undefined behavior, not a recoverable error.
///
/// The argument must evaluate to `Result<(), ContractError>`.
#[cfg(any(debug_assertions, feature = "checked"))]
macro_rules! contract {
    ($check:expr) => {
        if let Err(violation) = $check {
            panic!("contract violation: {violation}");
        }
    };
}

#[cfg(not(any(debug_assertions, feature = "checked")))]
macro_rules! contract {
    ($check:expr) => {};
}

pub mod aligned;
pub mod config;
pub mod error;
pub mod ffi;
pub mod io;
pub mod kernel;
pub mod raw;
pub mod staging;
pub mod transform;
pub mod types;
