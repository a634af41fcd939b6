//! Root module for built-in pixel data adapters.
//!
//! Support for certain transfer syntaxes
//! can be toggled via Cargo features.
//!
//! - [`rle_lossless`](rle_lossless) provides native RLE Lossless
//!   decoding and encoding.
//!   Requires the `rle` feature,
//!   enabled by default.
//!   With the `rayon` feature,
//!   frames are decoded and encoded in parallel.
#[cfg(feature = "rle")]
pub mod rle_lossless;

/// **Note:** This module is a stub.
/// Enable the `rle` feature to use this module.
#[cfg(not(feature = "rle"))]
pub mod rle_lossless {}
