//! Filter operations
//!
//! This module provides the windowed filters on BGRA images: blurs and edge
//! detectors, plus the kernels and the border policy they are built on.

/// Filter kernels
pub mod kernels;

/// Border policies of the windowed filters.
pub mod border;

/// Windowed execution over the rows of an image.
pub mod convolution;

/// Filter operations
mod ops;
pub use ops::*;

pub(crate) use ops::grayscale_scratch;
