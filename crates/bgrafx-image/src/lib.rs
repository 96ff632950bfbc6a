#![deny(missing_docs)]
//! BGRA pixel buffer types and strided views for image filtering

/// memory allocation for owned image buffers.
pub mod allocator;

/// Error types for the image module.
pub mod error;

/// image representation for filtering purposes.
pub mod image;

/// fixed-layout BGRA pixel record.
pub mod pixel;

/// borrowed stride-aware views over caller-owned byte buffers.
pub mod view;

pub use crate::allocator::{CpuAllocator, ImageAllocator};
pub use crate::error::ImageError;
pub use crate::image::{BgraImage, ImageLayout, ImageSize};
pub use crate::pixel::{Bgra, BYTES_PER_PIXEL};
pub use crate::view::{BgraView, BgraViewMut};
