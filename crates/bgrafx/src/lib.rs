#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use bgrafx_image as image;

#[doc(inline)]
pub use bgrafx_imgproc as imgproc;

/// error type of the top-level crate.
pub mod error;

/// named filters and their integer status entry points.
pub mod registry;

pub use error::BgrafxError;
pub use registry::FilterKind;
