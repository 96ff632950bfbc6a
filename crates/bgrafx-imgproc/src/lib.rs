#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// structure tensor corner detection module.
pub mod corners;

/// error types of the filters.
pub mod error;

/// image filtering module.
pub mod filter;

/// byte narrowing of the filter accumulators.
pub mod narrow;

/// module containing parallization utilities.
pub mod parallel;

/// named filter parameters.
pub mod params;

/// filters chained through an intermediate image.
pub mod pipeline;

/// operations to threshold images.
pub mod threshold;

pub use error::{FilterError, STATUS_OK};
