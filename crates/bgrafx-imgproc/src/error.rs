use bgrafx_image::ImageError;

use crate::parallel::ParallelError;

/// Status returned by the integer entry points on success.
pub const STATUS_OK: i32 = 0;

/// An error type for the filter operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// Error coming from the image buffers or their allocation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error coming from the row dispatcher.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// The kernel size is even or zero.
    #[error("kernel size must be odd and positive, got {0}")]
    InvalidKernelSize(usize),

    /// The radius parameter is negative or not finite.
    #[error("radius must be a finite non-negative number, got {0}")]
    InvalidRadius(f64),

    /// A parameter could not be parsed.
    #[error("invalid parameter `{0}`, expected key=value")]
    InvalidParameter(String),
}

impl FilterError {
    /// The non-zero status code reported for this error.
    ///
    /// Scratch allocation failures map to `-1`.
    pub fn status_code(&self) -> i32 {
        match self {
            FilterError::Image(ImageError::AllocationFailed(_)) => -1,
            FilterError::Image(_) => -2,
            FilterError::Parallel(_) => -3,
            FilterError::InvalidKernelSize(_) | FilterError::InvalidRadius(_) => -4,
            FilterError::InvalidParameter(_) => -5,
        }
    }
}
