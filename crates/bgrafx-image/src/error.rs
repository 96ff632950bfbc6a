/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    /// Error when the stride cannot hold a full row of pixels.
    #[error("Stride ({0}) is smaller than the row size of {1} bytes")]
    InvalidStride(usize, usize),

    /// Error when the image has zero width or height.
    #[error("Invalid image size ({0}x{1})")]
    InvalidImageSize(usize, usize),

    /// Error when a buffer is shorter than `stride * height`.
    #[error("Buffer length ({0}) is smaller than the image length ({1})")]
    BufferTooSmall(usize, usize),

    /// Error when the data length does not match the image length.
    #[error("Data length ({0}) does not match the image length ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when two images do not share the same layout.
    #[error("Image layouts do not match: {0} vs {1}")]
    LayoutMismatch(String, String),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinates ({0}, {1}) are out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a buffer of the given length could not be allocated.
    #[error("Failed to allocate {0} bytes")]
    AllocationFailed(usize),
}
