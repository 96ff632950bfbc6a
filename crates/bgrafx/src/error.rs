use bgrafx_imgproc::FilterError;

/// An error type for the named filter entry points.
#[derive(thiserror::Error, Debug)]
pub enum BgrafxError {
    /// No filter goes by this name.
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    /// Error coming from the filter itself.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Error reading or writing a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error parsing a parameter file.
    #[error("failed to parse parameters: {0}")]
    Json(#[from] serde_json::Error),
}
