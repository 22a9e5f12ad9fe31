use serde::Serialize;
use thiserror::Error;
/// Coarse classification of every failure the viewer can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Connection,
    NotFound,
    Format,
    Fetch,
    InvalidInput,
    IndexOutOfRange,
}
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("cannot reach array store: {0}")]
    Connection(String),
    #[error("{0} not found in array store")]
    NotFound(String),
    #[error("malformed store content: {0}")]
    Format(String),
    #[error("failed to fetch {key}: {reason}")]
    Fetch { key: String, reason: String },
    #[error("fetch of {key} timed out after {seconds:.1}s")]
    Timeout { key: String, seconds: f64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::Connection(_) => ErrorKind::Connection,
            ViewerError::NotFound(_) => ErrorKind::NotFound,
            ViewerError::Format(_) | ViewerError::ChannelMismatch { .. } => ErrorKind::Format,
            ViewerError::Fetch { .. } | ViewerError::Timeout { .. } => ErrorKind::Fetch,
            ViewerError::InvalidInput(_) | ViewerError::Plot(_) => ErrorKind::InvalidInput,
            ViewerError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
        }
    }
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ViewerError::Format(msg.into())
    }
    pub(crate) fn fetch(key: &str, reason: impl ToString) -> Self {
        ViewerError::Fetch {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
pub type Result<T> = std::result::Result<T, ViewerError>;
impl From<serde_json::Error> for ViewerError {
    fn from(value: serde_json::Error) -> Self {
        ViewerError::Format(value.to_string())
    }
}
impl From<std::io::Error> for ViewerError {
    fn from(value: std::io::Error) -> Self {
        ViewerError::Format(format!("decode failed: {value}"))
    }
}
impl From<lz4_flex::block::DecompressError> for ViewerError {
    fn from(value: lz4_flex::block::DecompressError) -> Self {
        ViewerError::Format(format!("lz4 block is corrupt: {value}"))
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ViewerError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ViewerError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ViewerError {
    fn from(value: image::ImageError) -> Self {
        ViewerError::Plot(value.to_string())
    }
}
