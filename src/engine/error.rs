use ulid::Ulid;

use crate::calendar::format_minutes;
use crate::model::Minutes;
use crate::store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    /// The requested start/end pair does not form a forward interval, or
    /// cannot be resolved to a timestamp on the requested date.
    InvalidRange { start: Minutes, end: Minutes },
    /// The requested interval overlaps an existing booking.
    Conflict,
    NotFound(Ulid),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRange { start, end } => write!(
                f,
                "end time must be after start time ({} >= {})",
                format_minutes(*start),
                format_minutes(*end)
            ),
            EngineError::Conflict => {
                write!(f, "the requested time overlaps an existing booking")
            }
            EngineError::NotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Store(other),
        }
    }
}
