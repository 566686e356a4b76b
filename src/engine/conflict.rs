//! Interval conflict rules shared by the write path and the in-memory
//! advisory path. A booked interval `[start, end)` is half-open: a booking
//! ending at 10:00 does not conflict with one starting at 10:00.

use ulid::Ulid;

use crate::engine::error::EngineError;
use crate::model::{Booking, TimeSpan};

/// Range validity gates every conflict decision: an inverted or empty range
/// is reported as invalid even when it would also overlap something.
pub(crate) fn validate_range(span: &TimeSpan) -> Result<(), EngineError> {
    if span.end <= span.start {
        return Err(EngineError::InvalidRange {
            start: span.start,
            end: span.end,
        });
    }
    Ok(())
}

/// First booking in `existing` that overlaps `candidate`, skipping the
/// excluded id (the booking being edited). Callers pass a single day's
/// bookings; cross-date comparison is meaningless in minute space.
pub fn find_conflict(
    existing: &[Booking],
    candidate: &TimeSpan,
    exclude: Option<Ulid>,
) -> Option<Ulid> {
    existing
        .iter()
        .find(|b| exclude != Some(b.id) && b.span().overlaps(candidate))
        .map(|b| b.id)
}
