//! Validated write path and range reads over an injected booking store.
//!
//! Every mutation runs the same sequence: validate the minute range, resolve
//! it to timestamps in the organizational timezone, consult the store for
//! overlaps, write, then broadcast a change event.

mod advisory;
mod conflict;
mod error;


pub use advisory::{AdvisoryChecker, AdvisoryStatus, CheckTicket};
pub use conflict::find_conflict;
pub use error::EngineError;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::{info, warn};
use ulid::Ulid;

use crate::config::Config;
use crate::model::{Booking, BookingPatch, BookingsByDate, Department, NewBooking, TimeSpan};
use crate::notify::{ChangeEvent, NotifyHub};
use crate::store::{BookingStore, InsertBooking, UpdateBooking};

pub struct Engine {
    store: Arc<dyn BookingStore>,
    notify: Arc<NotifyHub>,
    config: Config,
}

impl Engine {
    pub fn new(store: Arc<dyn BookingStore>, notify: Arc<NotifyHub>, config: Config) -> Self {
        Self { store, notify, config }
    }

    /// Resolve a date plus minute span into concrete timestamps. A span that
    /// cannot be resolved (out-of-range minutes, calendar edge) is reported
    /// the same way as an inverted one.
    fn resolve_span(
        &self,
        date: NaiveDate,
        span: &TimeSpan,
    ) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), EngineError> {
        let invalid = || EngineError::InvalidRange { start: span.start, end: span.end };
        let start_at = self.config.local_datetime(date, span.start).ok_or_else(invalid)?;
        let end_at = self.config.local_datetime(date, span.end).ok_or_else(invalid)?;
        Ok((start_at, end_at))
    }

    /// Pre-write overlap gate. The check and the subsequent write are not
    /// atomic: two submissions racing past this point can both land. The
    /// store's count query is the same one the advisory path uses, so the
    /// two views of "busy" cannot drift apart.
    async fn ensure_no_overlap(
        &self,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
        exclude: Option<Ulid>,
    ) -> Result<(), EngineError> {
        let count = self.store.count_overlapping(start_at, end_at, exclude).await?;
        if count > 0 {
            warn!(%start_at, %end_at, count, "booking overlaps existing reservation");
            return Err(EngineError::Conflict);
        }
        Ok(())
    }

    pub async fn create_booking(&self, draft: NewBooking) -> Result<Booking, EngineError> {
        let span = TimeSpan { start: draft.start, end: draft.end };
        conflict::validate_range(&span)?;
        let (start_at, end_at) = self.resolve_span(draft.date, &span)?;
        self.ensure_no_overlap(start_at, end_at, None).await?;

        let booking = self
            .store
            .insert(InsertBooking {
                title: draft.title,
                description: draft.description,
                owner_id: draft.owner_id,
                department_id: draft.department_id,
                start_at,
                end_at,
                is_company_wide: draft.is_company_wide,
            })
            .await?;
        info!(id = %booking.id, %start_at, %end_at, "booking created");
        self.notify.send(ChangeEvent::BookingsChanged);
        Ok(booking)
    }

    /// Apply a partial edit. Untouched fields keep the stored values; the
    /// effective date and span are re-validated and re-checked for overlap
    /// with the booking itself excluded, so resaving unchanged times never
    /// self-conflicts.
    pub async fn update_booking(
        &self,
        id: Ulid,
        patch: BookingPatch,
    ) -> Result<Booking, EngineError> {
        let current = self.store.get(id).await?;

        let date = patch.date.unwrap_or_else(|| current.date_key());
        let span = TimeSpan {
            start: patch.start.unwrap_or_else(|| current.start_minutes()),
            end: patch.end.unwrap_or_else(|| current.end_minutes()),
        };
        conflict::validate_range(&span)?;
        let (start_at, end_at) = self.resolve_span(date, &span)?;
        self.ensure_no_overlap(start_at, end_at, Some(id)).await?;

        let booking = self
            .store
            .update(
                id,
                UpdateBooking {
                    title: patch.title,
                    description: patch.description,
                    start_at: Some(start_at),
                    end_at: Some(end_at),
                },
            )
            .await?;
        info!(%id, %start_at, %end_at, "booking updated");
        self.notify.send(ChangeEvent::BookingsChanged);
        Ok(booking)
    }

    pub async fn delete_booking(&self, id: Ulid) -> Result<(), EngineError> {
        self.store.delete(id).await?;
        info!(%id, "booking deleted");
        self.notify.send(ChangeEvent::BookingsChanged);
        Ok(())
    }

    /// Bookings starting on any date in `[from, until)`, ascending by start.
    pub async fn bookings_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Booking>, EngineError> {
        let invalid = || EngineError::InvalidRange { start: 0, end: 0 };
        let lo = self.config.local_datetime(from, 0).ok_or_else(invalid)?;
        let hi = self.config.local_datetime(until, 0).ok_or_else(invalid)?;
        Ok(self.store.bookings_between(lo, hi).await?)
    }

    /// Range read projected into per-date buckets, ready for grid building.
    pub async fn bookings_by_date(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<BookingsByDate, EngineError> {
        let bookings = self.bookings_between(from, until).await?;
        Ok(BookingsByDate::project(&bookings))
    }

    /// Run one advisory overlap check for the booking form. `None` means a
    /// newer check superseded this one and the indicator must not change.
    /// An unresolvable range settles as `Clear`; submission will reject it
    /// with the precise error.
    pub async fn advisory_check(
        &self,
        checker: &AdvisoryChecker,
        date: NaiveDate,
        span: TimeSpan,
        exclude: Option<Ulid>,
    ) -> Option<AdvisoryStatus> {
        let ticket = checker.begin();
        if conflict::validate_range(&span).is_err() {
            return checker.settle(ticket, Ok(false));
        }
        let outcome = match self.resolve_span(date, &span) {
            Ok((start_at, end_at)) => self
                .store
                .count_overlapping(start_at, end_at, exclude)
                .await
                .map(|n| n > 0),
            Err(_) => Ok(false),
        };
        checker.settle(ticket, outcome)
    }

    pub async fn departments(&self) -> Result<Vec<Department>, EngineError> {
        Ok(self.store.departments().await?)
    }
}
