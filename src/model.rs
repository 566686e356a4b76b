use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Minutes since local midnight — the unit for all same-day time math.
pub type Minutes = i32;

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeSpan {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "TimeSpan start must be before end");
        Self { start, end }
    }

    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }

    /// Touching endpoints do not overlap: `[9:00, 10:00)` and `[10:00, 11:00)`
    /// share no instant.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Minutes) -> bool {
        self.start <= t && t < self.end
    }

    /// Clamp to `window`, or `None` when nothing of the span remains inside.
    pub fn clamp_to(&self, window: &TimeSpan) -> Option<TimeSpan> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        if end <= start { None } else { Some(TimeSpan { start, end }) }
    }
}

/// One reservation of the shared room. Value snapshot for the duration of a
/// render or conflict check; the store owns the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub title: String,
    pub owner_id: Ulid,
    pub department_id: Option<Ulid>,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    pub description: Option<String>,
    /// Display flag only; carries no scheduling semantics.
    pub is_company_wide: bool,
}

impl Booking {
    /// Calendar date a booking is displayed under — always its start date.
    /// Cross-midnight bookings are unsupported and a caller error.
    pub fn date_key(&self) -> NaiveDate {
        self.start_at.date_naive()
    }

    pub fn start_minutes(&self) -> Minutes {
        minutes_of(&self.start_at)
    }

    /// End minutes relative to the start date. An end at midnight of the
    /// following day closes the booking's own day (minute 1440) rather than
    /// opening the next one, so a 23:00–24:00 booking keeps a forward span.
    pub fn end_minutes(&self) -> Minutes {
        let minutes = minutes_of(&self.end_at);
        if minutes == 0 && self.end_at.date_naive() > self.date_key() {
            MINUTES_PER_DAY
        } else {
            minutes
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_minutes(), self.end_minutes())
    }
}

fn minutes_of(ts: &DateTime<FixedOffset>) -> Minutes {
    (ts.hour() * 60 + ts.minute()) as Minutes
}

/// Create shape submitted from the booking form; the store assigns the id
/// and the engine resolves date + minutes against the fixed timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Ulid,
    pub department_id: Option<Ulid>,
    pub date: NaiveDate,
    pub start: Minutes,
    pub end: Minutes,
    pub is_company_wide: bool,
}

/// Edit shape; `None` fields keep the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<Minutes>,
    pub end: Option<Minutes>,
}

/// Pure projection of a booking collection: bucketed by start date, each
/// bucket ascending by start time. Rebuilt whenever the collection changes,
/// never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct BookingsByDate {
    buckets: BTreeMap<NaiveDate, Vec<Booking>>,
}

impl BookingsByDate {
    pub fn project(bookings: &[Booking]) -> Self {
        let mut buckets: BTreeMap<NaiveDate, Vec<Booking>> = BTreeMap::new();
        for booking in bookings {
            buckets.entry(booking.date_key()).or_default().push(booking.clone());
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by_key(|b| b.start_minutes());
        }
        Self { buckets }
    }

    /// Bookings on `date`; an absent date yields an empty slice.
    pub fn on(&self, date: NaiveDate) -> &[Booking] {
        self.buckets.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.buckets.keys().copied()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Organizational group, used only to resolve a display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Ulid,
    pub name: String,
    /// 6-hex-digit color, no leading `#`.
    pub default_color: String,
}

/// Neutral badge color when no department or override applies.
pub const FALLBACK_COLOR: &str = "94a3b8";

pub fn is_valid_hex_color(s: &str) -> bool {
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Per-user override wins, then the department default, then the fallback.
pub fn display_color<'a>(
    user_override: Option<&'a str>,
    department: Option<&'a Department>,
) -> &'a str {
    if let Some(color) = user_override
        && is_valid_hex_color(color) {
            return color;
        }
    if let Some(dept) = department
        && is_valid_hex_color(&dept.default_color) {
            return &dept.default_color;
        }
    FALLBACK_COLOR
}
