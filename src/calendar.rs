//! Calendar grid construction for the month and week views, plus the slot
//! arithmetic shared with the booking form. Everything here is pure and
//! total: any valid date in produces a grid out.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::model::{Booking, BookingsByDate, Minutes, TimeSpan};

/// Rendered daily window: 09:00–18:00.
pub const DAY_START_MINUTES: Minutes = 9 * 60;
pub const DAY_END_MINUTES: Minutes = 18 * 60;
/// Quantization unit for week-view layout and time pickers.
pub const SLOT_INTERVAL_MINUTES: Minutes = 15;
/// Slots per rendered day (36).
pub const SLOT_COUNT: usize =
    ((DAY_END_MINUTES - DAY_START_MINUTES) / SLOT_INTERVAL_MINUTES) as usize;
/// Monday..Friday. Weekend columns are never rendered.
pub const WORKING_DAY_COUNT: usize = 5;

/// Defaults for a freshly opened booking form.
pub const DEFAULT_NEW_BOOKING_START: Minutes = DAY_START_MINUTES;
pub const DEFAULT_NEW_BOOKING_END: Minutes = DAY_START_MINUTES + 30;

const DEFAULT_DURATION_MINUTES: Minutes = 60;

// ── Date arithmetic ──────────────────────────────────────────────

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Friday of the week containing `date`.
pub fn end_of_work_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(WORKING_DAY_COUNT as i64 - 1)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 exists in every month")
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    add_months(start_of_month(date), 1) - Duration::days(1)
}

/// Month paging for prev/next navigation. The day of month is clamped so
/// e.g. Jan 31 + 1 month lands on the last day of February.
pub fn add_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let months = date.year() * 12 + date.month0() as i32 + delta;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("month in 1..=12");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("month in 1..=12");
    (next - first).num_days() as u32
}

// ── Month grid ───────────────────────────────────────────────────

/// One month-view cell. Out-of-month edge days are included in the grid but
/// flagged, so the view can dim them while keeping them clickable.
#[derive(Debug)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub in_focus_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    /// That date's bookings, ascending by start time.
    pub bookings: &'a [Booking],
}

#[derive(Debug)]
pub struct MonthGrid<'a> {
    pub focus: NaiveDate,
    /// Weekday-only dates, five per row; length is a multiple of five.
    pub cells: Vec<DayCell<'a>>,
}

impl<'a> MonthGrid<'a> {
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell<'a>]> {
        self.cells.chunks(WORKING_DAY_COUNT)
    }
}

/// Build the month view for the month containing `focus`: Monday of the week
/// holding the 1st through Friday of the working week holding the last day.
pub fn month_grid<'a>(
    focus: NaiveDate,
    today: NaiveDate,
    selected: Option<NaiveDate>,
    bookings: &'a BookingsByDate,
) -> MonthGrid<'a> {
    let span_start = start_of_week(start_of_month(focus));
    let span_end = end_of_work_week(end_of_month(focus));

    let mut cells = Vec::new();
    let mut cursor = span_start;
    while cursor <= span_end {
        if is_working_day(cursor) {
            cells.push(DayCell {
                date: cursor,
                in_focus_month: cursor.year() == focus.year() && cursor.month() == focus.month(),
                is_today: cursor == today,
                is_selected: selected == Some(cursor),
                bookings: bookings.on(cursor),
            });
        }
        cursor += Duration::days(1);
    }
    MonthGrid { focus, cells }
}

// ── Week grid ────────────────────────────────────────────────────

/// Zero-based slot position of a booking inside a day column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub index: usize,
    pub span: usize,
}

/// Map a booking's minutes onto the rendered window. `None` when the booking
/// falls entirely outside 09:00–18:00 and is omitted from the column.
pub fn slot_range(span: &TimeSpan) -> Option<SlotRange> {
    let window = TimeSpan { start: DAY_START_MINUTES, end: DAY_END_MINUTES };
    let clamped = span.clamp_to(&window)?;
    let index = ((clamped.start - DAY_START_MINUTES) / SLOT_INTERVAL_MINUTES) as usize;
    let end_index = ((clamped.end - DAY_START_MINUTES + SLOT_INTERVAL_MINUTES - 1)
        / SLOT_INTERVAL_MINUTES) as usize;
    // At least one slot, so clamp-shortened bookings stay visible.
    Some(SlotRange { index, span: (end_index - index).max(1) })
}

/// A clickable empty slot; maps back to a concrete local time for the
/// new-booking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCell {
    pub date: NaiveDate,
    pub minutes: Minutes,
}

impl SlotCell {
    pub fn hour(&self) -> u32 {
        (self.minutes / 60) as u32
    }

    pub fn minute(&self) -> u32 {
        (self.minutes % 60) as u32
    }
}

#[derive(Debug)]
pub struct SlotPlacement<'a> {
    pub booking: &'a Booking,
    pub range: SlotRange,
}

/// Placements are not packed into sub-columns; overlapping bookings in one
/// column are prevented upstream by the conflict checker, not by layout.
#[derive(Debug)]
pub struct WeekColumn<'a> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_selected: bool,
    pub placements: Vec<SlotPlacement<'a>>,
    pub slots: Vec<SlotCell>,
}

#[derive(Debug)]
pub struct WeekGrid<'a> {
    pub week_start: NaiveDate,
    pub columns: Vec<WeekColumn<'a>>,
}

/// Build the week view: the five working days of the week containing
/// `reference`, each with its booking placements and empty slot cells.
pub fn week_grid<'a>(
    reference: NaiveDate,
    today: NaiveDate,
    selected: Option<NaiveDate>,
    bookings: &'a BookingsByDate,
) -> WeekGrid<'a> {
    let week_start = start_of_week(reference);
    let columns = (0..WORKING_DAY_COUNT)
        .map(|offset| {
            let date = week_start + Duration::days(offset as i64);
            let placements = bookings
                .on(date)
                .iter()
                .filter_map(|booking| {
                    slot_range(&booking.span()).map(|range| SlotPlacement { booking, range })
                })
                .collect();
            let slots = (0..SLOT_COUNT)
                .map(|i| SlotCell {
                    date,
                    minutes: DAY_START_MINUTES + i as Minutes * SLOT_INTERVAL_MINUTES,
                })
                .collect();
            WeekColumn {
                date,
                is_today: date == today,
                is_selected: selected == Some(date),
                placements,
                slots,
            }
        })
        .collect();
    WeekGrid { week_start, columns }
}

// ── Time-slot pickers ────────────────────────────────────────────

/// Selectable slot boundaries, 09:00 through 18:00 inclusive (37 values).
pub fn time_slots() -> impl Iterator<Item = Minutes> {
    (DAY_START_MINUTES..=DAY_END_MINUTES).step_by(SLOT_INTERVAL_MINUTES as usize)
}

/// Start pickers exclude the closing 18:00 boundary; a booking cannot begin
/// when the window ends.
pub fn start_slots() -> impl Iterator<Item = Minutes> {
    time_slots().filter(|m| *m < DAY_END_MINUTES)
}

/// Auto-duration rule applied when the user changes a start time: the
/// earliest slot at least an hour later, else the first slot strictly after
/// the start, else the start itself (which then fails range validation at
/// submit instead of silently producing an inverted booking).
pub fn default_end_for(start: Minutes) -> Minutes {
    let target = start + DEFAULT_DURATION_MINUTES;
    time_slots()
        .find(|m| *m >= target)
        .or_else(|| time_slots().find(|m| *m > start))
        .unwrap_or(start)
}

pub fn format_minutes(total: Minutes) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn parse_hhmm(s: &str) -> Option<Minutes> {
    let (h, m) = s.split_once(':')?;
    let h: Minutes = h.parse().ok()?;
    let m: Minutes = m.parse().ok()?;
    if !(0..24).contains(&h) || !(0..60).contains(&m) {
        return None;
    }
    Some(h * 60 + m)
}
