use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::model::{MINUTES_PER_DAY, Minutes};

/// Default organizational UTC offset in hours (JST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Runtime configuration, constructed by the application entry point and
/// passed to the engine. Nothing in this crate reads ambient global state.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// The single fixed organizational timezone. Every timestamp the system
    /// stores or compares carries this offset; it is never inferred from the
    /// host machine's local timezone.
    pub utc_offset: FixedOffset,
}

impl Config {
    pub fn new(utc_offset_hours: i32) -> Option<Self> {
        FixedOffset::east_opt(utc_offset_hours * 3600).map(|utc_offset| Self { utc_offset })
    }

    /// Read `YOYAKU_UTC_OFFSET_HOURS`, falling back to the default offset.
    pub fn from_env() -> Self {
        std::env::var("YOYAKU_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .and_then(Self::new)
            .unwrap_or_default()
    }

    /// Resolve a calendar date plus minutes-since-midnight into a concrete
    /// timestamp in the organizational timezone. Minute 1440 maps to midnight
    /// of the following day; anything outside `0..=1440` is `None`.
    pub fn local_datetime(&self, date: NaiveDate, minutes: Minutes) -> Option<DateTime<FixedOffset>> {
        let (date, minutes) = if minutes == MINUTES_PER_DAY {
            (date.succ_opt()?, 0)
        } else {
            (date, minutes)
        };
        if !(0..MINUTES_PER_DAY).contains(&minutes) {
            return None;
        }
        let time = NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)?;
        date.and_time(time).and_local_timezone(self.utc_offset).single()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_HOURS).expect("default offset is in range")
    }
}
