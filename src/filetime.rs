use std::fmt;

use binread::BinRead;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Seconds between 1601-01-01 and 1970-01-01.
const EPOCH_OFFSET_SECONDS: i64 = 11_644_473_600;

/// The FILETIME structure is a 64-bit value that represents the number of
/// 100-nanosecond intervals that have elapsed since January 1, 1601,
/// Coordinated Universal Time (UTC).
///
/// The raw value is kept as-is so that re-serializing a parsed link
/// reproduces the original bytes; only the civil-time accessors clamp
/// out-of-range values to "now".
#[derive(Clone, Copy, PartialEq, Eq, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileTime {
    low_date_time: u32,
    high_date_time: u32,
}

impl fmt::Debug for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.datetime())
    }
}

impl FileTime {
    fn epoch() -> NaiveDateTime {
        let epoch_date = NaiveDate::from_ymd_opt(1601, 1, 1).unwrap();
        let epoch_time = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        NaiveDateTime::new(epoch_date, epoch_time)
    }

    /// Convert the `FileTime` to civil UTC time. Values that do not map to a
    /// representable timestamp fall back to the current time.
    pub fn datetime(&self) -> NaiveDateTime {
        let raw: u64 = Self::into(*self);
        let secs = (raw / 10_000_000) as i64 - EPOCH_OFFSET_SECONDS;
        let nanos = (raw % 10_000_000) as u32 * 100;
        match chrono::DateTime::from_timestamp(secs, nanos) {
            Some(dt) => dt.naive_utc(),
            None => Utc::now().naive_utc(),
        }
    }

    /// Create a new `FileTime` object representing now.
    pub fn now() -> Self {
        Self::from(Utc::now().naive_utc())
    }
}

impl From<NaiveDateTime> for FileTime {
    fn from(value: NaiveDateTime) -> Self {
        let duration = value - Self::epoch();
        match duration.num_microseconds() {
            Some(us) if us >= 0 => Self::from(us as u64 * 10),
            // before 1601 or beyond the 64-bit range: substitute now
            _ => Self::from((Utc::now().naive_utc() - Self::epoch()).num_microseconds().unwrap_or(0).max(0) as u64 * 10),
        }
    }
}

impl From<u64> for FileTime {
    fn from(value: u64) -> Self {
        let low_date_time = (value & 0xFFFF_FFFF) as u32;
        let high_date_time = ((value >> 32) & 0xFFFF_FFFF) as u32;
        Self {
            low_date_time,
            high_date_time,
        }
    }
}

impl From<FileTime> for u64 {
    fn from(val: FileTime) -> Self {
        u64::from(val.low_date_time) + (u64::from(val.high_date_time) << 32)
    }
}
