use std::fmt;

use binread::BinRead;
use byteorder::{WriteBytesExt, LE};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

/// A 32-bit DOS date/time as stored inside shell item entries.
///
/// The date word carries the year (biased by 1980) in its seven high bits,
/// the month in the next four and the day in the low five; the time word
/// carries hour (5), minute (6) and second (5). The seconds field is taken
/// as stored, so it only represents 0 through 31.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime(NaiveDateTime);

impl DosDateTime {
    pub fn now() -> Self {
        Self(Utc::now().naive_utc())
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    fn from_words(date: u16, time: u16) -> Self {
        let year = ((date >> 9) & 0x7f) as i32 + 1980;
        // zero month or day is normalized to 1
        let month = (((date >> 5) & 0x0f) as u32).max(1);
        let day = ((date & 0x1f) as u32).max(1);
        let hour = ((time >> 11) & 0x1f) as u32;
        let minute = ((time >> 5) & 0x3f) as u32;
        let second = (time & 0x1f) as u32;
        let datetime = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second));
        match datetime {
            Some(dt) => Self(dt),
            None => Self::now(),
        }
    }

    fn to_words(self) -> (u16, u16) {
        let date = (((self.0.year() - 1980).clamp(0, 0x7f) as u16) << 9)
            | ((self.0.month() as u16) << 5)
            | self.0.day() as u16;
        // mask so seconds above 31 cannot bleed into the minutes field
        let time = ((self.0.hour() as u16) << 11)
            | ((self.0.minute() as u16) << 5)
            | (self.0.second() as u16 & 0x1f);
        (date, time)
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        let (date, time) = self.to_words();
        buf.write_u16::<LE>(date).unwrap();
        buf.write_u16::<LE>(time).unwrap();
    }
}

impl From<NaiveDateTime> for DosDateTime {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl BinRead for DosDateTime {
    type Args = ();

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        _args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        use binread::BinReaderExt;
        let date: u16 = reader.read_le()?;
        let time: u16 = reader.read_le()?;
        Ok(Self::from_words(date, time))
    }
}

impl fmt::Debug for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DosDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(dt: DosDateTime) -> DosDateTime {
        let (date, time) = dt.to_words();
        DosDateTime::from_words(date, time)
    }

    #[test]
    fn representable_values_survive() {
        for (y, mo, d, h, mi, s) in [
            (1980, 1, 1, 0, 0, 0),
            (2020, 9, 1, 23, 59, 31),
            (2107, 12, 31, 12, 30, 15),
        ] {
            let dt = DosDateTime::from(
                NaiveDate::from_ymd_opt(y, mo, d)
                    .unwrap()
                    .and_hms_opt(h, mi, s)
                    .unwrap(),
            );
            assert_eq!(round_trip(dt), dt);
        }
    }

    #[test]
    fn zero_month_and_day_normalize() {
        let dt = DosDateTime::from_words(0, 0);
        assert_eq!(dt.datetime().date(), NaiveDate::from_ymd_opt(1980, 1, 1).unwrap());
    }

    #[test]
    fn oversized_seconds_stay_in_field() {
        let dt = DosDateTime::from(
            NaiveDate::from_ymd_opt(2001, 6, 15)
                .unwrap()
                .and_hms_opt(10, 20, 59)
                .unwrap(),
        );
        let back = round_trip(dt);
        assert_eq!(back.datetime().minute(), 20);
        assert_eq!(back.datetime().second(), 59 & 0x1f);
    }
}
