//! Excel serial date conversion
//!
//! A date cell stores a day count ("serial") whose fractional part is the
//! time of day. In the 1900 system day 1 is 1900-01-01 and day 60 is the
//! non-existent 1900-02-29, so every serial from 61 on is one day ahead of
//! the real calendar. In the 1904 system day 0 is 1904-01-01.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Last real day of the 1900 system before the phantom leap day is counted
const LEAP_BUG_SERIAL: i64 = 61;

fn epoch(date_1904: bool) -> Option<NaiveDateTime> {
    let date = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    };
    Some(date.and_time(NaiveTime::MIN))
}

/// Convert a serial to a calendar date-time
///
/// The time of day is rounded to the nearest millisecond. Returns `None` for
/// negative or non-finite serials and for serials past chrono's range.
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let whole_days = serial.floor();
    let millis = ((serial - whole_days) * MILLIS_PER_DAY + 0.5).floor() as i64;
    let mut days = whole_days as i64;
    if !date_1904 && days >= LEAP_BUG_SERIAL {
        days -= 1;
    }

    epoch(date_1904)?
        .checked_add_signed(Duration::try_days(days)?)?
        .checked_add_signed(Duration::try_milliseconds(millis)?)
}

/// Convert a calendar date-time to a serial
///
/// Returns `None` for instants before the start of the date system.
pub fn datetime_to_serial(dt: NaiveDateTime, date_1904: bool) -> Option<f64> {
    let base = epoch(date_1904)?;
    if dt < base {
        return None;
    }

    let mut days = (dt.date() - base.date()).num_days();
    if !date_1904 && days >= LEAP_BUG_SERIAL - 1 {
        days += 1;
    }

    let time = dt.time();
    let millis = time.num_seconds_from_midnight() as f64 * 1000.0
        + (time.nanosecond() / 1_000_000) as f64;

    Some(days as f64 + millis / MILLIS_PER_DAY)
}
