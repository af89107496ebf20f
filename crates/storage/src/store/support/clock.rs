#![forbid(unsafe_code)]

use time::{Date, OffsetDateTime};

pub(crate) fn now_ms() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    nanos_to_ms(nanos)
}

/// Same wall-clock time one calendar month earlier (UTC), with the day clamped
/// to the length of the earlier month.
pub(crate) fn one_month_before(ts_ms: i64) -> i64 {
    let nanos = i128::from(ts_ms) * 1_000_000i128;
    let Ok(dt) = OffsetDateTime::from_unix_timestamp_nanos(nanos) else {
        return ts_ms;
    };

    let month = dt.month().previous();
    let year = if month == time::Month::December {
        dt.year() - 1
    } else {
        dt.year()
    };
    let day = dt.day().min(month.length(year));
    let Ok(date) = Date::from_calendar_date(year, month, day) else {
        return ts_ms;
    };

    nanos_to_ms(dt.replace_date(date).unix_timestamp_nanos())
}

fn nanos_to_ms(nanos: i128) -> i64 {
    let ms = nanos / 1_000_000i128;
    if ms <= 0 {
        0
    } else if ms >= i64::MAX as i128 {
        i64::MAX
    } else {
        ms as i64
    }
}
