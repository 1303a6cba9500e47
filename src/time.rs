//! Wall-clock helpers.

use chrono::{DateTime, TimeZone, Utc};
use std::{cmp, thread, time};

/// Seconds since the Unix epoch, right now.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Convert seconds since the Unix epoch into a UTC date-time.
///
/// Returns `None` for instants chrono cannot represent.
pub fn from_timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Back off before a retry.
///
/// The delay doubles with every attempt, starting at 2ms and never exceeding
/// 500ms.
#[inline]
pub fn delay(attempts: u32) {
    if attempts > 0 && attempts < 9 {
        let delay = cmp::min(500, 2u32.pow(attempts));
        let sleep_time = time::Duration::from_millis(u64::from(delay));
        thread::sleep(sleep_time);
    } else if attempts >= 9 {
        let sleep_time = time::Duration::from_millis(500);
        thread::sleep(sleep_time);
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn epoch_round_trips() {
        let dt = from_timestamp(645_181_811).unwrap();
        assert_eq!("1990-06-12T09:10:11+00:00", dt.to_rfc3339());
    }

    #[test]
    fn unrepresentable_is_none() {
        assert!(from_timestamp(i64::max_value()).is_none());
    }
}
