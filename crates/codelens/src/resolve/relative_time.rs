//! "3 days ago" style labels.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Describe `then` relative to `now`, e.g. "a few seconds ago", "2 hours ago",
/// "in 3 days".
#[must_use]
pub fn from_now(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds();
    let phrase = humanize(seconds.abs());

    if seconds < 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

/// Integer division rounded half up, for non-negative values.
fn rounded(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

fn humanize(seconds: i64) -> String {
    let minutes = rounded(seconds, MINUTE);
    let hours = rounded(seconds, HOUR);
    let days = rounded(seconds, DAY);

    if seconds < 45 {
        "a few seconds".to_string()
    } else if seconds < 90 {
        "a minute".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{hours} hours")
    } else if hours < 36 {
        "a day".to_string()
    } else if days < 26 {
        format!("{days} days")
    } else if days < 45 {
        "a month".to_string()
    } else if days < 320 {
        // 30.4 days per month
        format!("{} months", rounded(days * 10, 304))
    } else if days < 548 {
        "a year".to_string()
    } else {
        format!("{} years", rounded(days, 365))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case::just_now(Duration::seconds(10), "a few seconds ago")]
    #[case::one_minute(Duration::seconds(60), "a minute ago")]
    #[case::minutes(Duration::minutes(5), "5 minutes ago")]
    #[case::one_hour(Duration::minutes(60), "an hour ago")]
    #[case::hours(Duration::hours(5), "5 hours ago")]
    #[case::one_day(Duration::hours(24), "a day ago")]
    #[case::days(Duration::days(3), "3 days ago")]
    #[case::one_month(Duration::days(30), "a month ago")]
    #[case::months(Duration::days(92), "3 months ago")]
    #[case::one_year(Duration::days(365), "a year ago")]
    #[case::years(Duration::days(3 * 365), "3 years ago")]
    fn past_durations(#[case] elapsed: Duration, #[case] expected: &str) {
        assert_eq!(from_now(now() - elapsed, now()), expected);
    }

    #[rstest]
    #[case::seconds(Duration::seconds(5), "in a few seconds")]
    #[case::days(Duration::days(2), "in 2 days")]
    fn future_durations(#[case] ahead: Duration, #[case] expected: &str) {
        assert_eq!(from_now(now() + ahead, now()), expected);
    }

    #[test]
    fn same_instant_is_a_few_seconds_ago() {
        assert_eq!(from_now(now(), now()), "a few seconds ago");
    }
}
