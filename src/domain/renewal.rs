//! Membership renewal rules
//!
//! Resolves a plan label to a number of months, computes the next payment date from it, and
//! derives the number of days left before a stored renewal date.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

/// Plan labels offered to staff, longest duration first
pub const PLANS: [&str; 4] = [
    "12 tháng - Premium",
    "6 tháng - Standard",
    "3 tháng - Basic",
    "1 tháng - Flex",
];

/// Duration tokens checked against a lower-cased plan label
///
/// The first match wins, so longer durations come first.
const PLAN_TOKENS: [(&str, u32); 4] = [
    ("12 tháng", 12),
    ("6 tháng", 6),
    ("3 tháng", 3),
    ("1 tháng", 1),
];

const DEFAULT_PLAN_MONTHS: u32 = 1;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Suffix appended to the day count in [`RenewalInfo::label`]
pub const DAY_SUFFIX: &str = "ngày";

/// Number of months a plan label pays for
///
/// Unrecognized labels fall back to a single month.
pub fn plan_months(plan: &str) -> u32 {
    let lower = plan.to_lowercase();
    PLAN_TOKENS
        .iter()
        .find(|(token, _)| lower.contains(token))
        .map(|(_, months)| *months)
        .unwrap_or(DEFAULT_PLAN_MONTHS)
}

/// Next payment date for `plan`, counted from `reference`
///
/// Months are added on the calendar: when the target month is shorter, the day is clamped to
/// its last day (Jan 31 + 1 month is the end of February).
pub fn compute_next_payment_date(plan: &str, reference: DateTime<Utc>) -> DateTime<Utc> {
    reference
        .checked_add_months(Months::new(plan_months(plan)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole days from `reference` until `target`, rounded up
///
/// Negative once `target` has passed.
pub fn days_remaining(target: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    let millis = (target - reference).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Display data about an upcoming renewal
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenewalInfo {
    /// Days until the renewal, `None` when no valid date was given
    pub days: Option<i64>,
    /// Day count with its unit, empty when `days` is `None`
    pub label: String,
    pub overdue: bool,
}

impl RenewalInfo {
    fn from_days(days: i64) -> Self {
        Self {
            days: Some(days),
            label: format!("{days} {DAY_SUFFIX}"),
            overdue: days < 0,
        }
    }
}

/// Renewal information for a stored date, relative to now
pub fn renewal_info(target: Option<&str>) -> RenewalInfo {
    renewal_info_at(target, Utc::now())
}

/// Renewal information for a stored date, relative to `reference`
///
/// Missing or unparsable dates produce an empty, non-overdue result.
pub fn renewal_info_at(target: Option<&str>, reference: DateTime<Utc>) -> RenewalInfo {
    target
        .and_then(parse_instant)
        .map(|target| RenewalInfo::from_days(days_remaining(target, reference)))
        .unwrap_or_default()
}

/// Same as [`renewal_info_at`] for an already parsed date
pub fn renewal_info_for(target: DateTime<Utc>, reference: DateTime<Utc>) -> RenewalInfo {
    RenewalInfo::from_days(days_remaining(target, reference))
}

/// Parse a date or date-time as sent by browsers
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS[.fff]]` and `YYYY-MM-DD`. Values without an offset
/// are read as UTC.
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
        return Some(date_time.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}
