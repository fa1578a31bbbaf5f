use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid date (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
pub struct DateParseError(pub String);

/// Parses a calendar date (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let input = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| DateParseError(input.to_string()))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DateParseError(input.to_string()))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Whole days between two instants, rounded up. Order does not matter.
/// Any non-zero gap, however small, counts as one day.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let gap = if a <= b { b - a } else { a - b };
    let whole = gap.num_days();
    if gap > Duration::days(whole) {
        whole + 1
    } else {
        whole
    }
}

pub fn reservation_price(days: i64, price_per_day: &BigDecimal) -> BigDecimal {
    BigDecimal::from(days) * price_per_day
}

/// Inclusive instant range. Bounds given in either order are stored
/// earliest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DateParseError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn days(&self) -> i64 {
        days_between(self.start, self.end)
    }

    /// True when the two ranges share at least one instant, bounds included.
    pub fn overlaps(&self, existing: &DateRange) -> bool {
        let contains = |instant: DateTime<Utc>| existing.start <= instant && instant <= existing.end;
        contains(self.start)
            || contains(self.end)
            || (self.start <= existing.start && self.end >= existing.end)
    }
}
