use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::{ClientError, ClientResult};

/// A calendar month, the bucketing unit for bills and projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `YYYY-MM` (or `YYYY/MM`).
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.len() != 7 {
            return None;
        }
        let bytes = trimmed.as_bytes();
        if bytes[4] != b'-' && bytes[4] != b'/' {
            return None;
        }
        let year = trimmed.get(0..4)?.parse::<i32>().ok()?;
        let month = trimmed.get(5..7)?.parse::<u32>().ok()?;
        Self::new(year, month)
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> NaiveDate {
        self.clamp_day(31)
    }

    pub fn days_in_month(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// The date with `day` in this month, pulled back to the last valid day.
    pub fn clamp_day(self, day: u32) -> NaiveDate {
        let clamped = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, clamped).unwrap_or(NaiveDate::MIN)
    }

    pub fn add_months(self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        let year = index.div_euclid(12);
        let month = u32::try_from(index.rem_euclid(12) + 1).unwrap_or(1);
        Self { year, month }
    }

    pub fn next(self) -> Self {
        self.add_months(1)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }

    /// `YYYY/MM`, the label used for recurrence evidence.
    pub fn slash_label(self) -> String {
        format!("{:04}/{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

pub fn parse_month_arg(value: &str, field_name: &str, command: &str) -> ClientResult<MonthKey> {
    MonthKey::parse(value).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM format with a real calendar month."),
            Some(command),
        )
    })
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if !looks_like_calendar_date(trimmed) {
        return None;
    }
    let normalized = trimmed.replace('/', "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
}

pub fn parse_date_arg(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    parse_calendar_date(value).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        )
    })
}

/// Adds whole months, clamping the day to the target month's length.
pub fn add_months_clamped(date: NaiveDate, months: i32) -> NaiveDate {
    MonthKey::of(date).add_months(months).clamp_day(date.day())
}

fn looks_like_calendar_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    let separator = bytes[4];
    if (separator != b'-' && separator != b'/') || bytes[7] != separator {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{MonthKey, add_months_clamped, format_iso_date, parse_calendar_date};

    fn date(value: &str) -> NaiveDate {
        let parsed = parse_calendar_date(value);
        assert!(parsed.is_some(), "bad fixture date {value}");
        parsed.unwrap_or(NaiveDate::MIN)
    }

    #[test]
    fn month_clamping_handles_end_of_month_transitions() {
        let jan_31 = date("2026-01-31");
        assert_eq!(format_iso_date(&add_months_clamped(jan_31, 1)), "2026-02-28");
        assert_eq!(format_iso_date(&add_months_clamped(jan_31, 2)), "2026-03-31");
        assert_eq!(
            format_iso_date(&add_months_clamped(date("2024-01-31"), 1)),
            "2024-02-29"
        );
    }

    #[test]
    fn add_months_crosses_year_boundaries_both_ways() {
        let key = MonthKey::new(2025, 11);
        assert!(key.is_some());
        if let Some(november) = key {
            assert_eq!(november.add_months(2).to_string(), "2026-01");
            assert_eq!(november.add_months(-11).to_string(), "2024-12");
            assert_eq!(november.add_months(14).to_string(), "2027-01");
        }
    }

    #[test]
    fn month_parsing_accepts_both_separators_and_rejects_bad_months() {
        assert_eq!(
            MonthKey::parse("2025-06").map(|key| key.to_string()),
            Some("2025-06".to_string())
        );
        assert_eq!(
            MonthKey::parse("2025/06").map(|key| key.slash_label()),
            Some("2025/06".to_string())
        );
        assert!(MonthKey::parse("2025-13").is_none());
        assert!(MonthKey::parse("2025-6").is_none());
    }

    #[test]
    fn clamp_day_uses_last_valid_day() {
        let key = MonthKey::new(2025, 2);
        assert!(key.is_some());
        if let Some(february) = key {
            assert_eq!(format_iso_date(&february.clamp_day(31)), "2025-02-28");
            assert_eq!(format_iso_date(&february.last_day()), "2025-02-28");
            assert_eq!(format_iso_date(&february.first_day()), "2025-02-01");
        }
    }

    #[test]
    fn calendar_dates_accept_slashes_but_not_mixed_separators() {
        assert_eq!(format_iso_date(&date("2025/01/10")), "2025-01-10");
        assert!(parse_calendar_date("2025/01-10").is_none());
        assert!(parse_calendar_date("2025-02-30").is_none());
    }
}
