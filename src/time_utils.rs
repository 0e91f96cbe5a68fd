// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date handling.

use chrono::{Days, NaiveDate};

/// Wire/storage format for journey dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// All dates from `from` to `to`, inclusive, in order. Empty if `from > to`.
pub fn days_inclusive(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = from;
    while current <= to {
        days.push(current);
        match current.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_roundtrip() {
        let date = parse_date("2024-03-01").unwrap();
        assert_eq!(format_date(date), "2024-03-01");
        assert!(parse_date("01/03/2024").is_none());
    }

    #[test]
    fn test_days_inclusive() {
        let from = parse_date("2024-02-27").unwrap();
        let to = parse_date("2024-03-01").unwrap();
        let days = days_inclusive(from, to);
        assert_eq!(days.len(), 4); // leap year
        assert_eq!(format_date(days[2]), "2024-02-29");

        assert!(days_inclusive(to, from).is_empty());
        assert_eq!(days_inclusive(from, from).len(), 1);
    }
}
