//! `YYYY-MM` month keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::FilterError;

/// A calendar month in `YYYY-MM` form.
///
/// Ordering is the ordering of the string form, which for four-digit years is
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchMonth(String);

impl MatchMonth {
    /// Month containing a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// Derive the month from a stored date string.
    ///
    /// Accepts RFC 3339 timestamps (normalised to UTC), naive ISO date-times,
    /// `YYYY-MM-DD` dates and bare `YYYY-MM` months. Anything else is an
    /// [`FilterError::InvalidDate`].
    pub fn from_date_str(raw: &str) -> Result<Self, FilterError> {
        let s = raw.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_date(ts.with_timezone(&Utc).date_naive()));
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::from_date(ts.date()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        s.parse::<MatchMonth>()
            .map_err(|_| FilterError::InvalidDate(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MatchMonth {
    type Err = FilterError;

    /// Parse a strict `YYYY-MM` month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 7 {
            return Err(FilterError::InvalidMonth(s.to_string()));
        }
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| FilterError::InvalidMonth(s.to_string()))
    }
}

impl fmt::Display for MatchMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Serialize for MatchMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MatchMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> MatchMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_month_from_various_date_forms() {
        assert_eq!(MatchMonth::from_date_str("2024-01").unwrap(), month("2024-01"));
        assert_eq!(MatchMonth::from_date_str("2024-01-31").unwrap(), month("2024-01"));
        assert_eq!(
            MatchMonth::from_date_str("2024-02-15T18:30:00.000Z").unwrap(),
            month("2024-02")
        );
        assert_eq!(
            MatchMonth::from_date_str("2024-02-15T18:30:00").unwrap(),
            month("2024-02")
        );
    }

    #[test]
    fn test_offset_timestamps_are_normalised_to_utc() {
        // Local evening on the last day of the month is already next month in UTC.
        assert_eq!(
            MatchMonth::from_date_str("2024-03-31T23:30:00-02:00").unwrap(),
            month("2024-04")
        );
    }

    #[test]
    fn test_malformed_dates_fail() {
        for bad in ["", "yesterday", "2024-13", "2024-1", "2024/01/05"] {
            assert!(
                matches!(MatchMonth::from_date_str(bad), Err(FilterError::InvalidDate(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_strict_month_parse() {
        assert!("2024-00".parse::<MatchMonth>().is_err());
        assert!("2024-12-01".parse::<MatchMonth>().is_err());
        assert_eq!(month("2024-12").as_str(), "2024-12");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let mut months = vec![month("2024-10"), month("2023-12"), month("2024-02")];
        months.sort();
        let sorted: Vec<&str> = months.iter().map(MatchMonth::as_str).collect();
        assert_eq!(sorted, vec!["2023-12", "2024-02", "2024-10"]);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&month("2024-05")).unwrap();
        assert_eq!(json, "\"2024-05\"");
        assert!(serde_json::from_str::<MatchMonth>("\"May\"").is_err());
    }
}
