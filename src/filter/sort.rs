//! Match history ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::FilterError;
use crate::models::ResolvedMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Score,
    Wtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A `field-direction` pair such as `date-desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOption {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOption {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortOption {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Same field, opposite direction; a second click on an active column.
    pub fn toggled(self, field: SortField) -> Self {
        let direction = if self.field == field && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { field, direction }
    }

    /// Order matches in place. Ties fall back to ID, newest first.
    pub fn sort(&self, matches: &mut [ResolvedMatch]) {
        matches.sort_by(|a, b| {
            let primary = match self.field {
                SortField::Date => a.date.cmp(&b.date),
                SortField::Score => a.user_score.cmp(&b.user_score),
                SortField::Wtc => a.user_wtc_score.cmp(&b.user_wtc_score),
            };
            let primary = match self.direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| b.id.cmp(&a.id))
        });
    }
}

impl FromStr for SortOption {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilterError::InvalidSort(s.to_string());
        let (field, direction) = s.trim().split_once('-').ok_or_else(invalid)?;

        let field = match field {
            "date" => SortField::Date,
            "score" => SortField::Score,
            "wtc" => SortField::Wtc,
            _ => return Err(invalid()),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(invalid()),
        };

        Ok(Self { field, direction })
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Date => "date",
            SortField::Score => "score",
            SortField::Wtc => "wtc",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}-{}", field, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::fixtures::resolved;

    fn history() -> Vec<ResolvedMatch> {
        vec![
            resolved(1, "2024-01-10", "A", "X", "B", "Y", 60, 40),
            resolved(2, "2024-03-01", "A", "X", "B", "Y", 20, 90),
            resolved(3, "2024-03-01", "A", "X", "B", "Y", 80, 75),
        ]
    }

    fn ids(matches: &[ResolvedMatch]) -> Vec<u64> {
        matches.iter().map(|m| m.id.get()).collect()
    }

    #[test]
    fn test_default_is_date_desc_with_id_tiebreak() {
        let mut matches = history();
        SortOption::default().sort(&mut matches);
        assert_eq!(ids(&matches), vec![3, 2, 1]);
    }

    #[test]
    fn test_score_and_wtc_sorts() {
        let mut matches = history();
        "score-asc".parse::<SortOption>().unwrap().sort(&mut matches);
        assert_eq!(ids(&matches), vec![2, 1, 3]);

        // WTC: #1 is 13-7, #2 is 0-20, #3 is 10-10
        "wtc-desc".parse::<SortOption>().unwrap().sort(&mut matches);
        assert_eq!(ids(&matches), vec![1, 3, 2]);
    }

    #[test]
    fn test_parse_and_display() {
        let opt: SortOption = "date-asc".parse().unwrap();
        assert_eq!(opt, SortOption::new(SortField::Date, SortDirection::Asc));
        assert_eq!(opt.to_string(), "date-asc");
        assert!("date".parse::<SortOption>().is_err());
        assert!("points-asc".parse::<SortOption>().is_err());
        assert!("date-up".parse::<SortOption>().is_err());
    }

    #[test]
    fn test_toggle() {
        let opt = SortOption::default().toggled(SortField::Date);
        assert_eq!(opt, SortOption::new(SortField::Date, SortDirection::Asc));
        let opt = opt.toggled(SortField::Date);
        assert_eq!(opt, SortOption::new(SortField::Date, SortDirection::Desc));
        let opt = opt.toggled(SortField::Wtc);
        assert_eq!(opt, SortOption::new(SortField::Wtc, SortDirection::Asc));
    }
}
