//! Match filtering.
//!
//! A [`FilterSpec`] is a conjunction of independent facets: tournament-only,
//! exact army/detachment names on either side, and an inclusive month range.
//! Applying it to the full match history produces the working set that the
//! statistics engine folds.

mod month;
mod options;
mod sort;

pub use month::*;
pub use options::*;
pub use sort::*;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::models::ResolvedMatch;

/// Wildcard value accepted by every name facet.
pub const ALL: &str = "all";

/// Filter errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid match date: {0:?}")]
    InvalidDate(String),

    #[error("Invalid month (expected YYYY-MM): {0:?}")]
    InvalidMonth(String),

    #[error("Invalid sort option: {0:?}")]
    InvalidSort(String),
}

/// A name facet: either the `"all"` wildcard or an exact, case-sensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NameFilter {
    #[default]
    All,
    Exact(String),
}

impl NameFilter {
    /// Build from user input; `"all"` and the empty string are wildcards.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == ALL {
            NameFilter::All
        } else {
            NameFilter::Exact(value.to_string())
        }
    }

    pub fn accepts(&self, name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Exact(wanted) => wanted == name,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, NameFilter::All)
    }

    /// The value as shown in a dropdown.
    pub fn as_str(&self) -> &str {
        match self {
            NameFilter::All => ALL,
            NameFilter::Exact(name) => name,
        }
    }
}

impl From<&str> for NameFilter {
    fn from(value: &str) -> Self {
        NameFilter::parse(value)
    }
}

impl Serialize for NameFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NameFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NameFilter::parse(&s))
    }
}

/// Facets selected by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub tournament_only: bool,
    pub user_army: NameFilter,
    pub user_detachment: NameFilter,
    pub opponent_army: NameFilter,
    pub opponent_detachment: NameFilter,
    /// Inclusive lower bound
    pub from_month: Option<MatchMonth>,
    /// Inclusive upper bound
    pub to_month: Option<MatchMonth>,
}

impl FilterSpec {
    /// A spec that accepts every match.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether `m` passes every facet.
    ///
    /// The month is only derived when a bound is set, but a malformed date is
    /// still an error rather than a silent rejection when it is.
    pub fn matches(&self, m: &ResolvedMatch) -> Result<bool, FilterError> {
        if self.tournament_only && !m.is_tournament {
            return Ok(false);
        }

        if !self.user_army.accepts(&m.user_army.name)
            || !self.user_detachment.accepts(&m.user_detachment.name)
            || !self.opponent_army.accepts(&m.opponent_army.name)
            || !self.opponent_detachment.accepts(&m.opponent_detachment.name)
        {
            return Ok(false);
        }

        if self.from_month.is_none() && self.to_month.is_none() {
            return Ok(true);
        }

        let month = MatchMonth::from_date_str(&m.date)?;
        if self.from_month.as_ref().is_some_and(|from| month < *from) {
            return Ok(false);
        }
        if self.to_month.as_ref().is_some_and(|to| month > *to) {
            return Ok(false);
        }

        Ok(true)
    }

    /// Fill unset month bounds with the ends of the observed range.
    ///
    /// `observed` must be sorted ascending, as produced by [`FilterOptions`].
    /// Bounds the caller set are kept even when no match falls in that month.
    /// With no observations the spec is returned unchanged.
    pub fn with_observed_range(mut self, observed: &[MatchMonth]) -> Self {
        if self.from_month.is_none() {
            self.from_month = observed.first().cloned();
        }
        if self.to_month.is_none() {
            self.to_month = observed.last().cloned();
        }
        self
    }
}

/// Apply `spec` to a match history, keeping input order.
pub fn filter_matches<'a>(
    matches: &'a [ResolvedMatch],
    spec: &FilterSpec,
) -> Result<Vec<&'a ResolvedMatch>, FilterError> {
    let mut kept = Vec::new();
    for m in matches {
        if spec.matches(m)? {
            kept.push(m);
        }
    }
    Ok(kept)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{EntityId, NamedRef, ResolvedMatch};

    /// A resolved match with the given date, sides and primary scores.
    #[allow(clippy::too_many_arguments)]
    pub fn resolved(
        id: u64,
        date: &str,
        user_army: &str,
        user_det: &str,
        opp_army: &str,
        opp_det: &str,
        user_score: i32,
        opp_score: i32,
    ) -> ResolvedMatch {
        let wtc = crate::scoring::derive_wtc_scores(user_score, opp_score);
        ResolvedMatch {
            id: EntityId::new(id),
            date: date.to_string(),
            is_tournament: false,
            tournament_name: None,
            user_score,
            opponent_score: opp_score,
            user_wtc_score: wtc.user,
            opponent_wtc_score: wtc.opponent,
            user_army: NamedRef::new(EntityId::new(1), user_army),
            user_detachment: NamedRef::new(EntityId::new(11), user_det),
            opponent_army: NamedRef::new(EntityId::new(2), opp_army),
            opponent_detachment: NamedRef::new(EntityId::new(22), opp_det),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::resolved;
    use super::*;
    use pretty_assertions::assert_eq;

    fn month(s: &str) -> MatchMonth {
        s.parse().unwrap()
    }

    fn history() -> Vec<ResolvedMatch> {
        let mut gt = resolved(
            3,
            "2024-03-02",
            "Aeldari",
            "Battle Host",
            "Orks",
            "Waaagh! Tribe",
            70,
            65,
        );
        gt.is_tournament = true;
        gt.tournament_name = Some("London GT".to_string());
        vec![
            resolved(
                1,
                "2024-01-10",
                "Aeldari",
                "Battle Host",
                "Orks",
                "Waaagh! Tribe",
                60,
                40,
            ),
            resolved(
                2,
                "2024-02-14",
                "Aeldari",
                "Seer Council",
                "Necrons",
                "Awakened Dynasty",
                30,
                80,
            ),
            gt,
            resolved(
                4,
                "2024-04-20T10:00:00.000Z",
                "Tyranids",
                "Invasion Fleet",
                "Orks",
                "Bully Boyz",
                50,
                50,
            ),
        ]
    }

    fn ids(kept: &[&ResolvedMatch]) -> Vec<u64> {
        kept.iter().map(|m| m.id.get()).collect()
    }

    #[test]
    fn test_all_accepts_everything() {
        let matches = history();
        let kept = filter_matches(&matches, &FilterSpec::all()).unwrap();
        assert_eq!(ids(&kept), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tournament_only() {
        let matches = history();
        let spec = FilterSpec {
            tournament_only: true,
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_matches(&matches, &spec).unwrap()), vec![3]);
    }

    #[test]
    fn test_name_facets_are_anded() {
        let matches = history();
        let spec = FilterSpec {
            user_army: "Aeldari".into(),
            opponent_army: "Orks".into(),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_matches(&matches, &spec).unwrap()), vec![1, 3]);

        let spec = FilterSpec {
            user_detachment: "Seer Council".into(),
            opponent_detachment: "Awakened Dynasty".into(),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_matches(&matches, &spec).unwrap()), vec![2]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let matches = history();
        let spec = FilterSpec {
            user_army: "aeldari".into(),
            ..FilterSpec::default()
        };
        assert!(filter_matches(&matches, &spec).unwrap().is_empty());
    }

    #[test]
    fn test_month_range_is_inclusive() {
        let matches = history();
        let spec = FilterSpec {
            from_month: Some(month("2024-02")),
            to_month: Some(month("2024-03")),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_matches(&matches, &spec).unwrap()), vec![2, 3]);

        let spec = FilterSpec {
            from_month: Some(month("2024-04")),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_matches(&matches, &spec).unwrap()), vec![4]);
    }

    #[test]
    fn test_malformed_date_is_an_error_when_range_set() {
        let matches = vec![resolved(9, "last tuesday", "A", "X", "B", "Y", 1, 0)];
        let spec = FilterSpec {
            to_month: Some(month("2024-12")),
            ..FilterSpec::default()
        };
        assert_eq!(
            filter_matches(&matches, &spec).unwrap_err(),
            FilterError::InvalidDate("last tuesday".to_string())
        );
    }

    #[test]
    fn test_name_filter_parse() {
        assert_eq!(NameFilter::parse("all"), NameFilter::All);
        assert_eq!(NameFilter::parse(""), NameFilter::All);
        assert_eq!(NameFilter::parse("All"), NameFilter::Exact("All".to_string()));
        assert_eq!(NameFilter::Exact("Orks".to_string()).as_str(), "Orks");
    }

    #[test]
    fn test_spec_deserializes_from_presentation_payload() {
        let payload = concat!(
            r#"{"tournament_only":true,"user_army":"all","#,
            r#""opponent_army":"Orks","from_month":"2024-01"}"#,
        );
        let spec: FilterSpec = serde_json::from_str(payload).unwrap();
        assert!(spec.tournament_only);
        assert!(spec.user_army.is_all());
        assert_eq!(spec.opponent_army, NameFilter::Exact("Orks".to_string()));
        assert_eq!(spec.from_month, Some(month("2024-01")));
        assert_eq!(spec.to_month, None);
    }

    #[test]
    fn test_observed_range_defaults_unset_bounds() {
        let observed = vec![month("2024-01"), month("2024-02"), month("2024-04")];
        let spec = FilterSpec::all().with_observed_range(&observed);
        assert_eq!(spec.from_month, Some(month("2024-01")));
        assert_eq!(spec.to_month, Some(month("2024-04")));
    }

    #[test]
    fn test_observed_range_keeps_known_selection() {
        let observed = vec![month("2024-01"), month("2024-02"), month("2024-04")];
        let spec = FilterSpec {
            from_month: Some(month("2024-02")),
            to_month: Some(month("2024-02")),
            ..FilterSpec::default()
        }
        .with_observed_range(&observed);
        assert_eq!(spec.from_month, Some(month("2024-02")));
        assert_eq!(spec.to_month, Some(month("2024-02")));
    }

    #[test]
    fn test_observed_range_keeps_unobserved_explicit_bound() {
        let observed = vec![month("2024-01"), month("2024-02")];
        let spec = FilterSpec {
            from_month: Some(month("2025-01")),
            ..FilterSpec::default()
        }
        .with_observed_range(&observed);
        assert_eq!(spec.from_month, Some(month("2025-01")));
        assert_eq!(spec.to_month, Some(month("2024-02")));

        let matches = history();
        assert!(filter_matches(&matches, &spec).unwrap().is_empty());
    }

    #[test]
    fn test_observed_range_fills_only_missing_side() {
        let observed = vec![month("2024-01"), month("2024-02"), month("2024-04")];
        let spec = FilterSpec {
            to_month: Some(month("2024-03")),
            ..FilterSpec::default()
        }
        .with_observed_range(&observed);
        assert_eq!(spec.from_month, Some(month("2024-01")));
        assert_eq!(spec.to_month, Some(month("2024-03")));

        let matches = history();
        assert_eq!(ids(&filter_matches(&matches, &spec).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_observed_range_without_data_is_noop() {
        let spec = FilterSpec::all().with_observed_range(&[]);
        assert_eq!(spec, FilterSpec::all());
    }
}
