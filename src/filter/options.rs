//! Dropdown values for the filter panel.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{FilterError, FilterSpec, MatchMonth, ALL};
use crate::models::ResolvedMatch;

/// Selectable values for each facet, derived from the unfiltered history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub user_armies: Vec<String>,
    pub user_detachments: Vec<String>,
    pub opponent_armies: Vec<String>,
    pub opponent_detachments: Vec<String>,
    /// Every month with at least one match, ascending
    pub months: Vec<MatchMonth>,
}

impl FilterOptions {
    /// Collect options from `matches`.
    ///
    /// Each list starts with `"all"` followed by names in first-seen order.
    /// Detachment lists only offer detachments of the army currently selected
    /// on the same side.
    pub fn collect(matches: &[ResolvedMatch], current: &FilterSpec) -> Result<Self, FilterError> {
        let months: BTreeSet<MatchMonth> = matches
            .iter()
            .map(|m| MatchMonth::from_date_str(&m.date))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            user_armies: unique_with_all(matches.iter().map(|m| m.user_army.name.as_str())),
            user_detachments: unique_with_all(
                matches
                    .iter()
                    .filter(|m| current.user_army.accepts(&m.user_army.name))
                    .map(|m| m.user_detachment.name.as_str()),
            ),
            opponent_armies: unique_with_all(matches.iter().map(|m| m.opponent_army.name.as_str())),
            opponent_detachments: unique_with_all(
                matches
                    .iter()
                    .filter(|m| current.opponent_army.accepts(&m.opponent_army.name))
                    .map(|m| m.opponent_detachment.name.as_str()),
            ),
            months: months.into_iter().collect(),
        })
    }
}

fn unique_with_all<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out = vec![ALL.to_string()];
    for name in names {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::fixtures::resolved;
    use pretty_assertions::assert_eq;

    fn history() -> Vec<ResolvedMatch> {
        vec![
            resolved(1, "2024-03-01", "Orks", "Bully Boyz", "Aeldari", "Battle Host", 1, 0),
            resolved(2, "2024-01-01", "Aeldari", "Seer Council", "Orks", "Waaagh! Tribe", 1, 0),
            resolved(3, "2024-03-09", "Orks", "Waaagh! Tribe", "Aeldari", "Battle Host", 1, 0),
        ]
    }

    #[test]
    fn test_options_first_seen_order_with_all() {
        let opts = FilterOptions::collect(&history(), &FilterSpec::all()).unwrap();
        assert_eq!(opts.user_armies, vec!["all", "Orks", "Aeldari"]);
        assert_eq!(
            opts.user_detachments,
            vec!["all", "Bully Boyz", "Seer Council", "Waaagh! Tribe"]
        );
        assert_eq!(opts.opponent_armies, vec!["all", "Aeldari", "Orks"]);
        let months: Vec<&str> = opts.months.iter().map(MatchMonth::as_str).collect();
        assert_eq!(months, vec!["2024-01", "2024-03"]);
    }

    #[test]
    fn test_detachments_narrow_to_selected_army() {
        let spec = FilterSpec {
            user_army: "Orks".into(),
            ..FilterSpec::default()
        };
        let opts = FilterOptions::collect(&history(), &spec).unwrap();
        assert_eq!(opts.user_detachments, vec!["all", "Bully Boyz", "Waaagh! Tribe"]);
        assert_eq!(opts.opponent_detachments, vec!["all", "Battle Host", "Waaagh! Tribe"]);
    }

    #[test]
    fn test_empty_history() {
        let opts = FilterOptions::collect(&[], &FilterSpec::all()).unwrap();
        assert_eq!(opts.user_armies, vec!["all"]);
        assert!(opts.months.is_empty());
    }
}
