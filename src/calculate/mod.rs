//! Statistics calculation engine.
//!
//! Folds a filtered match history into:
//! - Overall win/loss/draw summary
//! - Matchup analysis per user detachment and opposing army
//! - Per-month win rate and average score series
//!
//! Every win/loss decision goes through [`ScoreMode`], so switching between
//! primary and WTC scoring reclassifies all of the above consistently.
//! Percentages over an empty group are `None`, never zero.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::filter::{FilterError, MatchMonth};
use crate::models::ResolvedMatch;

/// Which pair of scores decides a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Primary-objective points
    #[default]
    Primary,
    /// Derived WTC points
    Wtc,
}

impl ScoreMode {
    pub fn from_use_wtc(use_wtc: bool) -> Self {
        if use_wtc {
            ScoreMode::Wtc
        } else {
            ScoreMode::Primary
        }
    }

    /// `(user, opponent)` scores under this mode.
    pub fn scores(&self, m: &ResolvedMatch) -> (i32, i32) {
        match self {
            ScoreMode::Primary => (m.user_score, m.opponent_score),
            ScoreMode::Wtc => (m.user_wtc_score, m.opponent_wtc_score),
        }
    }

    /// Upper bound of the score axis when charting this mode.
    pub fn score_ceiling(&self) -> i32 {
        match self {
            ScoreMode::Primary => 100,
            ScoreMode::Wtc => crate::scoring::WTC_TOTAL,
        }
    }
}

/// Result of a single game from the user's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Classify a game under `mode`.
pub fn classify(m: &ResolvedMatch, mode: ScoreMode) -> Outcome {
    let (user, opponent) = mode.scores(m);
    match user.cmp(&opponent) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// Win rate as a percentage (0 to 100). `None` when there are no games.
pub fn calculate_win_rate(wins: u32, total: u32) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(wins as f64 / total as f64 * 100.0)
    }
}

/// Overall summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinLossSummary {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: Option<f64>,
}

/// Wins against one opposing army, for one user detachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentStats {
    pub opponent: String,
    pub wins: u32,
    pub total: u32,
    pub win_rate: Option<f64>,
}

/// One row of the matchup table, keyed `"Army (Detachment)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupStats {
    pub detachment: String,
    pub wins: u32,
    pub total: u32,
    pub win_rate: Option<f64>,
    pub opponents: Vec<OpponentStats>,
}

/// Games played in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthStats {
    pub month: MatchMonth,
    pub total: u32,
    pub wins: u32,
    /// Sum of the user-side score under the active mode
    pub score_sum: i64,
    pub win_rate: Option<f64>,
    pub avg_score: Option<f64>,
}

/// Per-month figures, grouped once and readable in either direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    /// Ascending by month
    months: Vec<MonthStats>,
}

impl MonthlySeries {
    /// Most recent month first, for tables.
    pub fn newest_first(&self) -> impl Iterator<Item = &MonthStats> {
        self.months.iter().rev()
    }

    /// Oldest month first, for charts.
    pub fn oldest_first(&self) -> impl Iterator<Item = &MonthStats> {
        self.months.iter()
    }

    pub fn get(&self, month: &MatchMonth) -> Option<&MonthStats> {
        self.months
            .binary_search_by(|m| m.month.cmp(month))
            .ok()
            .map(|i| &self.months[i])
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Everything the statistics page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub mode: ScoreMode,
    pub summary: WinLossSummary,
    pub matchups: Vec<MatchupStats>,
    pub monthly: MonthlySeries,
}

/// Count wins, losses and draws.
pub fn summarize<'a, I>(matches: I, mode: ScoreMode) -> WinLossSummary
where
    I: IntoIterator<Item = &'a ResolvedMatch>,
{
    let mut summary = WinLossSummary::default();
    for m in matches {
        summary.total += 1;
        match classify(m, mode) {
            Outcome::Win => summary.wins += 1,
            Outcome::Loss => summary.losses += 1,
            Outcome::Draw => {}
        }
    }
    summary.draws = summary.total - summary.wins - summary.losses;
    summary.win_rate = calculate_win_rate(summary.wins, summary.total);
    summary
}

#[derive(Default)]
struct Tally {
    wins: u32,
    total: u32,
}

impl Tally {
    fn add(&mut self, won: bool) {
        self.total += 1;
        if won {
            self.wins += 1;
        }
    }
}

/// Group games by user army and detachment, then by opposing army.
///
/// Rows and sub-rows keep the order in which their key first appears. Keys
/// compare as exact strings.
pub fn matchup_analysis<'a, I>(matches: I, mode: ScoreMode) -> Vec<MatchupStats>
where
    I: IntoIterator<Item = &'a ResolvedMatch>,
{
    let mut rows: Vec<(String, Tally, Vec<(String, Tally)>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in matches {
        let won = classify(m, mode) == Outcome::Win;
        let key = format!("{} ({})", m.user_army.name, m.user_detachment.name);

        let row = *index.entry(key.clone()).or_insert_with(|| {
            rows.push((key, Tally::default(), Vec::new()));
            rows.len() - 1
        });
        let (_, tally, opponents) = &mut rows[row];
        tally.add(won);

        let opponent = &m.opponent_army.name;
        match opponents.iter_mut().find(|(name, _)| name == opponent) {
            Some((_, opp)) => opp.add(won),
            None => {
                let mut opp = Tally::default();
                opp.add(won);
                opponents.push((opponent.clone(), opp));
            }
        }
    }

    rows.into_iter()
        .map(|(detachment, tally, opponents)| MatchupStats {
            detachment,
            wins: tally.wins,
            total: tally.total,
            win_rate: calculate_win_rate(tally.wins, tally.total),
            opponents: opponents
                .into_iter()
                .map(|(opponent, t)| OpponentStats {
                    opponent,
                    wins: t.wins,
                    total: t.total,
                    win_rate: calculate_win_rate(t.wins, t.total),
                })
                .collect(),
        })
        .collect()
}

/// Group games by month for the win rate and score series.
pub fn monthly_series<'a, I>(matches: I, mode: ScoreMode) -> Result<MonthlySeries, FilterError>
where
    I: IntoIterator<Item = &'a ResolvedMatch>,
{
    let mut grouped: BTreeMap<MatchMonth, (Tally, i64)> = BTreeMap::new();

    for m in matches {
        let month = MatchMonth::from_date_str(&m.date)?;
        let (user_score, _) = mode.scores(m);
        let (tally, score_sum) = grouped.entry(month).or_default();
        tally.add(classify(m, mode) == Outcome::Win);
        *score_sum += i64::from(user_score);
    }

    let months = grouped
        .into_iter()
        .map(|(month, (tally, score_sum))| MonthStats {
            month,
            total: tally.total,
            wins: tally.wins,
            score_sum,
            win_rate: calculate_win_rate(tally.wins, tally.total),
            avg_score: (tally.total > 0).then(|| score_sum as f64 / tally.total as f64),
        })
        .collect();

    Ok(MonthlySeries { months })
}

/// Compute every statistic over `matches` with one scoring switch.
pub fn aggregate(
    matches: &[&ResolvedMatch],
    use_wtc: bool,
) -> Result<MatchStatistics, FilterError> {
    let mode = ScoreMode::from_use_wtc(use_wtc);

    Ok(MatchStatistics {
        mode,
        summary: summarize(matches.iter().copied(), mode),
        matchups: matchup_analysis(matches.iter().copied(), mode),
        monthly: monthly_series(matches.iter().copied(), mode)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::fixtures::resolved;
    use pretty_assertions::assert_eq;

    fn month(s: &str) -> MatchMonth {
        s.parse().unwrap()
    }

    fn scenario() -> Vec<ResolvedMatch> {
        vec![
            resolved(1, "2024-01", "A", "X", "B", "Y", 60, 40),
            resolved(2, "2024-02", "A", "X", "B", "Y", 40, 60),
        ]
    }

    fn refs(matches: &[ResolvedMatch]) -> Vec<&ResolvedMatch> {
        matches.iter().collect()
    }

    #[test]
    fn test_calculate_win_rate() {
        assert_eq!(calculate_win_rate(1, 2), Some(50.0));
        assert_eq!(calculate_win_rate(0, 3), Some(0.0));
        assert_eq!(calculate_win_rate(0, 0), None);
    }

    #[test]
    fn test_two_game_scenario() {
        let matches = scenario();
        let stats = aggregate(&refs(&matches), false).unwrap();

        assert_eq!(
            stats.summary,
            WinLossSummary {
                total: 2,
                wins: 1,
                losses: 1,
                draws: 0,
                win_rate: Some(50.0),
            }
        );
        assert_eq!(
            stats.matchups,
            vec![MatchupStats {
                detachment: "A (X)".to_string(),
                wins: 1,
                total: 2,
                win_rate: Some(50.0),
                opponents: vec![OpponentStats {
                    opponent: "B".to_string(),
                    wins: 1,
                    total: 2,
                    win_rate: Some(50.0),
                }],
            }]
        );
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let stats = aggregate(&[], true).unwrap();
        assert_eq!(stats.summary.total, 0);
        assert_eq!(stats.summary.win_rate, None);
        assert!(stats.matchups.is_empty());
        assert!(stats.monthly.is_empty());
    }

    #[test]
    fn test_draws_are_the_remainder() {
        let matches = vec![
            resolved(1, "2024-01-01", "A", "X", "B", "Y", 50, 50),
            resolved(2, "2024-01-02", "A", "X", "B", "Y", 51, 50),
            resolved(3, "2024-01-03", "A", "X", "B", "Y", 10, 90),
        ];
        for use_wtc in [false, true] {
            let s = summarize(&matches, ScoreMode::from_use_wtc(use_wtc));
            assert_eq!(s.wins + s.losses + s.draws, s.total);
        }
        let primary = summarize(&matches, ScoreMode::Primary);
        assert_eq!((primary.wins, primary.losses, primary.draws), (1, 1, 1));
        // A one-point win is a 10-10 draw under WTC scoring.
        let wtc = summarize(&matches, ScoreMode::Wtc);
        assert_eq!((wtc.wins, wtc.losses, wtc.draws), (0, 1, 2));
    }

    #[test]
    fn test_mode_switch_reclassifies_everywhere() {
        // Stored WTC scores disagree with the primary result.
        let mut odd = resolved(1, "2024-05-05", "A", "X", "B", "Y", 55, 45);
        odd.user_wtc_score = 8;
        odd.opponent_wtc_score = 12;
        let matches = vec![odd];

        let primary = aggregate(&refs(&matches), false).unwrap();
        assert_eq!(primary.summary.wins, 1);
        assert_eq!(primary.matchups[0].wins, 1);
        assert_eq!(primary.matchups[0].opponents[0].wins, 1);
        assert_eq!(primary.monthly.get(&month("2024-05")).unwrap().wins, 1);

        let wtc = aggregate(&refs(&matches), true).unwrap();
        assert_eq!(wtc.summary.losses, 1);
        assert_eq!(wtc.matchups[0].wins, 0);
        assert_eq!(wtc.matchups[0].opponents[0].wins, 0);
        assert_eq!(wtc.monthly.get(&month("2024-05")).unwrap().wins, 0);
        assert_eq!(wtc.monthly.get(&month("2024-05")).unwrap().avg_score, Some(8.0));
    }

    #[test]
    fn test_matchup_groups_first_seen_and_case_sensitive() {
        let matches = vec![
            resolved(1, "2024-01-01", "Orks", "Bully Boyz", "Aeldari", "Battle Host", 70, 20),
            resolved(2, "2024-01-02", "Aeldari", "Battle Host", "Orks", "Bully Boyz", 20, 70),
            resolved(3, "2024-01-03", "orks", "Bully Boyz", "Necrons", "Hypercrypt", 70, 20),
            resolved(4, "2024-01-04", "Orks", "Bully Boyz", "Necrons", "Hypercrypt", 20, 70),
        ];
        let rows = matchup_analysis(&matches, ScoreMode::Primary);
        let keys: Vec<&str> = rows.iter().map(|r| r.detachment.as_str()).collect();
        assert_eq!(keys, vec!["Orks (Bully Boyz)", "Aeldari (Battle Host)", "orks (Bully Boyz)"]);

        let orks = &rows[0];
        assert_eq!((orks.wins, orks.total), (1, 2));
        let opps: Vec<(&str, u32, u32)> = orks
            .opponents
            .iter()
            .map(|o| (o.opponent.as_str(), o.wins, o.total))
            .collect();
        assert_eq!(opps, vec![("Aeldari", 1, 1), ("Necrons", 0, 1)]);
    }

    #[test]
    fn test_monthly_series_both_orders() {
        let matches = vec![
            resolved(1, "2024-03-01", "A", "X", "B", "Y", 80, 20),
            resolved(2, "2024-01-15", "A", "X", "B", "Y", 30, 60),
            resolved(3, "2024-03-20", "A", "X", "B", "Y", 40, 60),
            resolved(4, "2024-02-02T12:00:00.000Z", "A", "X", "B", "Y", 55, 50),
        ];
        let series = monthly_series(&matches, ScoreMode::Primary).unwrap();

        let newest: Vec<&str> = series.newest_first().map(|m| m.month.as_str()).collect();
        assert_eq!(newest, vec!["2024-03", "2024-02", "2024-01"]);
        let oldest: Vec<&str> = series.oldest_first().map(|m| m.month.as_str()).collect();
        assert_eq!(oldest, vec!["2024-01", "2024-02", "2024-03"]);

        let march = series.get(&month("2024-03")).unwrap();
        assert_eq!((march.wins, march.total), (1, 2));
        assert_eq!(march.win_rate, Some(50.0));
        assert_eq!(march.avg_score, Some(60.0));
    }

    #[test]
    fn test_monthly_series_uses_wtc_scores_for_average() {
        let matches = vec![
            resolved(1, "2024-03-01", "A", "X", "B", "Y", 80, 20),
            resolved(2, "2024-03-02", "A", "X", "B", "Y", 50, 50),
        ];
        let series = monthly_series(&matches, ScoreMode::Wtc).unwrap();
        // 20 and 10 WTC points.
        assert_eq!(series.get(&month("2024-03")).unwrap().avg_score, Some(15.0));
    }

    #[test]
    fn test_bad_date_surfaces_from_aggregate() {
        let matches = vec![resolved(1, "not a date", "A", "X", "B", "Y", 1, 0)];
        assert!(matches!(
            aggregate(&refs(&matches), false),
            Err(FilterError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_statistics_serialize_missing_rates_as_null() {
        let stats = aggregate(&[], false).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["summary"]["win_rate"].is_null());
        assert_eq!(json["mode"], "primary");
    }
}
