//! Plain-text rendering for the CLI.
//!
//! Percentages and averages over empty groups print as "no data", never as 0.

use crate::calculate::{MatchStatistics, MatchupStats, MonthlySeries, ScoreMode, WinLossSummary};
use crate::models::{ArmyWithDetachments, ResolvedMatch};

const NO_DATA: &str = "no data";
const BAR_WIDTH: usize = 30;

/// `Some(50.0)` renders as `50.0%`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v),
        _ => NO_DATA.to_string(),
    }
}

fn format_average(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}", v),
        _ => NO_DATA.to_string(),
    }
}

pub fn render_summary(summary: &WinLossSummary) -> String {
    [
        format!("Matches:  {}", summary.total),
        format!("Wins:     {}", summary.wins),
        format!("Losses:   {}", summary.losses),
        format!("Draws:    {}", summary.draws),
        format!("Win rate: {}", format_percent(summary.win_rate)),
    ]
    .join("\n")
}

/// One line per detachment with its opponents indented below.
pub fn render_matchups(matchups: &[MatchupStats]) -> String {
    if matchups.is_empty() {
        return NO_DATA.to_string();
    }

    let mut lines = Vec::new();
    for row in matchups {
        lines.push(format!(
            "{:<40} {:>3}/{:<3} {:>8}",
            row.detachment,
            row.wins,
            row.total,
            format_percent(row.win_rate)
        ));
        for opp in &row.opponents {
            lines.push(format!(
                "  vs {:<35} {:>3}/{:<3} {:>8}",
                opp.opponent,
                opp.wins,
                opp.total,
                format_percent(opp.win_rate)
            ));
        }
    }
    lines.join("\n")
}

/// Monthly table, most recent month first.
pub fn render_monthly(series: &MonthlySeries, mode: ScoreMode) -> String {
    if series.is_empty() {
        return NO_DATA.to_string();
    }

    let mut lines = vec![format!(
        "{:<8} {:>7} {:>9} {:>10}",
        "Month", "Games", "Win rate", "Avg score"
    )];
    for month in series.newest_first() {
        lines.push(format!(
            "{:<8} {:>7} {:>9} {:>10}",
            month.month,
            month.total,
            format_percent(month.win_rate),
            format!("{}/{}", format_average(month.avg_score), mode.score_ceiling()),
        ));
    }
    lines.join("\n")
}

/// Average-score bars, oldest month first, scaled to the mode's score ceiling.
pub fn render_score_chart(series: &MonthlySeries, mode: ScoreMode) -> String {
    let ceiling = f64::from(mode.score_ceiling());
    series
        .oldest_first()
        .map(|month| {
            let bar = match month.avg_score {
                Some(avg) if avg.is_finite() => {
                    let filled = (avg.clamp(0.0, ceiling) * BAR_WIDTH as f64 / ceiling).round();
                    "#".repeat(filled as usize)
                }
                _ => String::new(),
            };
            format!(
                "{} |{:<width$}| {}",
                month.month,
                bar,
                format_average(month.avg_score),
                width = BAR_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_statistics(stats: &MatchStatistics) -> String {
    let mode = match stats.mode {
        ScoreMode::Primary => "primary points",
        ScoreMode::Wtc => "WTC points",
    };

    [
        format!("=== Summary ({}) ===", mode),
        render_summary(&stats.summary),
        String::new(),
        "=== Matchups ===".to_string(),
        render_matchups(&stats.matchups),
        String::new(),
        "=== By month ===".to_string(),
        render_monthly(&stats.monthly, stats.mode),
        String::new(),
        "=== Average score trend ===".to_string(),
        render_score_chart(&stats.monthly, stats.mode),
    ]
    .join("\n")
}

pub fn render_history(matches: &[ResolvedMatch]) -> String {
    if matches.is_empty() {
        return "No matches recorded.".to_string();
    }

    matches
        .iter()
        .map(|m| {
            let event = match (&m.tournament_name, m.is_tournament) {
                (Some(name), true) => format!(" [{}]", name),
                (None, true) => " [tournament]".to_string(),
                _ => String::new(),
            };
            format!(
                "#{:<4} {}  {} ({}) {}-{} {} ({})  WTC {}-{}{}",
                m.id.get(),
                m.date,
                m.user_army.name,
                m.user_detachment.name,
                m.user_score,
                m.opponent_score,
                m.opponent_army.name,
                m.opponent_detachment.name,
                m.user_wtc_score,
                m.opponent_wtc_score,
                event
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Army listing with detachment IDs, deleted rows marked.
pub fn render_armies(armies: &[ArmyWithDetachments]) -> String {
    if armies.is_empty() {
        return "No armies.".to_string();
    }

    let mut lines = Vec::new();
    for entry in armies {
        let deleted = if entry.army.is_deleted { " (deleted)" } else { "" };
        lines.push(format!("#{} {}{}", entry.army.id, entry.army.name, deleted));
        for det in &entry.detachments {
            let deleted = if det.is_deleted { " (deleted)" } else { "" };
            lines.push(format!("    #{} {}{}", det.id, det.name, deleted));
        }
    }
    lines.join("\n")
}
