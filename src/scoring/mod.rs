//! WTC secondary score derivation.
//!
//! Converts the primary-objective point differential of a game into the
//! zero-sum 20-point split used for team tournament ranking. The split moves
//! one point per 5-point band of differential, capped at 20-0.

use serde::{Deserialize, Serialize};

/// Total WTC points shared by both sides of a game.
pub const WTC_TOTAL: i32 = 20;

/// WTC points each side gets on an exact draw.
pub const WTC_DRAW: i32 = WTC_TOTAL / 2;

/// Derived WTC scores for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WtcScores {
    pub user: i32,
    pub opponent: i32,
}

impl WtcScores {
    /// The same result seen from the opponent's side.
    pub fn swap(self) -> Self {
        Self {
            user: self.opponent,
            opponent: self.user,
        }
    }
}

/// Map an absolute point differential to the number of WTC points that move
/// from the loser to the winner.
pub fn wtc_delta(abs_diff: u64) -> i32 {
    match abs_diff {
        0..=5 => 0,
        6..=10 => 1,
        11..=15 => 2,
        16..=20 => 3,
        21..=25 => 4,
        26..=30 => 5,
        31..=35 => 6,
        36..=40 => 7,
        41..=45 => 8,
        46..=50 => 9,
        _ => 10,
    }
}

/// Derive both sides' WTC scores from the primary scores.
pub fn derive_wtc_scores(user_score: i32, opponent_score: i32) -> WtcScores {
    let diff = i64::from(user_score) - i64::from(opponent_score);
    let delta = wtc_delta(diff.unsigned_abs());

    match diff.signum() {
        1 => WtcScores {
            user: WTC_DRAW + delta,
            opponent: WTC_DRAW - delta,
        },
        -1 => WtcScores {
            user: WTC_DRAW - delta,
            opponent: WTC_DRAW + delta,
        },
        _ => WtcScores {
            user: WTC_DRAW,
            opponent: WTC_DRAW,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wtc(user: i32, opponent: i32) -> WtcScores {
        WtcScores { user, opponent }
    }

    #[test]
    fn test_draw_is_ten_ten() {
        assert_eq!(derive_wtc_scores(55, 55), wtc(10, 10));
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(wtc_delta(0), 0);
        assert_eq!(wtc_delta(5), 0);
        assert_eq!(wtc_delta(6), 1);
        assert_eq!(wtc_delta(10), 1);
        assert_eq!(wtc_delta(11), 2);
        assert_eq!(wtc_delta(25), 4);
        assert_eq!(wtc_delta(26), 5);
        assert_eq!(wtc_delta(45), 8);
        assert_eq!(wtc_delta(46), 9);
        assert_eq!(wtc_delta(50), 9);
        assert_eq!(wtc_delta(51), 10);
        assert_eq!(wtc_delta(1_000), 10);
    }

    #[test]
    fn test_five_and_six_land_in_different_bands() {
        for x in [0, 17, 40] {
            assert_eq!(derive_wtc_scores(x, x + 5).user, 10);
            assert_eq!(derive_wtc_scores(x, x + 6).user, 9);
        }
    }

    #[test]
    fn test_fifty_one_is_a_whitewash() {
        let scores = derive_wtc_scores(20, 71);
        assert_eq!(scores, wtc(0, 20));
        assert_eq!(derive_wtc_scores(90, 0), wtc(20, 0));
    }

    #[test]
    fn test_winner_gets_the_delta() {
        assert_eq!(derive_wtc_scores(60, 40), wtc(13, 7));
        assert_eq!(derive_wtc_scores(40, 60), wtc(7, 13));
    }

    #[test]
    fn test_sum_and_symmetry_over_score_grid() {
        for a in (-10..=110).step_by(3) {
            for b in (-10..=110).step_by(7) {
                let forward = derive_wtc_scores(a, b);
                assert_eq!(forward.user + forward.opponent, WTC_TOTAL);
                assert!((0..=WTC_TOTAL).contains(&forward.user));
                assert!((0..=WTC_TOTAL).contains(&forward.opponent));
                assert_eq!(forward, derive_wtc_scores(b, a).swap());
            }
        }
    }

    #[test]
    fn test_extreme_inputs_do_not_overflow() {
        let scores = derive_wtc_scores(i32::MAX, i32::MIN);
        assert_eq!(scores, wtc(20, 0));
    }
}
