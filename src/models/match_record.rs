//! Match model: one recorded game between the user and an opponent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ArmyId, DetachmentId, EntityId, MatchId};
use crate::scoring::{derive_wtc_scores, WtcScores};

/// A stored game result. Army and detachment sides are held by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Unique identifier
    pub id: MatchId,

    /// Date the game was played
    pub date: NaiveDate,

    pub user_army_id: ArmyId,
    pub user_detachment_id: DetachmentId,
    pub opponent_army_id: ArmyId,
    pub opponent_detachment_id: DetachmentId,

    /// Primary-objective points
    pub user_score: i32,
    pub opponent_score: i32,

    /// Derived WTC points; always sum to 20
    pub user_wtc_score: i32,
    pub opponent_wtc_score: i32,

    pub is_tournament: bool,

    /// Only present when `is_tournament` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
}

impl Match {
    /// Create an unsaved casual match; WTC scores are derived from the primary scores.
    pub fn new(
        date: NaiveDate,
        user: Side,
        opponent: Side,
        user_score: i32,
        opponent_score: i32,
    ) -> Self {
        let WtcScores {
            user: user_wtc_score,
            opponent: opponent_wtc_score,
        } = derive_wtc_scores(user_score, opponent_score);

        Self {
            id: EntityId::UNSAVED,
            date,
            user_army_id: user.army_id,
            user_detachment_id: user.detachment_id,
            opponent_army_id: opponent.army_id,
            opponent_detachment_id: opponent.detachment_id,
            user_score,
            opponent_score,
            user_wtc_score,
            opponent_wtc_score,
            is_tournament: false,
            tournament_name: None,
        }
    }

    /// Builder method to set the ID.
    pub fn with_id(mut self, id: MatchId) -> Self {
        self.id = id;
        self
    }

    /// Replace the primary scores and re-derive the WTC split.
    pub fn with_scores(mut self, user_score: i32, opponent_score: i32) -> Self {
        let wtc = derive_wtc_scores(user_score, opponent_score);
        self.user_score = user_score;
        self.opponent_score = opponent_score;
        self.user_wtc_score = wtc.user;
        self.opponent_wtc_score = wtc.opponent;
        self
    }

    /// Builder method to set tournament status. The name is dropped for casual games.
    pub fn with_tournament(mut self, is_tournament: bool, name: Option<String>) -> Self {
        self.is_tournament = is_tournament;
        self.tournament_name = if is_tournament { name } else { None };
        self
    }

    /// The WTC split currently stored on this match.
    pub fn wtc(&self) -> WtcScores {
        WtcScores {
            user: self.user_wtc_score,
            opponent: self.opponent_wtc_score,
        }
    }

    /// Army IDs referenced by either side.
    pub fn army_ids(&self) -> [ArmyId; 2] {
        [self.user_army_id, self.opponent_army_id]
    }

    /// Detachment IDs referenced by either side.
    pub fn detachment_ids(&self) -> [DetachmentId; 2] {
        [self.user_detachment_id, self.opponent_detachment_id]
    }
}

/// One side of a game, as submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub army_id: ArmyId,
    pub detachment_id: DetachmentId,
}

impl Side {
    pub fn new(army_id: ArmyId, detachment_id: DetachmentId) -> Self {
        Self {
            army_id,
            detachment_id,
        }
    }
}

/// An `{id, name}` pair for a referenced army or detachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: EntityId,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Read-side view of a match with its army and detachment names joined in.
///
/// This is the shape the filter and statistics code work on. `date` is kept as
/// the string the data source supplied so that a malformed value surfaces as an
/// error during month derivation instead of at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMatch {
    pub id: MatchId,
    pub date: String,
    pub is_tournament: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    pub user_score: i32,
    pub opponent_score: i32,
    pub user_wtc_score: i32,
    pub opponent_wtc_score: i32,
    pub user_army: NamedRef,
    pub user_detachment: NamedRef,
    pub opponent_army: NamedRef,
    pub opponent_detachment: NamedRef,
}
