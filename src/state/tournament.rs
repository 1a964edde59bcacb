use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{
        LeaderboardRowEntity, MatchEntity, MatchLocation, OverrideEntity, PredictionEntity,
        TournamentEntity,
    },
    scoring::{leaderboard::LeaderboardRow, score::ScoreLine, winner::Winner},
};

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// No result recorded yet.
    NotPlayed,
    /// Final scoreline recorded by the admin.
    Final(ScoreLine),
}

impl MatchResult {
    /// Whether the match can contribute to scoring.
    pub fn is_final(&self) -> bool {
        matches!(self, MatchResult::Final(_))
    }

    /// The final scoreline, if any.
    pub fn score(&self) -> Option<ScoreLine> {
        match self {
            MatchResult::NotPlayed => None,
            MatchResult::Final(score) => Some(*score),
        }
    }
}

/// Runtime representation of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Immutable key assigned at creation.
    pub key: Uuid,
    /// First-listed team.
    pub team_a: String,
    /// Second-listed team.
    pub team_b: String,
    /// Kick-off instant.
    pub kickoff: SystemTime,
    /// Recorded result.
    pub result: MatchResult,
    /// Golden matches award double points.
    pub golden: bool,
    /// Winner declared by the admin (e.g. forfeit).
    pub declared_winner: Option<Winner>,
    /// Competition or occasion label.
    pub occasion: Option<String>,
    /// Round label.
    pub round: Option<String>,
    /// When the match was archived.
    pub completed_at: Option<SystemTime>,
}

impl Match {
    /// Display name, e.g. `Hilal vs Nassr`.
    pub fn display_name(&self) -> String {
        format!("{} vs {}", self.team_a, self.team_b)
    }
}

/// A participant's submitted prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Participant name.
    pub user: String,
    /// Key of the predicted match.
    pub match_key: Uuid,
    /// Normalized score text as submitted.
    pub predicted_score: String,
    /// Winner picked by the participant, if any.
    pub declared_winner: Option<Winner>,
    /// Submission instant.
    pub submitted_at: SystemTime,
    /// Ingestion sequence used to break timestamp ties.
    pub sequence: u64,
}

/// Admin correction for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// Participant name.
    pub user: String,
    /// Replacement points.
    pub points: Option<u32>,
    /// Replacement prediction count.
    pub predictions: Option<u32>,
}

/// A catalog entry: a match and the collection it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The match itself.
    pub fixture: Match,
    /// Open or historical collection.
    pub location: MatchLocation,
}

/// Unified, key-deduplicated view over open and historical matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCatalog {
    entries: IndexMap<Uuid, CatalogEntry>,
}

impl MatchCatalog {
    /// Merge both collections; when a key appears twice the open entry wins.
    pub fn from_collections(open: Vec<Match>, history: Vec<Match>) -> Self {
        let mut entries = IndexMap::with_capacity(open.len() + history.len());
        let tagged = open
            .into_iter()
            .map(|m| (m, MatchLocation::Open))
            .chain(history.into_iter().map(|m| (m, MatchLocation::History)));
        for (fixture, location) in tagged {
            entries
                .entry(fixture.key)
                .or_insert(CatalogEntry { fixture, location });
        }
        Self { entries }
    }

    /// Look a match up by key.
    pub fn get(&self, key: &Uuid) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    /// Iterate over all entries, open collection first.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Number of distinct matches.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable snapshot of everything the scoring engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tournament {
    /// Match catalog.
    pub catalog: MatchCatalog,
    /// Prediction log in ingestion order.
    pub predictions: Vec<Prediction>,
    /// Admin overrides.
    pub overrides: Vec<Override>,
}

impl From<MatchEntity> for Match {
    fn from(value: MatchEntity) -> Self {
        Self {
            key: value.key,
            team_a: value.team_a,
            team_b: value.team_b,
            kickoff: value.kickoff,
            result: value
                .final_score
                .map_or(MatchResult::NotPlayed, MatchResult::Final),
            golden: value.golden,
            declared_winner: value.declared_winner,
            occasion: value.occasion,
            round: value.round,
            completed_at: value.completed_at,
        }
    }
}

impl From<Match> for MatchEntity {
    fn from(value: Match) -> Self {
        Self {
            key: value.key,
            team_a: value.team_a,
            team_b: value.team_b,
            kickoff: value.kickoff,
            final_score: value.result.score(),
            golden: value.golden,
            declared_winner: value.declared_winner,
            occasion: value.occasion,
            round: value.round,
            completed_at: value.completed_at,
        }
    }
}

impl From<PredictionEntity> for Prediction {
    fn from(value: PredictionEntity) -> Self {
        Self {
            user: value.user,
            match_key: value.match_key,
            predicted_score: value.prediction,
            declared_winner: value.winner,
            submitted_at: value.submitted_at,
            sequence: value.sequence,
        }
    }
}

impl From<OverrideEntity> for Override {
    fn from(value: OverrideEntity) -> Self {
        Self {
            user: value.user,
            points: value.points,
            predictions: value.predictions,
        }
    }
}

impl From<Override> for OverrideEntity {
    fn from(value: Override) -> Self {
        Self {
            user: value.user,
            points: value.points,
            predictions: value.predictions,
        }
    }
}

impl From<TournamentEntity> for Tournament {
    fn from(value: TournamentEntity) -> Self {
        let open = value.matches.into_iter().map(Into::into).collect();
        let history = value.history.into_iter().map(Into::into).collect();
        Self {
            catalog: MatchCatalog::from_collections(open, history),
            predictions: value.predictions.into_iter().map(Into::into).collect(),
            overrides: value.overrides.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<LeaderboardRow> for LeaderboardRowEntity {
    fn from(value: LeaderboardRow) -> Self {
        Self {
            user: value.user,
            points: value.points,
            predictions: value.predictions,
            exact: value.exact,
            outcome: value.outcome,
        }
    }
}

impl From<LeaderboardRowEntity> for LeaderboardRow {
    fn from(value: LeaderboardRowEntity) -> Self {
        Self {
            user: value.user,
            points: value.points,
            predictions: value.predictions,
            exact: value.exact,
            outcome: value.outcome,
        }
    }
}
