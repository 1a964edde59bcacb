use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashSet, time::SystemTime};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::scoring::{score::ScoreLine, winner::Winner};

/// Version written into freshly created tournament documents.
pub const TOURNAMENT_DOCUMENT_VERSION: u32 = 1;

/// Match as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MatchEntity {
    /// Immutable key assigned at creation.
    pub key: Uuid,
    /// First-listed team.
    pub team_a: String,
    /// Second-listed team.
    pub team_b: String,
    /// Kick-off instant.
    #[schema(value_type = Object)]
    pub kickoff: SystemTime,
    /// Final score, absent while the match has not been played.
    #[serde(default)]
    pub final_score: Option<ScoreLine>,
    /// Golden matches award double points.
    #[serde(default)]
    pub golden: bool,
    /// Winner declared by the admin, taking precedence over the score.
    #[serde(default, deserialize_with = "lenient_winner")]
    pub declared_winner: Option<Winner>,
    /// Competition or occasion label.
    #[serde(default)]
    pub occasion: Option<String>,
    /// Round label (e.g. "Quarter-final").
    #[serde(default)]
    pub round: Option<String>,
    /// Set when the match is moved into the history collection.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub completed_at: Option<SystemTime>,
}

/// Prediction row as persisted; rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PredictionEntity {
    /// Participant name.
    pub user: String,
    /// Key of the predicted match.
    pub match_key: Uuid,
    /// Normalized score text, kept raw so legacy rows survive a reload.
    pub prediction: String,
    /// Winner the participant picked, if any.
    #[serde(default, deserialize_with = "lenient_winner")]
    pub winner: Option<Winner>,
    /// Submission instant.
    #[schema(value_type = Object)]
    pub submitted_at: SystemTime,
    /// Ingestion sequence, strictly increasing across the whole log.
    #[serde(default)]
    pub sequence: u64,
}

/// Prediction waiting for the store to assign its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPredictionEntity {
    /// Participant name.
    pub user: String,
    /// Key of the predicted match.
    pub match_key: Uuid,
    /// Normalized score text.
    pub prediction: String,
    /// Winner the participant picked, if any.
    pub winner: Option<Winner>,
    /// Submission instant.
    pub submitted_at: SystemTime,
}

/// Manual admin correction of a participant's displayed totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct OverrideEntity {
    /// Participant name.
    pub user: String,
    /// Replacement for the computed points.
    #[serde(default)]
    pub points: Option<u32>,
    /// Replacement for the computed prediction count.
    #[serde(default)]
    pub predictions: Option<u32>,
}

/// Row of the persisted leaderboard of record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardRowEntity {
    /// Participant name.
    #[serde(rename = "User")]
    pub user: String,
    /// Points shown, overrides applied.
    #[serde(rename = "Points")]
    pub points: u32,
    /// Scored predictions shown, overrides applied.
    #[serde(rename = "Predictions")]
    pub predictions: u32,
    /// Exact-score hits.
    #[serde(rename = "Exact")]
    pub exact: u32,
    /// Outcome-only hits.
    #[serde(rename = "Outcome")]
    pub outcome: u32,
}

/// Collection a match currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchLocation {
    /// Open for viewing/predicting.
    Open,
    /// Archived into the historical collection.
    History,
}

/// Whole tournament state as one document; also the export/restore format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TournamentEntity {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Sequence number handed to the next ingested prediction.
    #[serde(default)]
    pub next_sequence: u64,
    /// Open matches.
    #[serde(default)]
    pub matches: Vec<MatchEntity>,
    /// Archived matches.
    #[serde(default)]
    pub history: Vec<MatchEntity>,
    /// Append-only prediction log.
    #[serde(default)]
    pub predictions: Vec<PredictionEntity>,
    /// Manual leaderboard corrections keyed by user.
    #[serde(default)]
    pub overrides: Vec<OverrideEntity>,
    /// Season title shown next to the leaderboard.
    #[serde(default)]
    pub season: Option<String>,
}

fn default_version() -> u32 {
    TOURNAMENT_DOCUMENT_VERSION
}

/// Stored winner labels nobody can resolve any more read back as "not
/// declared", so one bad row never blocks loading the document.
fn lenient_winner<'de, D>(deserializer: D) -> Result<Option<Winner>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| Winner::deserialize(value).ok()))
}

impl Default for TournamentEntity {
    fn default() -> Self {
        Self {
            version: TOURNAMENT_DOCUMENT_VERSION,
            next_sequence: 0,
            matches: Vec::new(),
            history: Vec::new(),
            predictions: Vec::new(),
            overrides: Vec::new(),
            season: None,
        }
    }
}

impl TournamentEntity {
    /// Locate a match in either collection; open entries shadow history.
    pub fn find_match(&self, key: Uuid) -> Option<(&MatchEntity, MatchLocation)> {
        self.matches
            .iter()
            .find(|m| m.key == key)
            .map(|m| (m, MatchLocation::Open))
            .or_else(|| {
                self.history
                    .iter()
                    .find(|m| m.key == key)
                    .map(|m| (m, MatchLocation::History))
            })
    }

    /// Replace the match in whichever collection holds it, or add it to the
    /// open collection.
    pub fn upsert_match(&mut self, entity: MatchEntity) {
        if let Some(slot) = self.matches.iter_mut().find(|m| m.key == entity.key) {
            *slot = entity;
        } else if let Some(slot) = self.history.iter_mut().find(|m| m.key == entity.key) {
            *slot = entity;
        } else {
            self.matches.push(entity);
        }
    }

    /// Remove a match from both collections together with its predictions.
    pub fn remove_match(&mut self, key: Uuid) -> bool {
        let before = self.matches.len() + self.history.len();
        self.matches.retain(|m| m.key != key);
        self.history.retain(|m| m.key != key);
        let removed = before != self.matches.len() + self.history.len();
        if removed {
            self.predictions.retain(|p| p.match_key != key);
        }
        removed
    }

    /// Move an open match into history, stamping its completion time.
    pub fn archive_match(&mut self, key: Uuid, completed_at: SystemTime) -> bool {
        let Some(index) = self.matches.iter().position(|m| m.key == key) else {
            return false;
        };
        let mut entity = self.matches.remove(index);
        entity.completed_at = Some(completed_at);
        self.history.retain(|m| m.key != key);
        self.history.push(entity);
        true
    }

    /// Append a prediction, assigning the next ingestion sequence.
    pub fn append_prediction(&mut self, new: NewPredictionEntity) -> PredictionEntity {
        let entity = PredictionEntity {
            user: new.user,
            match_key: new.match_key,
            prediction: new.prediction,
            winner: new.winner,
            submitted_at: new.submitted_at,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.predictions.push(entity.clone());
        entity
    }

    /// Drop every row a user submitted for a match; returns how many were removed.
    pub fn remove_predictions(&mut self, user: &str, match_key: Uuid) -> usize {
        let before = self.predictions.len();
        self.predictions
            .retain(|p| !(p.user == user && p.match_key == match_key));
        before - self.predictions.len()
    }

    /// Insert or replace the override for `entity.user`.
    pub fn upsert_override(&mut self, entity: OverrideEntity) {
        if let Some(slot) = self.overrides.iter_mut().find(|o| o.user == entity.user) {
            *slot = entity;
        } else {
            self.overrides.push(entity);
        }
    }

    /// Remove the override of a user.
    pub fn remove_override(&mut self, user: &str) -> bool {
        let before = self.overrides.len();
        self.overrides.retain(|o| o.user != user);
        before != self.overrides.len()
    }

    /// Set or clear the season title.
    pub fn set_season(&mut self, season: Option<String>) {
        self.season = season;
    }

    /// Make a restored document safe to append to: sequences are unique and
    /// the counter stays ahead of every stored row.
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        if !self.predictions.iter().all(|p| seen.insert(p.sequence)) {
            self.renumber_predictions();
        }
        let floor = self
            .predictions
            .iter()
            .map(|p| p.sequence + 1)
            .max()
            .unwrap_or(0);
        self.next_sequence = self.next_sequence.max(floor);
        self.version = TOURNAMENT_DOCUMENT_VERSION;
        self
    }

    /// Hand out fresh sequences following `(submitted_at, sequence,
    /// prediction, winner)`, so the order no longer depends on row position.
    fn renumber_predictions(&mut self) {
        let mut order: Vec<usize> = (0..self.predictions.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.predictions[a], &self.predictions[b]);
            a.submitted_at
                .cmp(&b.submitted_at)
                .then(a.sequence.cmp(&b.sequence))
                .then_with(|| a.prediction.cmp(&b.prediction))
                .then_with(|| a.winner.cmp(&b.winner))
        });
        for (sequence, index) in (0u64..).zip(order) {
            self.predictions[index].sequence = sequence;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn match_entity(key: Uuid) -> MatchEntity {
        MatchEntity {
            key,
            team_a: "A".into(),
            team_b: "B".into(),
            kickoff: SystemTime::UNIX_EPOCH,
            final_score: None,
            golden: false,
            declared_winner: None,
            occasion: None,
            round: None,
            completed_at: None,
        }
    }

    fn new_prediction(user: &str, key: Uuid) -> NewPredictionEntity {
        NewPredictionEntity {
            user: user.into(),
            match_key: key,
            prediction: "1-0".into(),
            winner: None,
            submitted_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn sequences_increase_across_appends() {
        let mut doc = TournamentEntity::default();
        let key = Uuid::new_v4();
        let first = doc.append_prediction(new_prediction("u1", key));
        let second = doc.append_prediction(new_prediction("u1", key));
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(doc.next_sequence, 2);
    }

    #[test]
    fn removing_a_match_cascades_to_predictions() {
        let mut doc = TournamentEntity::default();
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        doc.upsert_match(match_entity(kept));
        doc.upsert_match(match_entity(dropped));
        doc.append_prediction(new_prediction("u1", kept));
        doc.append_prediction(new_prediction("u1", dropped));

        assert!(doc.remove_match(dropped));
        assert!(!doc.remove_match(dropped));
        assert_eq!(doc.predictions.len(), 1);
        assert_eq!(doc.predictions[0].match_key, kept);
    }

    #[test]
    fn archive_moves_match_to_history() {
        let mut doc = TournamentEntity::default();
        let key = Uuid::new_v4();
        doc.upsert_match(match_entity(key));
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(60);

        assert!(doc.archive_match(key, at));
        assert!(doc.matches.is_empty());
        let (found, location) = doc.find_match(key).unwrap();
        assert_eq!(location, MatchLocation::History);
        assert_eq!(found.completed_at, Some(at));

        // upsert keeps it in history
        let mut edited = found.clone();
        edited.golden = true;
        doc.upsert_match(edited);
        assert!(doc.matches.is_empty());
        assert!(doc.history[0].golden);
    }

    #[test]
    fn normalized_moves_sequence_past_restored_rows() {
        let mut doc = TournamentEntity::default();
        let key = Uuid::new_v4();
        doc.append_prediction(new_prediction("u1", key));
        doc.predictions[0].sequence = 41;
        doc.next_sequence = 3;

        let doc = doc.normalized();
        assert_eq!(doc.next_sequence, 42);
    }

    #[test]
    fn unreadable_winner_and_missing_sequence_keep_the_document() {
        let key = Uuid::new_v4();
        let raw = format!(
            r#"{{
                "predictions": [
                    {{"user": "u1", "match_key": "{key}", "prediction": "2-1",
                      "winner": "team_a", "submitted_at": {{"secs_since_epoch": 10, "nanos_since_epoch": 0}},
                      "sequence": 0}},
                    {{"user": "u2", "match_key": "{key}", "prediction": "1-1",
                      "winner": "Hilal", "submitted_at": {{"secs_since_epoch": 20, "nanos_since_epoch": 0}}}}
                ]
            }}"#
        );

        let doc: TournamentEntity = serde_json::from_str(&raw).unwrap();
        let doc = doc.normalized();
        assert_eq!(doc.predictions.len(), 2);
        assert_eq!(doc.predictions[0].winner, Some(Winner::TeamA));
        assert_eq!(doc.predictions[1].winner, None);
        assert_eq!(doc.predictions[1].prediction, "1-1");
        assert_ne!(doc.predictions[0].sequence, doc.predictions[1].sequence);
        assert_eq!(doc.next_sequence, 2);
    }

    #[test]
    fn duplicate_sequences_renumber_independently_of_row_order() {
        let key = Uuid::new_v4();
        let row = |prediction: &str| PredictionEntity {
            user: "u1".into(),
            match_key: key,
            prediction: prediction.into(),
            winner: None,
            submitted_at: SystemTime::UNIX_EPOCH,
            sequence: 5,
        };
        let latest = |rows: Vec<PredictionEntity>| {
            let doc = TournamentEntity {
                predictions: rows,
                ..TournamentEntity::default()
            }
            .normalized();
            let best = doc
                .predictions
                .iter()
                .max_by_key(|p| p.sequence)
                .map(|p| p.prediction.clone());
            (best, doc.next_sequence)
        };

        let forward = latest(vec![row("2-1"), row("0-0")]);
        let backward = latest(vec![row("0-0"), row("2-1")]);
        assert_eq!(forward, backward);
        assert_eq!(forward, (Some("2-1".to_string()), 2));
    }

    #[test]
    fn unique_sequences_are_left_alone() {
        let mut doc = TournamentEntity::default();
        let key = Uuid::new_v4();
        doc.append_prediction(new_prediction("u1", key));
        doc.append_prediction(new_prediction("u2", key));
        doc.predictions[0].sequence = 7;

        let doc = doc.normalized();
        assert_eq!(doc.predictions[0].sequence, 7);
        assert_eq!(doc.predictions[1].sequence, 1);
        assert_eq!(doc.next_sequence, 8);
    }

    #[test]
    fn overrides_are_keyed_by_user() {
        let mut doc = TournamentEntity::default();
        doc.upsert_override(OverrideEntity {
            user: "u1".into(),
            points: Some(10),
            predictions: None,
        });
        doc.upsert_override(OverrideEntity {
            user: "u1".into(),
            points: Some(99),
            predictions: Some(4),
        });
        assert_eq!(doc.overrides.len(), 1);
        assert_eq!(doc.overrides[0].points, Some(99));
        assert!(doc.remove_override("u1"));
        assert!(!doc.remove_override("u1"));
    }
}
