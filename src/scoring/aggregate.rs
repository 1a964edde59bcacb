//! Deduplication of the prediction log and per-user aggregation.

use std::{collections::BTreeMap, time::SystemTime};

use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    points::{ExactComparison, ScoreOutcome, evaluate_text},
    winner::Winner,
};
use crate::state::tournament::{MatchCatalog, Prediction};

/// Counters describing what a recompute pass did with the prediction log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecomputeReport {
    /// Rows in the prediction log.
    pub submitted: usize,
    /// Rows shadowed by a later submission for the same user and match.
    pub superseded: usize,
    /// Authoritative rows whose match no longer exists.
    pub orphaned: usize,
    /// Authoritative rows whose match has no final result.
    pub unfinished: usize,
    /// Authoritative rows whose score text does not parse.
    pub malformed: usize,
    /// Authoritative rows that were scored.
    pub scored: usize,
    /// Users on the published leaderboard.
    pub users: usize,
    /// Overrides applied to a leaderboard row.
    pub overrides_applied: usize,
    /// Overrides ignored because the user has no row.
    pub overrides_dropped: usize,
}

/// Computed totals of one participant, before overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTotals {
    /// Participant name.
    pub user: String,
    /// Sum of awarded points.
    pub points: u32,
    /// Number of scored predictions.
    pub predictions: u32,
    /// Number of exact hits.
    pub exact: u32,
    /// Number of outcome-only hits.
    pub outcome: u32,
}

/// Result of the aggregation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Totals keyed by user.
    pub totals: BTreeMap<String, UserTotals>,
    /// Counters filled so far.
    pub report: RecomputeReport,
}

/// Keep only the latest row per `(user, match)`.
///
/// Latest means greatest `(submitted_at, sequence)`, so two rows stamped with
/// the same instant are ordered by ingestion. Rows that still tie are ordered
/// by their content, never by their position in the log.
pub fn authoritative_predictions<'a, I>(predictions: I) -> Vec<&'a Prediction>
where
    I: IntoIterator<Item = &'a Prediction>,
{
    let mut latest: BTreeMap<(&'a str, Uuid), &'a Prediction> = BTreeMap::new();
    for prediction in predictions {
        latest
            .entry((prediction.user.as_str(), prediction.match_key))
            .and_modify(|current| {
                if order_key(prediction) > order_key(current) {
                    *current = prediction;
                }
            })
            .or_insert(prediction);
    }
    latest.into_values().collect()
}

fn order_key(prediction: &Prediction) -> (SystemTime, u64, &str, Option<Winner>) {
    (
        prediction.submitted_at,
        prediction.sequence,
        prediction.predicted_score.as_str(),
        prediction.declared_winner,
    )
}

/// Score every authoritative prediction and sum the results per user.
///
/// Orphaned, unfinished and malformed rows contribute nothing and are not
/// counted as predictions; users left without a scored prediction are absent.
pub fn aggregate(
    predictions: &[Prediction],
    catalog: &MatchCatalog,
    comparison: ExactComparison,
) -> Aggregation {
    let authoritative = authoritative_predictions(predictions);
    let mut report = RecomputeReport {
        submitted: predictions.len(),
        superseded: predictions.len() - authoritative.len(),
        ..RecomputeReport::default()
    };
    let mut totals: BTreeMap<String, UserTotals> = BTreeMap::new();

    for prediction in authoritative {
        let Some(entry) = catalog.get(&prediction.match_key) else {
            debug!(
                user = %prediction.user,
                match_key = %prediction.match_key,
                "skipping prediction for unknown match"
            );
            report.orphaned += 1;
            continue;
        };
        let fixture = &entry.fixture;

        let outcome = evaluate_text(
            &prediction.predicted_score,
            prediction.declared_winner,
            fixture,
            comparison,
        );
        match &outcome {
            ScoreOutcome::NotFinal => {
                report.unfinished += 1;
                continue;
            }
            ScoreOutcome::Malformed(err) => {
                debug!(
                    user = %prediction.user,
                    match_key = %prediction.match_key,
                    error = %err,
                    "skipping malformed prediction"
                );
                report.malformed += 1;
                continue;
            }
            ScoreOutcome::Exact | ScoreOutcome::Outcome | ScoreOutcome::Miss => {}
        }

        let award = outcome.award(fixture.golden);
        let row = totals
            .entry(prediction.user.clone())
            .or_insert_with(|| UserTotals {
                user: prediction.user.clone(),
                ..UserTotals::default()
            });
        row.points += award.points;
        row.predictions += 1;
        row.exact += award.exact;
        row.outcome += award.outcome;
        report.scored += 1;
    }

    Aggregation { totals, report }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        scoring::score::ScoreLine,
        state::tournament::{Match, MatchResult},
    };

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn fixture(result: Option<(u8, u8)>, golden: bool) -> Match {
        Match {
            key: Uuid::new_v4(),
            team_a: "A".into(),
            team_b: "B".into(),
            kickoff: at(0),
            result: result.map_or(MatchResult::NotPlayed, |(a, b)| {
                MatchResult::Final(ScoreLine {
                    team_a: a,
                    team_b: b,
                })
            }),
            golden,
            declared_winner: None,
            occasion: None,
            round: None,
            completed_at: None,
        }
    }

    fn prediction(user: &str, key: Uuid, score: &str, secs: u64, sequence: u64) -> Prediction {
        Prediction {
            user: user.into(),
            match_key: key,
            predicted_score: score.into(),
            declared_winner: None,
            submitted_at: at(secs),
            sequence,
        }
    }

    #[test]
    fn full_ties_do_not_depend_on_log_order() {
        let key = Uuid::new_v4();
        let forward = [
            prediction("u1", key, "2-1", 10, 5),
            prediction("u1", key, "0-0", 10, 5),
        ];
        let backward = [forward[1].clone(), forward[0].clone()];

        let pick = |log: &[Prediction]| authoritative_predictions(log)[0].predicted_score.clone();
        assert_eq!(pick(&forward), pick(&backward));
        assert_eq!(pick(&forward), "2-1");
    }

    #[test]
    fn latest_submission_wins() {
        let m = fixture(Some((2, 1)), false);
        let key = m.key;
        let catalog = MatchCatalog::from_collections(vec![m], vec![]);
        let log = vec![
            prediction("u1", key, "0-0", 10, 0),
            prediction("u1", key, "2-1", 20, 1),
        ];

        let aggregation = aggregate(&log, &catalog, ExactComparison::Directional);
        let row = &aggregation.totals["u1"];
        assert_eq!((row.points, row.predictions, row.exact), (3, 1, 1));
        assert_eq!(aggregation.report.superseded, 1);
        assert_eq!(aggregation.report.scored, 1);
    }

    #[test]
    fn equal_timestamps_fall_back_to_sequence() {
        let key = Uuid::new_v4();
        let log = vec![
            prediction("u1", key, "2-1", 10, 7),
            prediction("u1", key, "1-1", 10, 3),
        ];
        let kept = authoritative_predictions(&log);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].predicted_score, "2-1");
    }

    #[test]
    fn deleting_latest_promotes_previous_row() {
        let m = fixture(Some((2, 1)), false);
        let key = m.key;
        let catalog = MatchCatalog::from_collections(vec![m], vec![]);
        let mut log = vec![
            prediction("u1", key, "3-0", 10, 0),
            prediction("u1", key, "2-1", 20, 1),
        ];
        log.pop();

        let aggregation = aggregate(&log, &catalog, ExactComparison::Directional);
        let row = &aggregation.totals["u1"];
        assert_eq!((row.points, row.outcome), (1, 1));
    }

    #[test]
    fn skips_orphaned_unfinished_and_malformed_rows() {
        let done = fixture(Some((1, 0)), false);
        let pending = fixture(None, false);
        let (done_key, pending_key) = (done.key, pending.key);
        let catalog = MatchCatalog::from_collections(vec![done, pending], vec![]);
        let log = vec![
            prediction("u1", done_key, "1-0", 1, 0),
            prediction("u1", pending_key, "1-0", 1, 1),
            prediction("u1", Uuid::new_v4(), "1-0", 1, 2),
            prediction("u2", done_key, "one-nil", 1, 3),
        ];

        let aggregation = aggregate(&log, &catalog, ExactComparison::Directional);
        assert_eq!(aggregation.totals.len(), 1);
        assert_eq!(aggregation.totals["u1"].predictions, 1);
        let report = aggregation.report;
        assert_eq!(report.submitted, 4);
        assert_eq!(report.orphaned, 1);
        assert_eq!(report.unfinished, 1);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.scored, 1);
    }

    #[test]
    fn misses_still_count_as_predictions() {
        let m = fixture(Some((2, 1)), true);
        let key = m.key;
        let catalog = MatchCatalog::from_collections(vec![m], vec![]);
        let mut row = prediction("u1", key, "1-1", 1, 0);
        row.declared_winner = Some(Winner::Draw);

        let aggregation = aggregate(&[row], &catalog, ExactComparison::Directional);
        let totals = &aggregation.totals["u1"];
        assert_eq!((totals.points, totals.predictions), (0, 1));
    }

    #[test]
    fn history_matches_are_scored_too() {
        let archived = fixture(Some((0, 2)), false);
        let key = archived.key;
        let catalog = MatchCatalog::from_collections(vec![], vec![archived]);
        let log = vec![prediction("u1", key, "0-1", 1, 0)];

        let aggregation = aggregate(&log, &catalog, ExactComparison::Directional);
        assert_eq!(aggregation.totals["u1"].outcome, 1);
    }
}
