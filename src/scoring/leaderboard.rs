//! Override reconciliation and the ranked leaderboard of record.

use std::{cmp::Ordering, collections::BTreeMap};

use tracing::debug;

use super::aggregate::{RecomputeReport, UserTotals};
use crate::state::tournament::Override;

/// Medals shown next to the first three ranks.
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// One row of the materialized leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// Participant name.
    pub user: String,
    /// Points shown, possibly overridden.
    pub points: u32,
    /// Prediction count shown, possibly overridden.
    pub predictions: u32,
    /// Exact hits, always computed.
    pub exact: u32,
    /// Outcome-only hits, always computed.
    pub outcome: u32,
}

impl From<UserTotals> for LeaderboardRow {
    fn from(value: UserTotals) -> Self {
        Self {
            user: value.user,
            points: value.points,
            predictions: value.predictions,
            exact: value.exact,
            outcome: value.outcome,
        }
    }
}

/// Row decorated for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRow<'a> {
    /// 1-based position.
    pub rank: usize,
    /// Medal for the podium.
    pub medal: Option<&'static str>,
    /// Underlying row.
    pub row: &'a LeaderboardRow,
}

/// Sorted leaderboard; the only thing readers ever see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    /// Sort `rows` into leaderboard order.
    pub fn from_rows(mut rows: Vec<LeaderboardRow>) -> Self {
        rows.sort_by(leaderboard_order);
        Self { rows }
    }

    /// Rows in rank order.
    pub fn rows(&self) -> &[LeaderboardRow] {
        &self.rows
    }

    /// Rows with rank and medal, without changing any value.
    pub fn ranked(&self) -> impl Iterator<Item = RankedRow<'_>> {
        self.rows.iter().enumerate().map(|(index, row)| RankedRow {
            rank: index + 1,
            medal: MEDALS.get(index).copied(),
            row,
        })
    }

    /// Row of a single user.
    pub fn find(&self, user: &str) -> Option<&LeaderboardRow> {
        self.rows.iter().find(|row| row.user == user)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nobody is ranked.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Points desc, predictions asc, exact desc, then user name asc.
pub fn leaderboard_order(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.predictions.cmp(&b.predictions))
        .then_with(|| b.exact.cmp(&a.exact))
        .then_with(|| a.user.cmp(&b.user))
}

/// Apply admin overrides on top of computed totals.
///
/// Present override fields replace the computed points and prediction count;
/// exact and outcome counts are never touched. Overrides for users without
/// computed totals are dropped unless `include_override_only_users` is set, in
/// which case those users get a row with zero hit counts.
pub fn merge_overrides(
    totals: BTreeMap<String, UserTotals>,
    overrides: &[Override],
    include_override_only_users: bool,
    report: &mut RecomputeReport,
) -> Vec<LeaderboardRow> {
    let mut rows: BTreeMap<String, LeaderboardRow> = totals
        .into_iter()
        .map(|(user, totals)| (user, totals.into()))
        .collect();

    for correction in overrides {
        match rows.get_mut(&correction.user) {
            Some(row) => {
                apply_override(row, correction);
                report.overrides_applied += 1;
            }
            None if include_override_only_users => {
                let mut row = LeaderboardRow {
                    user: correction.user.clone(),
                    ..LeaderboardRow::default()
                };
                apply_override(&mut row, correction);
                rows.insert(correction.user.clone(), row);
                report.overrides_applied += 1;
            }
            None => {
                debug!(user = %correction.user, "dropping override for user without scored predictions");
                report.overrides_dropped += 1;
            }
        }
    }

    rows.into_values().collect()
}

fn apply_override(row: &mut LeaderboardRow, correction: &Override) {
    if let Some(points) = correction.points {
        row.points = points;
    }
    if let Some(predictions) = correction.predictions {
        row.predictions = predictions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: &str, points: u32, predictions: u32, exact: u32) -> LeaderboardRow {
        LeaderboardRow {
            user: user.into(),
            points,
            predictions,
            exact,
            outcome: 0,
        }
    }

    fn totals(rows: &[(&str, u32, u32, u32, u32)]) -> BTreeMap<String, UserTotals> {
        rows.iter()
            .map(|(user, points, predictions, exact, outcome)| {
                (
                    user.to_string(),
                    UserTotals {
                        user: user.to_string(),
                        points: *points,
                        predictions: *predictions,
                        exact: *exact,
                        outcome: *outcome,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn sorts_by_points_then_fewer_predictions_then_exact() {
        let board = Leaderboard::from_rows(vec![
            row("carol", 4, 4, 0),
            row("alice", 4, 2, 1),
            row("bob", 6, 9, 0),
            row("dave", 4, 2, 0),
        ]);
        let users: Vec<_> = board.rows().iter().map(|r| r.user.as_str()).collect();
        assert_eq!(users, ["bob", "alice", "dave", "carol"]);
    }

    #[test]
    fn full_ties_are_ordered_by_name() {
        let board = Leaderboard::from_rows(vec![row("zed", 3, 1, 1), row("amy", 3, 1, 1)]);
        assert_eq!(board.rows()[0].user, "amy");
    }

    #[test]
    fn ranked_rows_carry_medals_for_the_podium() {
        let board = Leaderboard::from_rows(vec![
            row("a", 9, 1, 0),
            row("b", 8, 1, 0),
            row("c", 7, 1, 0),
            row("d", 6, 1, 0),
        ]);
        let ranked: Vec<_> = board.ranked().collect();
        assert_eq!(ranked[0].medal, Some("🥇"));
        assert_eq!(ranked[2].medal, Some("🥉"));
        assert_eq!(ranked[3].medal, None);
        assert_eq!(ranked[3].rank, 4);
        assert_eq!(ranked[3].row.points, 6);
    }

    #[test]
    fn override_replaces_only_present_fields() {
        let mut report = RecomputeReport::default();
        let rows = merge_overrides(
            totals(&[("u1", 3, 2, 1, 0), ("u2", 4, 3, 0, 4)]),
            &[Override {
                user: "u1".into(),
                points: Some(10),
                predictions: None,
            }],
            false,
            &mut report,
        );
        let board = Leaderboard::from_rows(rows);
        let u1 = board.find("u1").unwrap();
        assert_eq!((u1.points, u1.predictions, u1.exact), (10, 2, 1));
        assert_eq!(board.rows()[0].user, "u1");
        assert_eq!(report.overrides_applied, 1);
    }

    #[test]
    fn override_only_users_follow_policy() {
        let correction = [Override {
            user: "ghost".into(),
            points: Some(5),
            predictions: None,
        }];

        let mut report = RecomputeReport::default();
        let rows = merge_overrides(totals(&[]), &correction, false, &mut report);
        assert!(rows.is_empty());
        assert_eq!(report.overrides_dropped, 1);

        let mut report = RecomputeReport::default();
        let rows = merge_overrides(totals(&[]), &correction, true, &mut report);
        assert_eq!(rows, vec![row("ghost", 5, 0, 0)]);
        assert_eq!(report.overrides_applied, 1);
    }
}
