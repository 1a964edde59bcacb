//! Winner resolution for finished matches and for individual predictions.
//!
//! Both sides follow the same policy: an explicitly declared winner takes
//! precedence, otherwise the winner is derived from a scoreline.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::score::ScoreLine;

/// Labels accepted as "draw" regardless of case.
const DRAW_LABELS: [&str; 2] = ["draw", "تعادل"];

/// Side of a match that won, or a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// First-listed team won.
    TeamA,
    /// Second-listed team won.
    TeamB,
    /// Neither team won.
    Draw,
}

impl Winner {
    /// Derive the winner from a scoreline: equal is a draw, otherwise the
    /// side with more goals.
    pub fn from_score(score: ScoreLine) -> Self {
        match score.team_a.cmp(&score.team_b) {
            std::cmp::Ordering::Greater => Winner::TeamA,
            std::cmp::Ordering::Less => Winner::TeamB,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }
}

/// A winner label that names neither team nor a draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{label}` is neither one of the teams of this match nor a draw")]
pub struct UnknownWinnerLabel {
    /// The rejected label.
    pub label: String,
}

/// Authoritative winner of a finished match.
pub fn real_winner(declared: Option<Winner>, final_score: ScoreLine) -> Winner {
    declared.unwrap_or_else(|| Winner::from_score(final_score))
}

/// Winner a participant picked with their prediction.
pub fn picked_winner(declared: Option<Winner>, predicted: ScoreLine) -> Winner {
    declared.unwrap_or_else(|| Winner::from_score(predicted))
}

/// Resolve free text against the teams of a match.
///
/// Empty text means "not declared". Team names and the draw labels are
/// compared case-insensitively; the canonical tokens `team_a`, `team_b` and
/// `draw` are accepted too.
pub fn parse_winner_label(
    label: &str,
    team_a: &str,
    team_b: &str,
) -> Result<Option<Winner>, UnknownWinnerLabel> {
    let label = label.trim();
    if label.is_empty() {
        return Ok(None);
    }

    let folded = label.to_lowercase();
    if DRAW_LABELS.iter().any(|draw| folded == *draw) {
        return Ok(Some(Winner::Draw));
    }
    if folded == "team_a" || folded == team_a.trim().to_lowercase() {
        return Ok(Some(Winner::TeamA));
    }
    if folded == "team_b" || folded == team_b.trim().to_lowercase() {
        return Ok(Some(Winner::TeamB));
    }

    Err(UnknownWinnerLabel {
        label: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(a: u8, b: u8) -> ScoreLine {
        ScoreLine {
            team_a: a,
            team_b: b,
        }
    }

    #[test]
    fn derives_winner_from_score() {
        assert_eq!(Winner::from_score(line(2, 1)), Winner::TeamA);
        assert_eq!(Winner::from_score(line(0, 3)), Winner::TeamB);
        assert_eq!(Winner::from_score(line(1, 1)), Winner::Draw);
    }

    #[test]
    fn declared_winner_overrides_scoreline() {
        // forfeit recorded as 0-0 but awarded to team B
        assert_eq!(real_winner(Some(Winner::TeamB), line(0, 0)), Winner::TeamB);
        assert_eq!(real_winner(None, line(0, 0)), Winner::Draw);
        assert_eq!(picked_winner(Some(Winner::TeamA), line(1, 1)), Winner::TeamA);
        assert_eq!(picked_winner(None, line(1, 2)), Winner::TeamB);
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!(
            parse_winner_label("DRAW", "Hilal", "Nassr"),
            Ok(Some(Winner::Draw))
        );
        assert_eq!(
            parse_winner_label("تعادل", "Hilal", "Nassr"),
            Ok(Some(Winner::Draw))
        );
        assert_eq!(
            parse_winner_label(" hilal ", "Hilal", "Nassr"),
            Ok(Some(Winner::TeamA))
        );
        assert_eq!(
            parse_winner_label("team_b", "Hilal", "Nassr"),
            Ok(Some(Winner::TeamB))
        );
        assert_eq!(parse_winner_label("  ", "Hilal", "Nassr"), Ok(None));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = parse_winner_label("Ittihad", "Hilal", "Nassr").unwrap_err();
        assert_eq!(err.label, "Ittihad");
    }
}
