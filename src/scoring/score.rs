//! Parsing of free-text scorelines such as `2-1`, `٢–١` or ` 3 - 0 `.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Highest number of goals a single side may be credited with.
pub const MAX_GOALS: u8 = 20;

/// Dash glyphs that users paste instead of an ASCII hyphen.
const DASH_VARIANTS: [char; 8] = ['–', '—', '−', 'ـ', '‒', '﹘', '﹣', '－'];

/// Errors returned when a scoreline cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreParseError {
    /// The text does not look like `<goals>-<goals>`.
    #[error("score `{input}` must be written as two numbers separated by a dash, e.g. `2-1`")]
    Format {
        /// Raw input as received.
        input: String,
    },
    /// One side is outside `0..=MAX_GOALS`.
    #[error("score `{input}` is out of range: each side must be between 0 and {max}")]
    Range {
        /// Raw input as received.
        input: String,
        /// Inclusive upper bound that was exceeded.
        max: u8,
    },
}

/// A validated pair of goals, team A first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ScoreLine {
    /// Goals scored by the first-listed team.
    pub team_a: u8,
    /// Goals scored by the second-listed team.
    pub team_b: u8,
}

impl ScoreLine {
    /// Whether both sides scored the same number of goals.
    pub fn is_draw(&self) -> bool {
        self.team_a == self.team_b
    }

    /// The same scoreline read from team B's point of view.
    pub fn mirrored(&self) -> Self {
        Self {
            team_a: self.team_b,
            team_b: self.team_a,
        }
    }
}

impl fmt::Display for ScoreLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.team_a, self.team_b)
    }
}

impl FromStr for ScoreLine {
    type Err = ScoreParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_score(s)
    }
}

/// Map locale digit variants and dash glyphs to their ASCII form and trim.
///
/// Arabic-Indic (`٠`..`٩`) and Eastern Arabic-Indic (`۰`..`۹`) digits become
/// `0`..`9`; every entry of the dash table becomes `-`.
pub fn normalize_score_text(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => ascii_digit(c as u32 - 0x0660),
            '\u{06F0}'..='\u{06F9}' => ascii_digit(c as u32 - 0x06F0),
            c if DASH_VARIANTS.contains(&c) => '-',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse free text into a [`ScoreLine`].
///
/// Each side must be one or two digits; whitespace around the dash is
/// tolerated.
pub fn parse_score(raw: &str) -> Result<ScoreLine, ScoreParseError> {
    let normalized = normalize_score_text(raw);
    let format_error = || ScoreParseError::Format {
        input: raw.to_string(),
    };

    let (left, right) = normalized.split_once('-').ok_or_else(format_error)?;
    let team_a = parse_side(left.trim()).ok_or_else(format_error)?;
    let team_b = parse_side(right.trim()).ok_or_else(format_error)?;

    if team_a > MAX_GOALS || team_b > MAX_GOALS {
        return Err(ScoreParseError::Range {
            input: raw.to_string(),
            max: MAX_GOALS,
        });
    }

    Ok(ScoreLine { team_a, team_b })
}

fn parse_side(side: &str) -> Option<u8> {
    if side.is_empty() || side.len() > 2 || !side.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    side.parse().ok()
}

fn ascii_digit(offset: u32) -> char {
    char::from_digit(offset, 10).unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_ascii() {
        assert_eq!(parse_score("2-1"), Ok(ScoreLine { team_a: 2, team_b: 1 }));
        assert_eq!(parse_score(" 0 - 0 "), Ok(ScoreLine { team_a: 0, team_b: 0 }));
    }

    #[test]
    fn normalizes_locale_digits_and_dashes() {
        assert_eq!(normalize_score_text(" ٢–١ "), "2-1");
        assert_eq!(parse_score("۳—۰"), Ok(ScoreLine { team_a: 3, team_b: 0 }));
        assert_eq!(parse_score("1－1"), Ok(ScoreLine { team_a: 1, team_b: 1 }));
    }

    #[test]
    fn rejects_malformed_text() {
        for input in ["", "2", "2:1", "a-b", "-1-2", "2-1-0", "100-1", "2 1"] {
            assert!(
                matches!(parse_score(input), Err(ScoreParseError::Format { .. })),
                "expected format error for {input:?}"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_sides() {
        assert_eq!(
            parse_score("21-0"),
            Err(ScoreParseError::Range {
                input: "21-0".into(),
                max: MAX_GOALS
            })
        );
        assert!(parse_score("20-20").is_ok());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let line: ScoreLine = "4-2".parse().unwrap();
        assert_eq!(line.to_string(), "4-2");
        assert_eq!(line.mirrored().to_string(), "2-4");
        assert!(!line.is_draw());
    }
}
