//! Rubric score aggregation and display classification.
//!
//! [`compute_overall_score`] is the single source of truth for reducing an
//! [`AssessmentResult`] to one number. [`score_label`] classifies individual
//! criterion scores, [`ScoreBand`] classifies (possibly fractional) overall
//! scores; the two have independent thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EmptyRubricError;
use crate::model::{AssessmentResult, CriterionGroup};

/// Overall scores at or above this value fall in [`ScoreBand::High`].
pub const HIGH_BAND_FLOOR: f64 = 5.0;
/// Overall scores at or above this value (and below the high floor) fall in
/// [`ScoreBand::Medium`].
pub const MEDIUM_BAND_FLOOR: f64 = 4.0;

/// Compute the unrounded mean of every criterion score in the result.
pub fn compute_overall_score(result: &AssessmentResult) -> Result<f64, EmptyRubricError> {
    mean_of_groups(result.groups().into_iter().map(|(_, group)| group))
}

/// Mean of all criterion scores across the given groups.
///
/// Fails when the groups contain no scores at all instead of defaulting to
/// zero.
pub fn mean_of_groups<'a, I>(groups: I) -> Result<f64, EmptyRubricError>
where
    I: IntoIterator<Item = &'a CriterionGroup>,
{
    let (sum, count) = groups
        .into_iter()
        .flat_map(|group| group.scores())
        .fold((0u64, 0u64), |(sum, count), score| {
            (sum + u64::from(score), count + 1)
        });

    if count == 0 {
        return Err(EmptyRubricError);
    }
    Ok(sum as f64 / count as f64)
}

/// Round a score to one decimal digit for display.
pub fn round_one_decimal(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Verbal label of an individual criterion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLabel {
    Excellent,
    VeryGood,
    Good,
    Average,
    Weak,
    VeryWeak,
}

impl ScoreLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLabel::Excellent => "excellent",
            ScoreLabel::VeryGood => "very good",
            ScoreLabel::Good => "good",
            ScoreLabel::Average => "average",
            ScoreLabel::Weak => "weak",
            ScoreLabel::VeryWeak => "very weak",
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label a criterion score.
///
/// Only the exact integers 6 through 2 get their own label; anything else,
/// fractional values included, is [`ScoreLabel::VeryWeak`].
pub fn score_label(score: impl Into<f64>) -> ScoreLabel {
    let score = score.into();
    if score == 6.0 {
        ScoreLabel::Excellent
    } else if score == 5.0 {
        ScoreLabel::VeryGood
    } else if score == 4.0 {
        ScoreLabel::Good
    } else if score == 3.0 {
        ScoreLabel::Average
    } else if score == 2.0 {
        ScoreLabel::Weak
    } else {
        ScoreLabel::VeryWeak
    }
}

/// Color band of an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= HIGH_BAND_FLOOR {
            ScoreBand::High
        } else if score >= MEDIUM_BAND_FLOOR {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::High => "high",
            ScoreBand::Medium => "medium",
            ScoreBand::Low => "low",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand for [`ScoreBand::for_score`].
pub fn score_color_band(score: f64) -> ScoreBand {
    ScoreBand::for_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RubricScore;
    use proptest::prelude::*;

    fn group(values: &[i64]) -> CriterionGroup {
        CriterionGroup::new(
            "",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| RubricScore::new(format!("c{i}"), *v, "").unwrap())
                .collect(),
        )
    }

    fn result(content: &[i64], language: &[i64]) -> AssessmentResult {
        AssessmentResult::new("", group(content), group(language), vec![]).unwrap()
    }

    #[test]
    fn overall_score_of_sample_assessment() {
        let r = result(&[6, 5, 6, 5], &[6, 5, 5]);
        let score = compute_overall_score(&r).unwrap();
        assert_eq!(score, 38.0 / 7.0);
        assert!((score - 5.428_571).abs() < 1e-6);
    }

    #[test]
    fn overall_score_is_not_rounded() {
        let r = result(&[6, 5], &[5]);
        assert_eq!(compute_overall_score(&r).unwrap(), 16.0 / 3.0);
    }

    #[test]
    fn overall_score_is_idempotent() {
        let r = result(&[4, 3, 6], &[2, 5]);
        let first = compute_overall_score(&r).unwrap();
        let second = compute_overall_score(&r).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn empty_rubric_is_an_error() {
        let empty = group(&[]);
        assert_eq!(mean_of_groups([&empty, &empty]), Err(EmptyRubricError));
        assert_eq!(mean_of_groups(std::iter::empty()), Err(EmptyRubricError));
    }

    #[test]
    fn one_empty_group_is_fine_for_the_aggregator() {
        let empty = group(&[]);
        let full = group(&[4, 6]);
        assert_eq!(mean_of_groups([&empty, &full]).unwrap(), 5.0);
    }

    #[test]
    fn labels_for_exact_scores() {
        assert_eq!(score_label(6u8), ScoreLabel::Excellent);
        assert_eq!(score_label(5u8), ScoreLabel::VeryGood);
        assert_eq!(score_label(4u8), ScoreLabel::Good);
        assert_eq!(score_label(3u8), ScoreLabel::Average);
        assert_eq!(score_label(2u8), ScoreLabel::Weak);
        assert_eq!(score_label(1u8), ScoreLabel::VeryWeak);
        assert_eq!(score_label(0u8), ScoreLabel::VeryWeak);
        assert_eq!(score_label(6u8).to_string(), "excellent");
        assert_eq!(score_label(1u8).to_string(), "very weak");
    }

    #[test]
    fn fractional_scores_collapse_to_very_weak() {
        assert_eq!(score_label(1.5), ScoreLabel::VeryWeak);
        assert_eq!(score_label(5.5), ScoreLabel::VeryWeak);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(ScoreBand::for_score(5.0), ScoreBand::High);
        assert_eq!(ScoreBand::for_score(6.0), ScoreBand::High);
        assert_eq!(ScoreBand::for_score(4.999), ScoreBand::Medium);
        assert_eq!(ScoreBand::for_score(4.0), ScoreBand::Medium);
        assert_eq!(ScoreBand::for_score(3.999), ScoreBand::Low);
        assert_eq!(score_color_band(0.0).to_string(), "low");
    }

    #[test]
    fn round_for_display() {
        assert_eq!(round_one_decimal(38.0 / 7.0), 5.4);
        assert_eq!(round_one_decimal(4.46), 4.5);
        assert_eq!(round_one_decimal(0.0), 0.0);
    }

    proptest! {
        #[test]
        fn matches_independent_mean(
            content in prop::collection::vec(0i64..=6, 1..8),
            language in prop::collection::vec(0i64..=6, 1..8),
        ) {
            let all: Vec<i64> = content.iter().chain(language.iter()).copied().collect();
            let expected = all.iter().sum::<i64>() as f64 / all.len() as f64;
            let score = compute_overall_score(&result(&content, &language)).unwrap();
            prop_assert_eq!(score, expected);
        }

        #[test]
        fn commutes_under_reordering(
            content in prop::collection::vec(0i64..=6, 1..8),
            language in prop::collection::vec(0i64..=6, 1..8),
        ) {
            let forward = compute_overall_score(&result(&content, &language)).unwrap();
            let swapped = compute_overall_score(&result(&language, &content)).unwrap();
            let mut reversed_content = content.clone();
            reversed_content.reverse();
            let reversed = compute_overall_score(&result(&reversed_content, &language)).unwrap();
            prop_assert_eq!(forward, swapped);
            prop_assert_eq!(forward, reversed);
        }
    }
}
