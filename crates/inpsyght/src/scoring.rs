//! Facet and factor averages.
//!
//! Reverse-scored questions contribute `6 - value`. Means are rounded to two
//! decimals; facets and factors without answers are left out.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Answer, Form, LikertValue};

/// How facet results combine into a factor mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Mean of facet means; every facet counts the same.
    #[default]
    Facet,
    /// Mean over every answer in the factor.
    Answer,
}

impl std::fmt::Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Facet => write!(f, "facet"),
            Self::Answer => write!(f, "answer"),
        }
    }
}

/// An answer with the value that enters the averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// The answer as recorded.
    pub answer: Answer,
    /// Whether the question is reverse-scored.
    pub reverse: bool,
    /// Value used for averaging.
    pub effective: LikertValue,
}

/// Result for one facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetScore {
    /// Facet id.
    pub id: String,
    /// Facet name.
    pub name: String,
    /// Rounded mean of effective values.
    pub mean: f64,
    /// Answers in question order.
    pub answers: Vec<ScoredAnswer>,
}

/// Result for one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// Factor id.
    pub id: String,
    /// Factor name.
    pub name: String,
    /// Rounded factor mean.
    pub mean: f64,
    /// Facets that had at least one answer.
    pub facets: Vec<FacetScore>,
}

/// One axis of the radar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarPoint {
    /// Axis label (factor name).
    pub label: String,
    /// Factor mean.
    pub value: f64,
    /// Mean as a percentage of the scale maximum.
    pub percent: f64,
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Aggregate cached answers against the form tree.
///
/// Answers are matched by question id; answers for questions that are no
/// longer in the form are skipped.
#[must_use]
pub fn score(form: &Form, answers: &[Answer], weighting: Weighting) -> Vec<FactorScore> {
    let by_question: HashMap<&str, &Answer> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut matched = 0_usize;
    let mut factors = Vec::new();

    for factor in &form.factors {
        let mut facets = Vec::new();
        let mut factor_values = Vec::new();

        for facet in &factor.facets {
            let scored: Vec<ScoredAnswer> = facet
                .questions
                .iter()
                .filter_map(|question| {
                    by_question.get(question.id.as_str()).map(|answer| {
                        let effective = if question.reverse {
                            answer.value.reversed()
                        } else {
                            answer.value
                        };
                        ScoredAnswer {
                            answer: (*answer).clone(),
                            reverse: question.reverse,
                            effective,
                        }
                    })
                })
                .collect();

            let values: Vec<f64> = scored
                .iter()
                .map(|s| f64::from(s.effective.get()))
                .collect();
            let Some(facet_mean) = mean(values.iter().copied()) else {
                continue;
            };

            matched += scored.len();
            factor_values.extend(values);
            facets.push(FacetScore {
                id: facet.id.clone(),
                name: facet.name.clone(),
                mean: round2(facet_mean),
                answers: scored,
            });
        }

        let factor_mean = match weighting {
            Weighting::Facet => mean(facets.iter().map(|f| f.mean)),
            Weighting::Answer => mean(factor_values),
        };
        if let Some(factor_mean) = factor_mean {
            factors.push(FactorScore {
                id: factor.id.clone(),
                name: factor.name.clone(),
                mean: round2(factor_mean),
                facets,
            });
        }
    }

    if matched < answers.len() {
        debug!(
            ignored = answers.len() - matched,
            "answers without a matching question were ignored"
        );
    }
    factors
}

/// Radar chart axes for factor scores, as percentages of the top of the
/// answer scale.
#[must_use]
pub fn radar_points(factors: &[FactorScore]) -> Vec<RadarPoint> {
    let max = f64::from(LikertValue::MAX);
    factors
        .iter()
        .map(|factor| RadarPoint {
            label: factor.name.clone(),
            value: factor.mean,
            percent: round2(factor.mean / max * 100.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{answer, sample_form};
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn round2_rounds_half_away() {
        assert!(approx(round2(3.333_333), 3.33));
        assert!(approx(round2(2.675_000_1), 2.68));
        assert!(approx(round2(4.0), 4.0));
    }

    #[test]
    fn facet_means_and_factor_mean_of_facets() {
        let answers = vec![
            answer("q1", "fa-imag", "f-open", 4),
            answer("q2", "fa-imag", "f-open", 5),
            answer("q3", "fa-art", "f-open", 2),
        ];
        let scores = score(&sample_form(), &answers, Weighting::Facet);

        assert_eq!(scores.len(), 1);
        let openness = &scores[0];
        assert_eq!(openness.name, "Openness");
        assert!(approx(openness.facets[0].mean, 4.5));
        assert!(approx(openness.facets[1].mean, 2.0));
        // (4.5 + 2.0) / 2
        assert!(approx(openness.mean, 3.25));
    }

    #[test]
    fn answer_weighting_averages_all_answers() {
        let answers = vec![
            answer("q1", "fa-imag", "f-open", 4),
            answer("q2", "fa-imag", "f-open", 5),
            answer("q3", "fa-art", "f-open", 2),
        ];
        let scores = score(&sample_form(), &answers, Weighting::Answer);
        // (4 + 5 + 2) / 3
        assert!(approx(scores[0].mean, 3.67));
    }

    #[test]
    fn reverse_scored_items_are_inverted() {
        let answers = vec![
            answer("q4", "fa-anx", "f-neuro", 4),
            answer("q5", "fa-anx", "f-neuro", 1),
        ];
        let scores = score(&sample_form(), &answers, Weighting::Facet);

        let anxiety = &scores[0].facets[0];
        assert!(anxiety.answers[1].reverse);
        assert_eq!(anxiety.answers[1].effective.get(), 5);
        assert_eq!(anxiety.answers[1].answer.value.get(), 1);
        // (4 + 5) / 2
        assert!(approx(anxiety.mean, 4.5));
    }

    #[test]
    fn unanswered_facets_and_factors_are_omitted() {
        let answers = vec![answer("q3", "fa-art", "f-open", 3)];
        let scores = score(&sample_form(), &answers, Weighting::Facet);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].facets.len(), 1);
        assert_eq!(scores[0].facets[0].id, "fa-art");
    }

    #[test]
    fn stale_answers_are_ignored() {
        let answers = vec![
            answer("removed", "fa-imag", "f-open", 1),
            answer("q1", "fa-imag", "f-open", 5),
        ];
        let scores = score(&sample_form(), &answers, Weighting::Facet);
        assert!(approx(scores[0].facets[0].mean, 5.0));
        assert_eq!(scores[0].facets[0].answers.len(), 1);
    }

    #[test]
    fn answers_follow_question_order() {
        let answers = vec![
            answer("q2", "fa-imag", "f-open", 1),
            answer("q1", "fa-imag", "f-open", 2),
        ];
        let scores = score(&sample_form(), &answers, Weighting::Facet);
        let ids: Vec<&str> = scores[0].facets[0]
            .answers
            .iter()
            .map(|s| s.answer.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q2"]);
    }

    #[test]
    fn no_answers_scores_nothing() {
        assert!(score(&sample_form(), &[], Weighting::Facet).is_empty());
    }

    #[test]
    fn radar_points_as_percent_of_max() {
        let answers = vec![
            answer("q1", "fa-imag", "f-open", 4),
            answer("q4", "fa-anx", "f-neuro", 2),
        ];
        let scores = score(&sample_form(), &answers, Weighting::Facet);
        let points = radar_points(&scores);

        assert_eq!(
            points,
            vec![
                RadarPoint {
                    label: "Openness".to_string(),
                    value: 4.0,
                    percent: 80.0,
                },
                RadarPoint {
                    label: "Neuroticism".to_string(),
                    value: 2.0,
                    percent: 40.0,
                },
            ]
        );
    }

    #[test]
    fn weighting_serde_names() {
        assert_eq!(serde_json::to_string(&Weighting::Answer).unwrap(), "\"answer\"");
        let parsed: Weighting = serde_json::from_str("\"facet\"").unwrap();
        assert_eq!(parsed, Weighting::Facet);
        assert_eq!(Weighting::Answer.to_string(), "answer");
    }
}
