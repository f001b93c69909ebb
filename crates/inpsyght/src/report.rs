//! Results report for a form.
//!
//! A [`Report`] bundles the factor scores with enough context to display or
//! archive them. It renders as detailed text, a compact table, or JSON.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Answer, Form, LikertValue};
use crate::scoring::{self, FactorScore, RadarPoint, Weighting};

/// Width of the text bar charts.
const BAR_WIDTH: usize = 20;

/// Aggregated results of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Form document id.
    pub document_id: String,
    /// Form name.
    pub form_name: String,
    /// Form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Weighting used for factor means.
    pub weighting: Weighting,
    /// Top of the answer scale, kept with archived snapshots.
    pub max_value: u8,
    /// Number of questions that were answered and scored.
    pub answered: usize,
    /// Number of questions in the form.
    pub total_questions: usize,
    /// Per-factor results.
    pub factors: Vec<FactorScore>,
    /// Radar chart axes, one per factor.
    pub radar: Vec<RadarPoint>,
}

impl Report {
    /// Score `answers` against `form`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAnswers`] when no answer matches a question in the form.
    pub fn build(form: &Form, answers: &[Answer], weighting: Weighting) -> Result<Self> {
        let factors = scoring::score(form, answers, weighting);
        if factors.is_empty() {
            return Err(Error::no_answers(&form.document_id));
        }
        let answered = factors
            .iter()
            .flat_map(|f| &f.facets)
            .map(|f| f.answers.len())
            .sum();
        let radar = scoring::radar_points(&factors);

        Ok(Self {
            document_id: form.document_id.clone(),
            form_name: form.name.clone(),
            description: form.description.clone(),
            generated_at: Utc::now(),
            weighting,
            max_value: LikertValue::MAX,
            answered,
            total_questions: form.question_count(),
            factors,
            radar,
        })
    }

    /// True when every question in the form was answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answered >= self.total_questions
    }

    /// True when both reports score the same recorded answers of the same
    /// form. Generation time is ignored, so re-rendering a finished attempt
    /// compares equal while a retake with fresh answers does not.
    #[must_use]
    pub fn same_attempt(&self, other: &Self) -> bool {
        fn recorded(report: &Report) -> Vec<(&str, u8, DateTime<Utc>)> {
            report
                .factors
                .iter()
                .flat_map(|f| &f.facets)
                .flat_map(|f| &f.answers)
                .map(|s| {
                    (
                        s.answer.question_id.as_str(),
                        s.answer.value.get(),
                        s.answer.answered_at,
                    )
                })
                .collect()
        }

        self.document_id == other.document_id
            && self.weighting == other.weighting
            && recorded(self) == recorded(other)
    }

    /// Text bar for `value` on the report's scale.
    fn bar(&self, value: f64) -> String {
        let max = f64::from(self.max_value.max(1));
        let ratio = (value / max).clamp(0.0, 1.0);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let filled = (ratio * BAR_WIDTH as f64).round() as usize;
        format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
    }

    /// Compact per-factor summary.
    #[must_use]
    pub fn render_table(&self) -> String {
        let name_width = self
            .factors
            .iter()
            .map(|f| f.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Factor".len());

        let mut out = String::new();
        let _ = writeln!(out, "{:<name_width$}  {:>5}  Chart", "Factor", "Mean");
        let _ = writeln!(out, "{}", "-".repeat(name_width + 9 + BAR_WIDTH));
        for factor in &self.factors {
            let _ = writeln!(
                out,
                "{:<name_width$}  {:>5.2}  {}",
                factor.name,
                factor.mean,
                self.bar(factor.mean)
            );
        }
        out
    }

    /// Full report: header, factor summary, then every facet with its answers
    /// and feedback.
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        let title = format!("Results: {}", self.form_name);
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
        if let Some(description) = &self.description {
            let _ = writeln!(out, "{description}");
        }
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        let _ = writeln!(
            out,
            "Answered:  {} of {} questions",
            self.answered, self.total_questions
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "Score summary");
        let _ = writeln!(out, "-------------");
        out.push_str(&self.render_table());

        for factor in &self.factors {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{} (mean {:.2} / {})",
                factor.name, factor.mean, self.max_value
            );
            let _ = writeln!(out, "{}", "-".repeat(factor.name.chars().count()));
            for facet in &factor.facets {
                let _ = writeln!(
                    out,
                    "  {}: {:.2}  {}",
                    facet.name,
                    facet.mean,
                    self.bar(facet.mean)
                );
                for scored in &facet.answers {
                    let answer = &scored.answer;
                    let reverse = if scored.reverse { " (reverse)" } else { "" };
                    let _ = writeln!(out, "    - {}", answer.question_text);
                    let _ = writeln!(
                        out,
                        "      Answer: {} ({}){reverse}",
                        answer.value,
                        answer.value.label()
                    );
                    if !answer.feedback.is_empty() {
                        let _ = writeln!(out, "      Feedback: {}", answer.feedback);
                    }
                }
            }
        }
        out
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
