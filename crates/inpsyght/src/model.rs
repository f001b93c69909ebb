//! Core questionnaire types for inpsyght.
//!
//! A [`Form`] is a read-only tree of factors, facets and questions served by
//! the CMS. [`Answer`]s are the only records created locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A position on the five-point agreement scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LikertValue(u8);

impl LikertValue {
    /// Lowest value on the scale.
    pub const MIN: u8 = 1;
    /// Highest value on the scale.
    pub const MAX: u8 = 5;

    /// Create a value, rejecting anything outside 1..=5.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAnswer`] for out-of-range values.
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidAnswer {
                value: i64::from(value),
            })
        }
    }

    /// The raw value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// The value mirrored around the midpoint (`6 - value`).
    #[must_use]
    pub fn reversed(self) -> Self {
        Self(Self::MIN + Self::MAX - self.0)
    }

    /// Human-readable label for the value.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Strongly disagree",
            2 => "Disagree",
            3 => "Neutral",
            4 => "Agree",
            _ => "Strongly agree",
        }
    }

    /// All values in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl TryFrom<u8> for LikertValue {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for LikertValue {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| Error::InvalidAnswer { value })
            .and_then(Self::new)
    }
}

impl From<LikertValue> for u8 {
    fn from(value: LikertValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for LikertValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feedback texts shown for low, medium and high agreement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Shown for values 1 and 2.
    pub low: String,
    /// Shown for value 3.
    pub medium: String,
    /// Shown for values 4 and 5.
    pub high: String,
}

impl Feedback {
    /// Pick the feedback text for a raw answer value.
    #[must_use]
    pub fn for_value(&self, value: LikertValue) -> &str {
        match value.get() {
            1 | 2 => &self.low,
            3 => &self.medium,
            _ => &self.high,
        }
    }
}

/// A single questionnaire item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// CMS identifier.
    pub id: String,
    /// Statement the user agrees or disagrees with.
    pub text: String,
    /// Whether the answer is inverted before averaging.
    #[serde(default)]
    pub reverse: bool,
    /// Feedback texts.
    pub feedback: Feedback,
}

/// A sub-dimension of a factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// CMS identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Questions in presentation order.
    pub questions: Vec<Question>,
}

/// One of the broad personality dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    /// CMS identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Facets in presentation order.
    pub facets: Vec<Facet>,
}

/// A complete questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// CMS document identifier; answers are cached under this key.
    pub document_id: String,
    /// Display name.
    pub name: String,
    /// Optional introduction text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Factors in presentation order.
    pub factors: Vec<Factor>,
}

impl Form {
    /// Total number of questions across all factors.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.factors
            .iter()
            .flat_map(|factor| &factor.facets)
            .map(|facet| facet.questions.len())
            .sum()
    }

    /// Look up a question by id.
    #[must_use]
    pub fn find_question(&self, id: &str) -> Option<&Question> {
        self.factors
            .iter()
            .flat_map(|factor| &factor.facets)
            .flat_map(|facet| &facet.questions)
            .find(|question| question.id == id)
    }

    /// Short listing entry for this form.
    #[must_use]
    pub fn summary(&self) -> FormSummary {
        FormSummary {
            document_id: self.document_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Listing entry for a form, without its question tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    /// CMS document identifier.
    pub document_id: String,
    /// Display name.
    pub name: String,
    /// Optional introduction text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A recorded response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Question this answers.
    pub question_id: String,
    /// Question text at the time of answering.
    pub question_text: String,
    /// Selected raw value.
    pub value: LikertValue,
    /// Feedback text selected for the raw value.
    pub feedback: String,
    /// Facet the question belongs to.
    pub facet_id: String,
    /// Factor the question belongs to.
    pub factor_id: String,
    /// When the answer was given.
    pub answered_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small forms shared by unit tests.

    use super::*;

    pub fn question(id: &str, reverse: bool) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Statement {id}"),
            reverse,
            feedback: Feedback {
                low: format!("{id} low"),
                medium: format!("{id} medium"),
                high: format!("{id} high"),
            },
        }
    }

    /// Two factors: Openness (two facets) and Neuroticism (one facet with a
    /// reverse-scored item).
    pub fn sample_form() -> Form {
        Form {
            document_id: "form-1".to_string(),
            name: "Big Five".to_string(),
            description: Some("Self-assessment".to_string()),
            factors: vec![
                Factor {
                    id: "f-open".to_string(),
                    name: "Openness".to_string(),
                    facets: vec![
                        Facet {
                            id: "fa-imag".to_string(),
                            name: "Imagination".to_string(),
                            questions: vec![question("q1", false), question("q2", false)],
                        },
                        Facet {
                            id: "fa-art".to_string(),
                            name: "Artistic interests".to_string(),
                            questions: vec![question("q3", false)],
                        },
                    ],
                },
                Factor {
                    id: "f-neuro".to_string(),
                    name: "Neuroticism".to_string(),
                    facets: vec![Facet {
                        id: "fa-anx".to_string(),
                        name: "Anxiety".to_string(),
                        questions: vec![question("q4", false), question("q5", true)],
                    }],
                },
            ],
        }
    }

    pub fn answer(question_id: &str, facet_id: &str, factor_id: &str, value: u8) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            question_text: format!("Statement {question_id}"),
            value: LikertValue::new(value).expect("valid test value"),
            feedback: String::new(),
            facet_id: facet_id.to_string(),
            factor_id: factor_id.to_string(),
            answered_at: Utc::now(),
        }
    }
}
