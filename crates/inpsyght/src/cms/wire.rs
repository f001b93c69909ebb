//! JSON shapes served by the CMS and their conversion into [`crate::model`].
//!
//! Field names follow the content types configured in the CMS.

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{Facet, Factor, Feedback, Form, FormSummary, Question};

/// `{ "data": ... }` envelope wrapping every response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Identifiers come back as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Pick the stable `documentId` when present, else the numeric `id`.
fn pick_id(document_id: Option<String>, id: Option<WireId>) -> Option<String> {
    document_id
        .filter(|d| !d.is_empty())
        .or_else(|| id.map(WireId::into_string))
        .filter(|d| !d.is_empty())
}

/// Answers and scores are keyed by these ids, so an entry without one
/// cannot be used.
fn require_id(
    kind: &str,
    name: &str,
    document_id: Option<String>,
    id: Option<WireId>,
) -> Result<String> {
    pick_id(document_id, id)
        .ok_or_else(|| Error::parse(format!("{kind} \"{name}\" has neither documentId nor id")))
}

#[derive(Debug, Deserialize)]
pub struct RichTextChild {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RichTextBlock {
    #[serde(default)]
    pub children: Vec<RichTextChild>,
}

/// A text field that may be plain, missing, or rich-text blocks.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
pub enum WireText {
    #[default]
    Null,
    Plain(String),
    Blocks(Vec<RichTextBlock>),
}

impl WireText {
    /// Flatten to plain text: children joined by a space, blocks by newline.
    pub fn into_plain(self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Plain(text) => text,
            Self::Blocks(blocks) => blocks
                .into_iter()
                .map(|block| {
                    block
                        .children
                        .into_iter()
                        .map(|child| child.text)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireQuestion {
    pub id: Option<WireId>,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub texto: String,
    #[serde(default)]
    pub feedback_baixo: WireText,
    #[serde(default)]
    pub feedback_medio: WireText,
    #[serde(default)]
    pub feedback_alto: WireText,
    #[serde(default)]
    pub pontuacao_reversa: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct WireFacet {
    pub id: Option<WireId>,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub perguntas: Option<Vec<WireQuestion>>,
}

#[derive(Debug, Deserialize)]
pub struct WireFactor {
    pub id: Option<WireId>,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub facetas: Option<Vec<WireFacet>>,
}

#[derive(Debug, Deserialize)]
pub struct WireForm {
    pub id: Option<WireId>,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    #[serde(rename = "Nome", default)]
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub fators: Option<Vec<WireFactor>>,
}

impl TryFrom<WireQuestion> for Question {
    type Error = Error;

    fn try_from(wire: WireQuestion) -> Result<Self> {
        Ok(Self {
            id: require_id("question", &wire.texto, wire.document_id, wire.id)?,
            text: wire.texto,
            reverse: wire.pontuacao_reversa.unwrap_or(false),
            feedback: Feedback {
                low: wire.feedback_baixo.into_plain(),
                medium: wire.feedback_medio.into_plain(),
                high: wire.feedback_alto.into_plain(),
            },
        })
    }
}

impl TryFrom<WireFacet> for Facet {
    type Error = Error;

    fn try_from(wire: WireFacet) -> Result<Self> {
        Ok(Self {
            id: require_id("facet", &wire.nome, wire.document_id, wire.id)?,
            questions: wire
                .perguntas
                .unwrap_or_default()
                .into_iter()
                .map(Question::try_from)
                .collect::<Result<_>>()?,
            name: wire.nome,
        })
    }
}

impl TryFrom<WireFactor> for Factor {
    type Error = Error;

    fn try_from(wire: WireFactor) -> Result<Self> {
        Ok(Self {
            id: require_id("factor", &wire.nome, wire.document_id, wire.id)?,
            facets: wire
                .facetas
                .unwrap_or_default()
                .into_iter()
                .map(Facet::try_from)
                .collect::<Result<_>>()?,
            name: wire.nome,
        })
    }
}

impl WireForm {
    /// Convert into a [`Form`], falling back to `requested_id` when the
    /// payload carries no identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if a factor, facet or question has no id.
    pub fn into_form(self, requested_id: &str) -> Result<Form> {
        Ok(Form {
            document_id: pick_id(self.document_id, self.id)
                .unwrap_or_else(|| requested_id.to_string()),
            factors: self
                .fators
                .unwrap_or_default()
                .into_iter()
                .map(Factor::try_from)
                .collect::<Result<_>>()?,
            name: self.nome,
            description: self.descricao.filter(|d| !d.trim().is_empty()),
        })
    }

    /// Listing entry for this form, or `None` when it has no id to fetch by.
    pub fn into_summary(self) -> Option<FormSummary> {
        let Some(document_id) = pick_id(self.document_id, self.id) else {
            warn!(name = %self.nome, "skipping form without documentId or id");
            return None;
        };
        Some(FormSummary {
            document_id,
            name: self.nome,
            description: self.descricao.filter(|d| !d.trim().is_empty()),
        })
    }
}
