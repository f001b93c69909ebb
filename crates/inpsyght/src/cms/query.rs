//! Bracket-style query strings understood by the CMS REST API.
//!
//! `populate[fators][fields][0]=nome` and friends. Keys keep their literal
//! brackets; values are URL-encoded.

/// Fields requested for each question.
pub const QUESTION_FIELDS: &[&str] = &[
    "texto",
    "feedback_baixo",
    "feedback_medio",
    "feedback_alto",
    "pontuacao_reversa",
];

/// Fields requested when listing forms.
pub const LISTING_FIELDS: &[&str] = &["id_formulario", "Nome", "descricao"];

/// Ordered key/value pairs rendered as `k=v&k=v`.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    pairs: Vec<(String, String)>,
}

impl QueryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `prefix[fields][i]=field` for every field.
    #[must_use]
    pub fn fields(mut self, prefix: &str, fields: &[&str]) -> Self {
        for (i, field) in fields.iter().enumerate() {
            let key = if prefix.is_empty() {
                format!("fields[{i}]")
            } else {
                format!("{prefix}[fields][{i}]")
            };
            self.pairs.push((key, (*field).to_string()));
        }
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Query for the form listing endpoint.
#[must_use]
pub fn listing_query() -> String {
    QueryBuilder::new().fields("", LISTING_FIELDS).build()
}

/// Query that populates the whole factor → facet → question tree.
#[must_use]
pub fn full_form_query() -> String {
    let factors = "populate[fators]";
    let facets = "populate[fators][populate][facetas]";
    let questions = "populate[fators][populate][facetas][populate][perguntas]";

    QueryBuilder::new()
        .fields("populate", &["Nome", "descricao"])
        .fields(factors, &["nome"])
        .fields(facets, &["nome"])
        .fields(questions, QUESTION_FIELDS)
        .build()
}
