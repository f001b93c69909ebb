//! Content sources for questionnaire forms.
//!
//! Forms live in a headless CMS and are read at the start of every command.
//! [`FormSource`] abstracts over where they come from:
//!
//! - [`CmsClient`] talks to the CMS REST API over HTTP.
//! - [`FileSource`] reads a form saved in the same JSON shape, for offline
//!   use and fixtures.

mod http;
mod query;
mod wire;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Form, FormSummary};

use self::http::check_response;
use self::wire::{Envelope, WireForm};

/// A place forms can be read from.
#[async_trait]
pub trait FormSource: Send + Sync {
    /// Short description of the source, for status output.
    fn describe(&self) -> String;

    /// List the forms available to answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or parsed.
    async fn list_forms(&self) -> Result<Vec<FormSummary>>;

    /// Fetch a form with its complete factor → facet → question tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormNotFound`] for unknown ids, or another error if
    /// the source cannot be reached or parsed.
    async fn fetch_form(&self, document_id: &str) -> Result<Form>;
}

/// HTTP client for the CMS REST API.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    base_url: String,
}

impl CmsClient {
    /// Create a client for the CMS configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.cms.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.cms_base_url().to_string(),
        })
    }

    /// The API base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn listing_url(&self) -> String {
        format!("{}/formularios?{}", self.base_url, query::listing_query())
    }

    fn form_url(&self, document_id: &str) -> String {
        format!(
            "{}/formularios/{}?{}",
            self.base_url,
            urlencoding::encode(document_id),
            query::full_form_query()
        )
    }
}

#[async_trait]
impl FormSource for CmsClient {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn list_forms(&self) -> Result<Vec<FormSummary>> {
        let url = self.listing_url();
        debug!(%url, "listing forms");
        let resp = check_response(self.http.get(&url).send().await?, None).await?;

        let envelope: Envelope<Vec<WireForm>> = resp.json().await?;
        let forms: Vec<FormSummary> = envelope
            .data
            .into_iter()
            .filter_map(WireForm::into_summary)
            .collect();
        info!(count = forms.len(), "fetched form listing");
        Ok(forms)
    }

    async fn fetch_form(&self, document_id: &str) -> Result<Form> {
        let url = self.form_url(document_id);
        debug!(%url, "fetching form");
        let resp = check_response(self.http.get(&url).send().await?, Some(document_id)).await?;

        let envelope: Envelope<WireForm> = resp.json().await?;
        let form = envelope.data.into_form(document_id)?;
        info!(
            document_id,
            factors = form.factors.len(),
            questions = form.question_count(),
            "fetched form"
        );
        Ok(form)
    }
}

/// A single form read from a JSON file in the CMS response shape.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source backed by `path`. The file is read on every call.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read(&self) -> Result<Form> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let envelope: Envelope<WireForm> = serde_json::from_str(&raw)
            .map_err(|e| Error::parse(format!("{}: {e}", self.path.display())))?;
        let fallback_id = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        envelope.data.into_form(&fallback_id)
    }
}

#[async_trait]
impl FormSource for FileSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn list_forms(&self) -> Result<Vec<FormSummary>> {
        Ok(vec![self.read().await?.summary()])
    }

    async fn fetch_form(&self, document_id: &str) -> Result<Form> {
        let form = self.read().await?;
        if form.document_id == document_id {
            Ok(form)
        } else {
            Err(Error::form_not_found(document_id))
        }
    }
}
