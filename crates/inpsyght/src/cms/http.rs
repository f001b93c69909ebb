//! Shared HTTP response checks for the CMS client.

use crate::error::{Error, Result};

/// Check a CMS response for error statuses.
///
/// Returns the response unchanged on success. 404 maps to
/// [`Error::FormNotFound`] when `document_id` is given; any other
/// non-success status maps to [`Error::Api`] with the response body.
pub async fn check_response(
    resp: reqwest::Response,
    document_id: Option<&str>,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        if let Some(id) = document_id {
            return Err(Error::form_not_found(id));
        }
    }
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}
