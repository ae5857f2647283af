//! Shared HTTP response helpers for the Doccano client.

use serde::de::DeserializeOwned;

use crate::error::DoccanoError;

/// Return the response unchanged on success, otherwise
/// [`DoccanoError::Api`] with the status code and response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DoccanoError> {
    if !resp.status().is_success() {
        return Err(DoccanoError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Check the status, then decode the body as JSON.
///
/// Decoding goes through the body text so parse failures report the
/// offending payload instead of a bare transport error.
pub async fn json_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, DoccanoError> {
    let body = check_response(resp).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| DoccanoError::Parse(format!("{e}: {body}")))
}
