//! ACI `Query` action and `simplejson` response parsing.

use std::collections::BTreeMap;

use anl_core::query::QueryRecord;
use serde::Deserialize;

use crate::{IdolClient, IdolDocument, IdolHit, error::IdolError, response_text};

/// `simplejson` prints repeated elements as arrays, but single elements
/// occasionally arrive bare depending on server version.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    autnresponse: AutnResponse,
}

#[derive(Deserialize)]
struct AutnResponse {
    action: String,
    response: String,
    #[serde(default)]
    responsedata: ResponseData,
}

#[derive(Deserialize, Default)]
struct ResponseData {
    #[serde(default)]
    hit: OneOrMany<RawHit>,
    #[serde(default)]
    error: Option<AciErrorBody>,
}

#[derive(Deserialize)]
struct AciErrorBody {
    #[serde(default)]
    errorstring: String,
    #[serde(default)]
    errordescription: String,
}

#[derive(Deserialize)]
struct RawHit {
    reference: String,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<RawContent>,
}

#[derive(Deserialize)]
struct RawContent {
    #[serde(rename = "DOCUMENT", default)]
    document: OneOrMany<BTreeMap<String, OneOrMany<serde_json::Value>>>,
}

impl From<RawHit> for IdolHit {
    fn from(raw: RawHit) -> Self {
        let document = raw
            .content
            .and_then(|c| Vec::from(c.document).into_iter().next())
            .map(|fields| {
                fields
                    .into_iter()
                    .map(|(name, values)| {
                        let values = Vec::from(values).into_iter().map(value_to_string).collect();
                        (name, values)
                    })
                    .collect::<IdolDocument>()
            })
            .unwrap_or_default();

        Self {
            reference: raw.reference,
            database: raw.database,
            title: raw.title,
            document,
            fields: Vec::new(),
        }
    }
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Parse a `simplejson` Query response into hits.
///
/// # Errors
///
/// Returns [`IdolError::Parse`] for malformed JSON and [`IdolError::Aci`]
/// when the action did not succeed.
pub fn parse_query_response(body: &str) -> Result<Vec<IdolHit>, IdolError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| IdolError::Parse(format!("simplejson: {e}")))?;
    let response = envelope.autnresponse;

    if !response.response.eq_ignore_ascii_case("SUCCESS") {
        let message = response.responsedata.error.map_or_else(
            || response.response.clone(),
            |e| {
                if e.errordescription.is_empty() {
                    e.errorstring
                } else {
                    format!("{}: {}", e.errorstring, e.errordescription)
                }
            },
        );
        return Err(IdolError::Aci {
            action: response.action,
            message,
        });
    }

    Ok(Vec::from(response.responsedata.hit)
        .into_iter()
        .map(IdolHit::from)
        .collect())
}

impl IdolClient {
    /// Run an ACI `Query` and return its hits.
    ///
    /// # Errors
    ///
    /// Returns [`IdolError`] if the request fails, IDOL answers with an
    /// error, or the response cannot be parsed.
    pub async fn query(&self, query: &QueryRecord) -> Result<Vec<IdolHit>, IdolError> {
        let mut url = format!(
            "{}/action=Query&ResponseFormat=simplejson&Print={}&MaxResults={}&Text={}",
            self.aci_url,
            query.print.as_str(),
            self.max_results,
            urlencoding::encode(&query.text),
        );
        if !query.fieldtext.is_empty() {
            url.push_str("&FieldText=");
            url.push_str(&urlencoding::encode(&query.fieldtext));
        }

        tracing::debug!(text = %query.text, fieldtext = %query.fieldtext, "idol query");
        let resp = self.http.get(&url).send().await?;
        let body = response_text(resp).await?;
        let hits = parse_query_response(&body)?;
        tracing::debug!(hits = hits.len(), "idol query returned");
        Ok(hits)
    }
}
