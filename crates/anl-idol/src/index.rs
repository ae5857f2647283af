//! Index commands: `DREDELETEREF` and `DREADDDATA`.
//!
//! Documents are written in IDX format:
//!
//! ```text
//! #DREREFERENCE news/1
//! #DREDBNAME Staging
//! #DRETITLE Vaccines
//! #DREFIELD CATEGORY="news"
//! #DREFIELD LABELS="[[0,10,\"ORG\"]]"
//! #DRECONTENT
//! Aggressive treatment against covid
//! #DREENDDOC
//! #DREENDDATANOOP
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::{IdolClient, IdolHit, error::IdolError, response_text};

/// Document fields that map onto dedicated IDX headers.
const RESERVED_FIELDS: [&str; 4] = ["DREREFERENCE", "DREDBNAME", "DRETITLE", "DRECONTENT"];

/// Escape a value for a `#DREFIELD NAME="value"` line.
fn escape_field(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

fn extra_field_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serialize hits as IDX into `database`, terminated with `#DREENDDATANOOP`.
#[must_use]
pub fn to_idx(hits: &[IdolHit], database: &str) -> String {
    let mut out = String::new();
    for hit in hits {
        let _ = writeln!(out, "#DREREFERENCE {}", hit.reference);
        if !database.is_empty() {
            let _ = writeln!(out, "#DREDBNAME {database}");
        }
        if let Some(title) = hit.title.as_deref().or_else(|| hit.first("DRETITLE")) {
            let _ = writeln!(out, "#DRETITLE {}", escape_field(title));
        }

        let overridden: BTreeSet<&str> = hit.fields.iter().map(|(name, _)| name.as_str()).collect();
        for (name, values) in &hit.document {
            if RESERVED_FIELDS.contains(&name.as_str()) || overridden.contains(name.as_str()) {
                continue;
            }
            for value in values {
                let _ = writeln!(out, "#DREFIELD {name}=\"{}\"", escape_field(value));
            }
        }
        for (name, value) in &hit.fields {
            let _ = writeln!(
                out,
                "#DREFIELD {name}=\"{}\"",
                escape_field(&extra_field_value(value))
            );
        }

        out.push_str("#DRECONTENT\n");
        if let Some(content) = hit.document.get("DRECONTENT") {
            for line in content {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str("#DREENDDOC\n");
    }
    out.push_str("#DREENDDATANOOP\n\n");
    out
}

/// Accept `INDEXID=n` acknowledgements, reject anything else.
fn check_index_ack(command: &str, body: &str) -> Result<u64, IdolError> {
    body.trim()
        .strip_prefix("INDEXID=")
        .and_then(|id| id.trim().parse::<u64>().ok())
        .ok_or_else(|| IdolError::Index {
            command: command.to_string(),
            message: body.trim().to_string(),
        })
}

impl IdolClient {
    /// Delete documents by reference, `batch_size` references per command.
    ///
    /// Returns the index ids acknowledged by IDOL, one per batch.
    ///
    /// # Errors
    ///
    /// Returns [`IdolError`] on the first batch that fails; earlier batches
    /// stay applied.
    pub async fn remove_documents<I, S>(
        &self,
        references: I,
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let references: Vec<String> = references
            .into_iter()
            .map(|r| urlencoding::encode(r.as_ref()).into_owned())
            .collect();

        let mut ids = Vec::new();
        for batch in references.chunks(batch_size.max(1)) {
            let url = format!("{}/DREDELETEREF?Docs={}", self.index_url, batch.join("+"));
            let resp = self.http.get(&url).send().await?;
            let body = response_text(resp).await?;
            let id = check_index_ack("DREDELETEREF", &body)?;
            tracing::debug!(count = batch.len(), index_id = id, "idol delete queued");
            ids.push(id);
        }
        Ok(ids)
    }

    /// Index documents into `database`, `batch_size` documents per command.
    ///
    /// # Errors
    ///
    /// Returns [`IdolError`] on the first batch that fails; earlier batches
    /// stay applied.
    pub async fn index_into_idol(
        &self,
        documents: &[IdolHit],
        database: &str,
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError> {
        let mut ids = Vec::new();
        for batch in documents.chunks(batch_size.max(1)) {
            let url = format!("{}/DREADDDATA?", self.index_url);
            let resp = self
                .http
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(to_idx(batch, database))
                .send()
                .await?;
            let body = response_text(resp).await?;
            let id = check_index_ack("DREADDDATA", &body)?;
            tracing::debug!(count = batch.len(), database, index_id = id, "idol add queued");
            ids.push(id);
        }
        Ok(ids)
    }
}
