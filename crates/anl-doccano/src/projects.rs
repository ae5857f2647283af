//! Project listing.

use crate::{DoccanoClient, DoccanoProject, error::DoccanoError, http::json_body};

/// `v1/projects` is a bare array on older servers and a paginated envelope on
/// newer ones.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ProjectList {
    Plain(Vec<DoccanoProject>),
    Paged {
        results: Vec<DoccanoProject>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl DoccanoClient {
    /// List every project visible to the logged-in account, following the
    /// envelope's `next` link until the last page.
    ///
    /// # Errors
    ///
    /// Returns [`DoccanoError`] if a request fails or a page cannot be
    /// parsed.
    pub async fn list_projects(&self) -> Result<Vec<DoccanoProject>, DoccanoError> {
        let mut projects = Vec::new();
        let mut next = Some(self.url("v1/projects"));
        while let Some(url) = next.take() {
            let resp = self.authorize(self.http.get(&url)).send().await?;
            match json_body(resp).await? {
                ProjectList::Plain(page) => projects.extend(page),
                ProjectList::Paged { results, next: link } => {
                    tracing::debug!(%url, count = results.len(), "project page");
                    projects.extend(results);
                    next = link.map(|link| self.resolve(&link));
                }
            }
        }
        Ok(projects)
    }

    /// Absolute `next` links are used as-is; relative ones hang off the
    /// base URL.
    fn resolve(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            self.url(link)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_plain_array() {
        let list: ProjectList = serde_json::from_str(
            r#"[{"id": 1, "name": "Sentiment", "project_type": "DocumentClassification"}]"#,
        )
        .unwrap();
        let ProjectList::Plain(projects) = list else {
            panic!("expected a plain array");
        };
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_type, "DocumentClassification");
    }

    #[test]
    fn parses_paginated_envelope() {
        let list: ProjectList = serde_json::from_str(
            r#"{"count": 2, "next": null, "results": [
                {"id": 1, "name": "A"},
                {"id": 2, "name": "B", "description": "second"}
            ]}"#,
        )
        .unwrap();
        let ProjectList::Paged { results: projects, next } = list else {
            panic!("expected an envelope");
        };
        assert_eq!(next, None);
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].description, "second");
    }
}
