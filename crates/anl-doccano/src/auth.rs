//! Token login and identity.

use std::time::Duration;

use crate::{DoccanoClient, DoccanoUser, error::DoccanoError, http::json_body};

#[derive(serde::Deserialize)]
struct TokenResponse {
    token: Option<String>,
    key: Option<String>,
}

impl DoccanoClient {
    /// Log in with username and password and return an authenticated client.
    ///
    /// Posts the credentials to `v1/auth-token`; every later request carries
    /// `Authorization: Token {token}`.
    ///
    /// # Errors
    ///
    /// Returns [`DoccanoError::Api`] if Doccano rejects the credentials and
    /// [`DoccanoError::Auth`] if the response carries no token.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, DoccanoError> {
        let mut client = Self::new(base_url, timeout)?;
        let resp = client
            .http
            .post(client.url("v1/auth-token"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        let body: TokenResponse = json_body(resp).await?;
        let token = body
            .token
            .or(body.key)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DoccanoError::Auth("no token in login response".into()))?;

        tracing::debug!(url = %client.base_url, username, "doccano token acquired");
        client.token = token;
        Ok(client)
    }

    /// Fetch the account the client is logged in as.
    ///
    /// # Errors
    ///
    /// Returns [`DoccanoError`] if the request fails or the body cannot be
    /// parsed.
    pub async fn get_me(&self) -> Result<DoccanoUser, DoccanoError> {
        let resp = self.get("v1/me").send().await?;
        json_body(resp).await
    }
}
