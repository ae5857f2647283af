//! Doccano connection configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DoccanoConfig {
    /// Base URL of the Doccano server (e.g. `http://localhost:8000`).
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl DoccanoConfig {
    /// Check if the Doccano config has the minimum required fields.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        assert!(!DoccanoConfig::default().is_configured());
    }

    #[test]
    fn configured_when_all_fields_set() {
        let config = DoccanoConfig {
            url: "http://localhost:8000".into(),
            username: "admin".into(),
            password: "password".into(),
        };
        assert!(config.is_configured());
    }

    #[test]
    fn not_configured_without_password() {
        let config = DoccanoConfig {
            url: "http://localhost:8000".into(),
            username: "admin".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }
}
