//! IDOL connection configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdolConfig {
    /// ACI endpoint used for queries (e.g. `http://idol:9000`).
    #[serde(default)]
    pub aci_url: String,

    /// Index endpoint used for `DREADDDATA` / `DREDELETEREF`.
    /// Falls back to `aci_url` when empty.
    #[serde(default)]
    pub index_url: String,
}

impl IdolConfig {
    pub fn is_configured(&self) -> bool {
        !self.aci_url.is_empty()
    }

    /// The index endpoint, defaulting to the ACI endpoint.
    pub fn index_endpoint(&self) -> &str {
        if self.index_url.is_empty() {
            &self.aci_url
        } else {
            &self.index_url
        }
    }
}
