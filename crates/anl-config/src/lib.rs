//! # anl-config
//!
//! Layered configuration loading for annoloop using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ANNOLOOP_*` prefix, `__` as separator)
//! 2. An explicit file passed with `anl --config`
//! 3. Project-level `.annoloop/config.toml`
//! 4. User-level `~/.config/annoloop/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ANNOLOOP_DOCCANO__URL` -> `doccano.url`,
//! `ANNOLOOP_GENERAL__THREADS` -> `general.threads`, etc.
//!
//! # Example
//!
//! ```toml
//! [general]
//! threads = 2
//! tempfolder = "data"
//!
//! [doccano]
//! url = "http://localhost:8000"
//! username = "admin"
//! password = "password"
//!
//! [idol]
//! aci_url = "http://idol:9000"
//! index_url = "http://idol:9001"
//!
//! [[projects]]
//! name = "Sentiment"
//! textfield = "DRECONTENT"
//! datafield = "SENTIMENT_LABELS"
//! database = "Staging"
//! queries = [{ text = "*", fieldtext = "MATCH{news}:CATEGORY" }]
//! ```

mod doccano;
mod error;
mod general;
mod idol;
mod training;

pub use doccano::DoccanoConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use idol::IdolConfig;
pub use training::TrainingConfig;

use std::path::{Path, PathBuf};

use anl_core::project::Project;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnlConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub doccano: DoccanoConfig,
    #[serde(default)]
    pub idol: IdolConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl AnlConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(explicit).extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the current directory.
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer extra providers.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".annoloop/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("ANNOLOOP_").split("__"))
    }

    /// Find a configured project by name (compared after trimming).
    pub fn project(&self, name: &str) -> Result<Project, ConfigError> {
        let wanted = name.trim();
        self.projects
            .iter()
            .find(|p| p.lookup_name() == wanted)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProject(wanted.to_string()))
    }

    /// Fail unless the Doccano section is usable.
    pub fn require_doccano(&self) -> Result<&DoccanoConfig, ConfigError> {
        if self.doccano.is_configured() {
            Ok(&self.doccano)
        } else {
            Err(ConfigError::NotConfigured {
                section: "doccano".into(),
            })
        }
    }

    /// Fail unless the IDOL section is usable.
    pub fn require_idol(&self) -> Result<&IdolConfig, ConfigError> {
        if self.idol.is_configured() {
            Ok(&self.idol)
        } else {
            Err(ConfigError::NotConfigured {
                section: "idol".into(),
            })
        }
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("annoloop").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = AnlConfig::default();
        assert!(!config.doccano.is_configured());
        assert!(!config.idol.is_configured());
        assert!(config.projects.is_empty());
        assert_eq!(config.general.threads, 2);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: AnlConfig = AnlConfig::figment(None)
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.general.timeout_secs, 60);
    }

    #[test]
    fn project_lookup_trims_name() {
        let config = AnlConfig {
            projects: vec![Project::named("Sentiment")],
            ..Default::default()
        };
        assert_eq!(config.project(" Sentiment ").unwrap().name, "Sentiment");
        assert!(matches!(
            config.project("sentiment"),
            Err(ConfigError::UnknownProject(_))
        ));
    }

    #[test]
    fn require_sections_report_missing() {
        let config = AnlConfig::default();
        assert!(matches!(
            config.require_doccano(),
            Err(ConfigError::NotConfigured { .. })
        ));
        assert!(matches!(
            config.require_idol(),
            Err(ConfigError::NotConfigured { .. })
        ));
    }
}
