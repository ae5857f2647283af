use anl_config::AnlConfig;
use anyhow::Context;

use crate::cli::GlobalFlags;

/// Load `.env` from the working directory, then the layered config.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<AnlConfig> {
    let config = AnlConfig::load_with_dotenv(flags.config.as_deref()).with_context(|| {
        flags.config.as_ref().map_or_else(
            || "failed to load configuration".to_string(),
            |path| format!("failed to load configuration from {}", path.display()),
        )
    })?;

    if !config.doccano.is_configured() {
        tracing::debug!("doccano is not configured; sync commands will fail");
    }
    Ok(config)
}
