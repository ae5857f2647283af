use std::time::Duration;

use anl_config::{AnlConfig, DoccanoConfig};
use anl_doccano::{DoccanoClient, DoccanoUser};
use anl_sync::SyncError;
use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::output::output;
use crate::progress::Progress;

/// Handle `anl login`.
pub async fn handle(config: &AnlConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let doccano = config.require_doccano()?;
    let timeout = Duration::from_secs(config.general.timeout_secs);

    let progress = Progress::spinner(&format!("Logging in to {}", doccano.url));
    let result = login(doccano, timeout).await;
    progress.finish(&result, "Logged in", "Login failed");

    let me = result.with_context(|| format!("failed to log in to {}", doccano.url))?;
    output(&me, flags.format)
}

async fn login(doccano: &DoccanoConfig, timeout: Duration) -> Result<DoccanoUser, SyncError> {
    let client =
        DoccanoClient::login(&doccano.url, &doccano.username, &doccano.password, timeout).await?;
    anl_sync::authenticate(&client).await
}
