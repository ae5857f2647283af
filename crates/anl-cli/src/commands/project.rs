use anl_config::AnlConfig;
use anl_sync::SyncService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProjectArgs;
use crate::output::output;

/// Handle `anl project`.
pub async fn handle(
    args: &ProjectArgs,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project = config.project(&args.name)?;
    let service = SyncService::connect(config).await?;
    let resolution = service.describe_project(&project).await?;
    output(&resolution, flags.format)
}
