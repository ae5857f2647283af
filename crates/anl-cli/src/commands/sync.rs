//! `export`, `import`, `push` and `pull`.

use anl_config::AnlConfig;
use anl_sync::SyncService;
use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{ProjectArgs, PullArgs};
use crate::output::output;
use crate::progress::Progress;

/// Handle `anl export`.
pub async fn export(
    args: &ProjectArgs,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project = config.project(&args.name)?;
    let service = SyncService::connect(config).await?;

    let progress =
        Progress::spinner(&format!("Exporting '{}' from IDOL", project.lookup_name()));
    let result = service.export_training_from_idol(&project).await;
    progress.finish(&result, "Export done", "Export failed");

    let summary = result
        .with_context(|| format!("export of '{}' failed", project.lookup_name()))?;
    output(&summary, flags.format)
}

/// Handle `anl import`.
pub async fn import(
    args: &ProjectArgs,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project = config.project(&args.name)?;
    let service = SyncService::connect(config).await?;

    let progress =
        Progress::spinner(&format!("Uploading '{}' to Doccano", project.lookup_name()));
    let result = service.import_training_into_doccano(&project).await;
    progress.finish(&result, "Import done", "Import failed");

    let outcome = result
        .with_context(|| format!("import of '{}' failed", project.lookup_name()))?;
    output(&outcome, flags.format)
}

/// Handle `anl push`.
pub async fn push(
    args: &ProjectArgs,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project = config.project(&args.name)?;
    let service = SyncService::connect(config).await?;

    let progress =
        Progress::spinner(&format!("Pushing '{}' to Doccano", project.lookup_name()));
    let result = service.export_idol_to_doccano(&project).await;
    progress.finish(&result, "Push done", "Push failed");

    let summary = result
        .with_context(|| format!("push of '{}' failed", project.lookup_name()))?;
    output(&summary, flags.format)
}

/// Handle `anl pull`.
pub async fn pull(
    args: &PullArgs,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project = config.project(&args.name)?;
    let service = SyncService::connect(config).await?;

    let progress =
        Progress::spinner(&format!("Downloading '{}' from Doccano", project.lookup_name()));
    let result = service.export_doccano_to_idol(&project, args.index).await;
    progress.finish(&result, "Pull done", "Pull failed");

    let outcome = result
        .with_context(|| format!("pull of '{}' failed", project.lookup_name()))?;
    output(&outcome, flags.format)
}
