use anl_config::AnlConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Login => commands::login::handle(config, flags).await,
        Commands::Project(args) => commands::project::handle(&args, config, flags).await,
        Commands::Export(args) => commands::sync::export(&args, config, flags).await,
        Commands::Import(args) => commands::sync::import(&args, config, flags).await,
        Commands::Push(args) => commands::sync::push(&args, config, flags).await,
        Commands::Pull(args) => commands::sync::pull(&args, config, flags).await,
        Commands::Train { action } => commands::train::handle(&action, config, flags),
    }
}
