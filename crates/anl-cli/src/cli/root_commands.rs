use clap::{Args, Subcommand};

use crate::cli::subcommands::TrainCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Log in to Doccano and print the account.
    Login,
    /// Look up a configured project in Doccano.
    Project(ProjectArgs),
    /// Write unlabeled IDOL documents to the project's staging file.
    Export(ProjectArgs),
    /// Upload the project's staging file to Doccano.
    Import(ProjectArgs),
    /// Export from IDOL, then import into Doccano.
    Push(ProjectArgs),
    /// Download annotated documents from Doccano.
    Pull(PullArgs),
    /// Train a model.
    Train {
        #[command(subcommand)]
        action: TrainCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ProjectArgs {
    /// Project name as listed under [[projects]]
    pub name: String,
}

#[derive(Clone, Debug, Args)]
pub struct PullArgs {
    /// Project name as listed under [[projects]]
    pub name: String,
    /// Also index the annotations into the project's IDOL database
    #[arg(long)]
    pub index: bool,
}
