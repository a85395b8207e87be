use clap::{Args, Parser, Subcommand};

pub mod database;
pub mod migration;

#[derive(Parser, Debug)]
#[command(
    name = "exports-migrator",
    about = "Exports migrator - run-once changesets for the customs declarations document store",
    long_about = "Applies the ordered changesets of the exports database exactly once, recording each \
    execution in a change-log collection and holding a lock while it runs.\n\n\
    Quick Start:\n  \
    exports-migrator status\n  \
    exports-migrator run --dry-run\n  \
    exports-migrator run",
    after_help = "Examples:\n  \
    exports-migrator run --mongodb-connection-url mongodb://localhost:27017\n  \
    exports-migrator reassign-lrn --eori GB072071145000 --current-lrn QSLRN6499100 --new-lrn NEWLRN1234567"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every pending changeset
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
    /// List applied and pending changesets
    Status {
        #[command(flatten)]
        status_command: Box<StatusCmd>,
    },
    /// Move declarations of one trader from one LRN to another
    #[command(long_about = "Ad-hoc correction outside the change log.\n\n\
        Every declaration owned by --eori whose consignment LRN equals --current-lrn \
        gets --new-lrn instead.")]
    ReassignLrn {
        #[command(flatten)]
        reassign_command: Box<ReassignLrnCmd>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunCmd {
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten)]
    pub migration_args: migration::MigrationCliArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusCmd {
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten)]
    pub collection_args: migration::CollectionCliArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReassignLrnCmd {
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    /// Owner of the declarations to correct.
    #[arg(long)]
    pub eori: String,

    /// LRN currently stored on the declarations.
    #[arg(long)]
    pub current_lrn: String,

    /// LRN to store instead.
    #[arg(long)]
    pub new_lrn: String,

    /// Log the matching declarations without writing anything.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
