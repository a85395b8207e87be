use clap::Parser as _;
use dotenvy::dotenv;
use exports_migrator::cli::{Cli, Commands, ReassignLrnCmd, RunCmd, StatusCmd};
use exports_migrator::core::client::{DatabaseClient, MongoDbClient};
use exports_migrator::core::config::Config;
use exports_migrator::countries::CountryCatalogue;
use exports_migrator::migration::{MigrationContext, MigrationRunner};
use exports_migrator::scripts::reassign_lrn;
use exports_migrator::types::params::DatabaseArgs;
use exports_migrator::utils::logging::init_logging;
use exports_migrator::utils::signal_handler::{abort_on_signal, disarm};
use exports_migrator::MigratorResult;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    if let Err(e) = init_logging() {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Failed to initialise logging: {}", e);
        }
        return ExitCode::FAILURE;
    }
    let cli = Cli::parse();

    let (name, result) = match &cli.command {
        Commands::Run { run_command } => {
            debug!("Executing run command with args: {:?}", run_command);
            ("run", run_migrations(run_command).await)
        }
        Commands::Status { status_command } => {
            debug!("Executing status command with args: {:?}", status_command);
            ("status", show_status(status_command).await)
        }
        Commands::ReassignLrn { reassign_command } => {
            debug!("Executing reassign-lrn command with args: {:?}", reassign_command);
            ("reassign-lrn", run_reassign_lrn(reassign_command).await)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, error_chain = ?e, "Command '{}' failed", name);
            ExitCode::FAILURE
        }
    }
}

async fn run_migrations(run_cmd: &RunCmd) -> MigratorResult<()> {
    let config = Arc::new(Config::setup(run_cmd).await?);
    let runner = MigrationRunner::new(config);
    info!(execution_id = %runner.execution_id(), "Starting exports migrator");

    let signals = abort_on_signal(runner.abort_flag());
    let summary = runner.run().await;
    disarm(signals);

    let summary = summary?;
    let total = summary.total();
    info!(
        executed = summary.executed.len(),
        matched = total.matched,
        modified = total.modified,
        already_applied = summary.already_applied,
        dry_run = summary.dry_run,
        "Exports migrator finished"
    );
    Ok(())
}

async fn show_status(status_cmd: &StatusCmd) -> MigratorResult<()> {
    let config = Arc::new(Config::setup_status(status_cmd).await?);
    let status = MigrationRunner::new(config).check_status().await?;

    for change_set in &status.applied {
        let executed_at = change_set.executed_at.map(|at| at.to_rfc3339()).unwrap_or_default();
        info!("✅ {} #{} '{}' applied at {}", change_set.change_log, change_set.order, change_set.id, executed_at);
    }
    for change_set in &status.pending {
        info!("⏳ {} #{} '{}' pending", change_set.change_log, change_set.order, change_set.id);
    }
    if let Some(owner) = &status.lock_owner {
        info!("🔒 A migration is in progress (execution {})", owner);
    }
    info!(applied = status.applied.len(), pending = status.pending.len(), "Migration status");
    Ok(())
}

async fn run_reassign_lrn(reassign_cmd: &ReassignLrnCmd) -> MigratorResult<()> {
    let db_args = DatabaseArgs::try_from(reassign_cmd.mongodb_args.clone())?;
    let database = MongoDbClient::new(&db_args).await?;
    database.health_check().await?;

    let countries = CountryCatalogue::embedded()?;
    let abort_flag = Arc::new(AtomicBool::new(false));
    let signals = abort_on_signal(abort_flag.clone());
    let ctx = MigrationContext::new(&database, &countries, reassign_cmd.dry_run, abort_flag);

    let report =
        reassign_lrn(&ctx, &reassign_cmd.eori, &reassign_cmd.current_lrn, &reassign_cmd.new_lrn).await;
    disarm(signals);

    let report = report?;
    info!(matched = report.matched, modified = report.modified, skipped = report.skipped, "LRN reassignment done");
    Ok(())
}
