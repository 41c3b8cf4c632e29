use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tl_cli::commands::{entries, export, groups, import, overlaps, report, status, timer};
use tl_cli::{Backend, Cli, Commands, Config, EntryAction, ExportFormat, GroupAction};
use tl_db::{Database, JsonStore, Store};

/// Load config and open the configured store, ensuring the parent directory exists.
///
/// The JSON store stays locked for the whole command.
fn open_store(config_path: Option<&Path>) -> Result<Box<dyn Store>> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.store_path().parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let store: Box<dyn Store> = match config.backend {
        Backend::Sqlite => Box::new(
            Database::open(&config.database_path).context("failed to open database")?,
        ),
        Backend::Json => {
            let mut store = JsonStore::open(&config.json_path);
            store.lock().context("failed to lock json store")?;
            Box::new(store)
        }
    };
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut store = open_store(cli.config.as_deref())?;
    let store = store.as_mut();
    let out = &mut io::stdout().lock();

    match command {
        Commands::Group(action) => match action {
            GroupAction::Add { name } => groups::add(out, store, name)?,
            GroupAction::List { all, json } => groups::list(out, store, *all, *json, Utc::now())?,
            GroupAction::Delete { group } => groups::delete(out, store, group)?,
            GroupAction::Archive { group } => groups::archive(out, store, group)?,
            GroupAction::Unarchive { group } => groups::unarchive(out, store, group)?,
        },
        Commands::Start { group } => timer::start(out, store, group, Utc::now())?,
        Commands::Stop { group } => timer::stop(out, store, group, Utc::now())?,
        Commands::Entry(action) => match action {
            EntryAction::Add { group, start, end } => entries::add(out, store, group, start, end)?,
            EntryAction::List { group, json } => entries::list(out, store, group, *json)?,
            EntryAction::Edit {
                group,
                index,
                start,
                end,
            } => entries::edit(out, store, group, *index, start, end)?,
            EntryAction::Delete { group, index } => entries::delete(out, store, group, *index)?,
        },
        Commands::Status => status::run(out, store, Utc::now())?,
        Commands::Report { scope, json } => report::run(out, store, scope, *json)?,
        Commands::Overlaps { all, json } => overlaps::run(out, store, *all, *json)?,
        Commands::Export(format) => match format {
            ExportFormat::Json => export::json(out, store)?,
            ExportFormat::Csv => export::csv(out, store)?,
            ExportFormat::ReportCsv { scope } => export::report_csv(out, store, scope)?,
        },
        Commands::Import { file, merge } => import::run(out, store, file, *merge)?,
    }

    Ok(())
}
