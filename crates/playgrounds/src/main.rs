use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use playgrounds_core::ImportError;
use playgrounds_core::config::{DEFAULT_CONFIG_FILENAME, ImportSettings, load_config};
use playgrounds_core::connection::{AtlasCli, Credentials};
use playgrounds_core::import::{Collaborators, ImportOutcome, ImportRequest, run_import};
use playgrounds_core::loader::MongoStore;
use playgrounds_core::snapshot::SnapshotClient;
use tracing_subscriber::EnvFilter;

const FATAL_EXIT_CODE: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "playgrounds",
    version,
    about = "Import Atlas Search Playground snapshots into a local deployment"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Import a playground")]
    Import(ImportArgs),
}

#[derive(Debug, Args)]
struct ImportArgs {
    #[arg(value_name = "URL_OR_SNAPSHOT_ID")]
    reference: String,
    #[arg(
        long = "deploymentName",
        alias = "deployment-name",
        value_name = "NAME",
        help = "Name of the deployment where the playground data will be imported"
    )]
    deployment_name: String,
    #[arg(long, value_name = "USER", help = "Database user")]
    dbuser: Option<String>,
    #[arg(long, value_name = "PASS", help = "Database password")]
    dbpass: Option<String>,
    #[arg(long, value_name = "PATH", help = "Directory for the generated project")]
    project_dir: Option<PathBuf>,
    #[arg(long, help = "Enable debug mode")]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    match cli.command {
        Some(Commands::Import(args)) => {
            init_logging(args.debug);
            let settings = resolve_settings(cli.config.as_deref())?;
            match run_import_command(&settings, args) {
                Ok(()) => Ok(()),
                Err(error) => exit_on_fatal(error),
            }
        }
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_settings(config: Option<&Path>) -> Result<ImportSettings> {
    let config_path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let config = load_config(&config_path)?;
    Ok(config.settings())
}

fn run_import_command(settings: &ImportSettings, args: ImportArgs) -> Result<()> {
    let snapshots = SnapshotClient::new(&settings.snapshot_base_url, settings.http_timeout)?;
    let connections = AtlasCli::new(&settings.atlas_executable);
    let documents = MongoStore::new(settings.connect_timeout);
    let collaborators = Collaborators {
        snapshots: &snapshots,
        connections: &connections,
        documents: &documents,
    };
    let request = ImportRequest {
        reference: args.reference,
        deployment: args.deployment_name,
        credentials: Credentials::new(args.dbuser, args.dbpass),
        database_name: settings.database_name.clone(),
        project_dir: args.project_dir,
    };

    let outcome = run_import(&request, &collaborators)
        .with_context(|| format!("failed to import playground {}", request.reference))?;
    print_outcome(&outcome);
    Ok(())
}

/// Fatal import errors end the process here; everything else is returned from main.
fn exit_on_fatal(error: anyhow::Error) -> Result<()> {
    if let Some(import) = error.downcast_ref::<ImportError>()
        && import.is_fatal()
    {
        eprintln!("fatal: {error:#}");
        process::exit(FATAL_EXIT_CODE);
    }
    Err(error)
}

fn print_outcome(outcome: &ImportOutcome) {
    let snapshot = &outcome.snapshot;
    println!("fetched playground");
    println!("reference: {}", outcome.reference.kind());
    println!("snapshot_id: {}", snapshot.id);
    println!("name: {}", snapshot.name);
    println!(
        "retain_indefinitely: {}",
        format_flag(snapshot.retain_indefinitely)
    );
    println!("documents: {}", format_flag(snapshot.has_documents()));
    println!("synonyms: {}", format_flag(snapshot.has_synonyms()));
    println!(
        "aggregation_pipeline: {}",
        display_or_empty(&snapshot.search_config.aggregation_pipeline)
    );
    println!(
        "index_definition: {}",
        display_or_empty(&snapshot.search_config.index_definition)
    );

    if let Some(target) = &outcome.target {
        println!("namespace: {}", target.namespace());
    }
    if let Some(inserted) = outcome.inserted {
        println!("inserted_documents: {inserted}");
    }
    if let Some(project) = &outcome.project {
        println!("project_dir: {}", normalize_path(&project.project_dir));
        for file in &project.files {
            println!("project.file: {}", normalize_path(file));
        }
        if !project.warnings.is_empty() {
            println!("warnings:");
            for warning in &project.warnings {
                println!("  - {warning}");
            }
        }
    }
}

fn display_or_empty(value: &str) -> &str {
    if value.trim().is_empty() {
        "<empty>"
    } else {
        value
    }
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
