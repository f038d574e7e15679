//! worklens - Azure DevOps work-item status CLI
//!
//! Queries work items, sprints, and user stories from the Azure DevOps
//! REST API and reports on them as a table, JSON, or CSV; a separate
//! subcommand scans a local markdown planning tree for PRD/epic/task
//! status counts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, authentication, API failure)

mod analysis;
mod azdo;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod status;

use analysis::{aggregate, filter_items, normalize_batch, FilterOptions};
use anyhow::{Context, Result};
use azdo::{queries, AzdoClient};
use chrono::Utc;
use cli::{Args, Command, OutputFormat, QueryArgs};
use config::{Config, ConnectionConfig};
use error::Error;
use models::{SprintWindow, WorkItemType};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading required variables
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    debug!("worklens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if e.downcast_ref::<Error>()
                .map(Error::is_authentication)
                .unwrap_or(false)
            {
                error!("Authentication failed");
                eprintln!("\n❌ Authentication failed: check AZURE_DEVOPS_PAT");
            } else {
                error!("Command failed: {}", e);
                eprintln!("\n❌ Error: {}", e);
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .worklens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".worklens.toml");

    if path.exists() {
        eprintln!("⚠️  .worklens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .worklens.toml")?;

    println!("✅ Created .worklens.toml with default settings.");
    println!("   Edit it to customize format, active states, and the status root.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the chosen command.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // validate() guarantees a command is present past this point
    let command = args.command.clone().context("no command given")?;

    match command {
        Command::Active(query) => run_query(&args, config, &query, QueryKind::Active).await,
        Command::Stories(query) => run_query(&args, config, &query, QueryKind::Stories).await,
        Command::Sprint { all, json } => {
            run_sprints(config, all, json, args.output.as_deref()).await
        }
        Command::Status { root, json } => run_status(&config, root, json, args.output.as_deref()),
    }
}

/// Which WIQL view a query command uses.
enum QueryKind {
    Active,
    Stories,
}

/// Fetch, normalize, filter, aggregate, and render work items.
async fn run_query(
    args: &Args,
    mut config: Config,
    query: &QueryArgs,
    kind: QueryKind,
) -> Result<()> {
    // Connection is validated before any fetch or aggregation work
    config.connection = ConnectionConfig::from_env()?;
    let client = AzdoClient::from_config(&config)?;

    let wiql = match kind {
        QueryKind::Active => queries::active_work(&config.query.active_states),
        QueryKind::Stories => queries::user_stories(),
    };

    let ids = client.query_ids(&wiql).await?;
    let records = client.fetch_work_items(&ids, !args.quiet).await?;

    let mut items = normalize_batch(&records);
    filter_items(&mut items, &filter_options(query, &config));
    info!("{} work item(s) after filtering", items.len());

    let sprint = match kind {
        QueryKind::Active => current_sprint_label(&client).await,
        QueryKind::Stories => None,
    };

    let result = aggregate(&items, sprint);
    let now = Utc::now();

    let content = match query.effective_format(&config.general.format) {
        OutputFormat::Table => report::render_table(&result, query.group_by, now),
        OutputFormat::Json => format!("{}\n", report::render_json(&result)?),
        OutputFormat::Csv => report::render_csv(&result, now),
    };
    report::emit(args.output.as_deref(), &content)
}

/// The current sprint, for labeling output. A failure here only loses the
/// label, never the report.
async fn current_sprint_label(client: &AzdoClient) -> Option<SprintWindow> {
    match client.current_sprint().await {
        Ok(sprint) => sprint,
        Err(e) => {
            warn!("Could not determine current sprint: {}", e);
            None
        }
    }
}

/// List the team's sprints.
async fn run_sprints(
    mut config: Config,
    all: bool,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    config.connection = ConnectionConfig::from_env()?;
    let client = AzdoClient::from_config(&config)?;

    let timeframe = if all { None } else { Some("current") };
    let sprints = client.list_iterations(timeframe).await?;

    let content = if json {
        format!("{}\n", serde_json::to_string_pretty(&sprints)?)
    } else {
        report::render_sprints(&sprints)
    };
    report::emit(output, &content)
}

/// Scan the local planning tree. Needs no connection.
fn run_status(
    config: &Config,
    root: Option<PathBuf>,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let root = root.unwrap_or_else(|| PathBuf::from(&config.status.root));
    info!("Scanning planning tree at {}", root.display());

    let status_report = status::scan(&root)?;

    let content = if json {
        format!("{}\n", serde_json::to_string_pretty(&status_report)?)
    } else {
        report::render_status(&status_report)
    };
    report::emit(output, &content)
}

/// Translate CLI query flags into pre-aggregation filters.
fn filter_options(query: &QueryArgs, config: &Config) -> FilterOptions {
    FilterOptions {
        user: query.user.clone(),
        state: query.state.clone(),
        item_type: query.item_type.as_deref().map(WorkItemType::from),
        include_unassigned: !query.no_unassigned,
        limit: query.limit.or(config.general.limit),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            debug!("Loaded default config from .worklens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
