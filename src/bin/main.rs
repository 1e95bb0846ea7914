//! modelsmith CLI - Generate entity models from a database catalog
//!
//! Usage:
//!   modelsmith generate [--sqlite <db> | --snapshot <json> | --connection <name>] [--out <dir>]
//!   modelsmith inspect  [source] [--json]
//!   modelsmith snapshot [source] --out <file.json>
//!
//! Without a source flag the default connection from modelsmith.toml is used,
//! then the MODELSMITH_DB_* environment variables.
//!
//! Examples:
//!   modelsmith generate --sqlite ./shop.db --out src/models
//!   modelsmith inspect --connection production
//!   modelsmith snapshot --connection production --out shop.json

use clap::{Args, Parser, Subcommand, ValueEnum};
use modelsmith::catalog::{CatalogFacade, CatalogSource, SnapshotCatalog, SqliteCatalog};
use modelsmith::config::{ConnectionConfig, ConnectionError, Driver, Settings, SettingsError};
use modelsmith::model::Pluralization;
use modelsmith::pipeline::{Generator, GeneratorOptions};
use modelsmith::GenerateError;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "modelsmith")]
#[command(about = "modelsmith - Generate entity models and relationships from a database catalog")]
#[command(version)]
struct Cli {
    /// Path to a modelsmith.toml (overrides the default search)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate model files and init-models.ts
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory (default: [output].dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Collection property pluralization (default: [output].pluralization)
        #[arg(long)]
        pluralization: Option<PluralizationArg>,

        /// Fetch all metadata concurrently before classifying
        #[arg(long)]
        prefetch: bool,
    },

    /// Print every table's classified relationships
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Print entity descriptions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Capture the catalog into a JSON snapshot
    Snapshot {
        #[command(flatten)]
        source: SourceArgs,

        /// Snapshot file to write
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Read the catalog of a SQLite database file
    #[arg(long, conflicts_with_all = ["snapshot", "connection"])]
    sqlite: Option<PathBuf>,

    /// Replay a JSON catalog snapshot
    #[arg(long, conflicts_with = "connection")]
    snapshot: Option<PathBuf>,

    /// Named connection from modelsmith.toml
    #[arg(short, long)]
    connection: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PluralizationArg {
    /// Append "s"
    Suffix,
    /// English rules
    English,
}

impl From<PluralizationArg> for Pluralization {
    fn from(arg: PluralizationArg) -> Self {
        match arg {
            PluralizationArg::Suffix => Pluralization::Suffix,
            PluralizationArg::English => Pluralization::English,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("Failed to serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[cfg(not(feature = "mysql"))]
    #[error("MySQL support is not compiled in; rebuild with --features mysql")]
    MySqlDisabled,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    modelsmith::logging::init_tracing(&cli.log_level);

    let result = match load_settings(cli.config.as_ref()) {
        Ok(settings) => run(cli.command, settings).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

async fn run(command: Commands, settings: Settings) -> Result<(), CliError> {
    match command {
        Commands::Generate {
            source,
            out,
            pluralization,
            prefetch,
        } => cmd_generate(&settings, source, out, pluralization, prefetch).await,
        Commands::Inspect { source, json } => cmd_inspect(&settings, source, json).await,
        Commands::Snapshot { source, out } => cmd_snapshot(&settings, source, out).await,
    }
}

/// Resolve the catalog source named on the command line, falling back to
/// the default connection and then to the environment.
async fn open_source(
    settings: &Settings,
    args: &SourceArgs,
) -> Result<Arc<dyn CatalogSource>, CliError> {
    if let Some(path) = &args.sqlite {
        return Ok(Arc::new(SqliteCatalog::open(path)?));
    }
    if let Some(path) = &args.snapshot {
        return Ok(Arc::new(SnapshotCatalog::load(path)?));
    }

    let config = match &args.connection {
        Some(name) => settings.get_connection(name)?.resolve()?,
        None => match settings.default_connection() {
            Some((name, conn)) => {
                tracing::info!(connection = name, "using default connection");
                conn.resolve()?
            }
            None => ConnectionConfig::from_env()?,
        },
    };
    connect(&config, Duration::from_secs(settings.catalog.timeout_secs)).await
}

async fn connect(
    config: &ConnectionConfig,
    timeout: Duration,
) -> Result<Arc<dyn CatalogSource>, CliError> {
    match config.driver {
        Driver::Sqlite => Ok(Arc::new(SqliteCatalog::open(&config.host)?)),
        #[cfg(feature = "mysql")]
        Driver::MySql => Ok(Arc::new(
            modelsmith::catalog::MySqlCatalog::connect(config, timeout).await?,
        )),
        #[cfg(not(feature = "mysql"))]
        Driver::MySql => {
            let _ = timeout;
            Err(CliError::MySqlDisabled)
        }
    }
}

async fn open_facade(settings: &Settings, args: &SourceArgs) -> Result<CatalogFacade, CliError> {
    let source = open_source(settings, args).await?;
    Ok(CatalogFacade::open(source, settings.catalog.facade_options()).await?)
}

/// Generator options from settings, with command-line overrides.
fn generator_options(
    settings: &Settings,
    pluralization: Option<PluralizationArg>,
    prefetch: bool,
) -> GeneratorOptions {
    GeneratorOptions {
        pluralization: pluralization
            .map(Pluralization::from)
            .unwrap_or(settings.output.pluralization),
        emit: settings.output.emit_config(),
        prefetch: prefetch || settings.catalog.prefetch,
    }
}

async fn cmd_generate(
    settings: &Settings,
    source: SourceArgs,
    out: Option<PathBuf>,
    pluralization: Option<PluralizationArg>,
    prefetch: bool,
) -> Result<(), CliError> {
    let facade = open_facade(settings, &source).await?;
    let generator = Generator::new(generator_options(settings, pluralization, prefetch));

    let cancel = generator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling after the current table");
            cancel.cancel();
        }
    });

    let output = generator.run(&facade).await?;
    let dir = out.unwrap_or_else(|| settings.output.dir.clone());
    let written = output.write_to(&dir)?;

    println!("Generated {} files in {}", written.len(), dir.display());
    println!("digest: {}", output.digest);
    Ok(())
}

async fn cmd_inspect(settings: &Settings, source: SourceArgs, json: bool) -> Result<(), CliError> {
    let facade = open_facade(settings, &source).await?;
    let generator = Generator::new(generator_options(settings, None, false));
    let output = generator.run(&facade).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output.entities)?);
        return Ok(());
    }

    for entity in &output.entities {
        println!("{} ({})", entity.table, entity.entity_name);
        if entity.relationships.is_empty() {
            println!("  (no relationships)");
        }
        for rel in &entity.relationships {
            let mut line = format!(
                "  {} -> {}  {}  {}",
                rel.edge.source_column, rel.edge.target_table, rel.kind, rel.property_name
            );
            if let Some(through) = &rel.through {
                line.push_str(&format!("  through {}", through));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

async fn cmd_snapshot(settings: &Settings, source: SourceArgs, out: PathBuf) -> Result<(), CliError> {
    let facade = open_facade(settings, &source).await?;
    let snapshot = facade.prefetch().await?;

    fs::write(&out, snapshot.to_json()?).map_err(|source| CliError::Write {
        path: out.clone(),
        source,
    })?;
    println!(
        "Captured {} tables into {}",
        snapshot.tables().len(),
        out.display()
    );
    Ok(())
}
