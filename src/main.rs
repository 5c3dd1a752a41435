use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use docstore_sqlite::config::{ConfigError, LogFormat, LoggingConfig};
use docstore_sqlite::dump::{self, DumpError};
use docstore_sqlite::{Config, SqliteStorage, Storage, StoreError, Value};

const DEFAULT_PATH: &str = "docstore.sqlite";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Dump error: {0}")]
    Dump(#[from] DumpError),
}

#[derive(Parser)]
#[command(name = "docstore")]
#[command(about = "Inspect and edit a SQLite-backed document store")]
struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true, env = "DOCSTORE_PATH")]
    path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `docstore_sqlite=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tables
    Tables,

    /// List the keys of a table in insertion order
    Keys {
        /// Name of the table
        table: String,
    },

    /// Print a value as JSON
    Get {
        /// Name of the table
        table: String,

        /// Key of the value
        key: String,

        /// Prefix the output with the stored type tag
        #[arg(long)]
        typed: bool,
    },

    /// Store a JSON value under a key
    Set {
        /// Name of the table
        table: String,

        /// Key for the value
        key: String,

        /// JSON text; scalars are stored as their native type
        #[arg(long)]
        json: String,
    },

    /// Delete a key from a table
    Delete {
        /// Name of the table
        table: String,

        /// Key to delete
        key: String,
    },

    /// Drop a table
    Drop {
        /// Name of the table
        table: String,
    },

    /// Print the whole store as tagged JSON
    Dump,

    /// Replace the whole store with the contents of a dump
    Load {
        /// JSON file shaped like `{"table": {"key": {"type": tag, "value": payload}}}`
        file: PathBuf,
    },
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(&config.logging)?;

    let mut storage = SqliteStorage::with_config(&config.storage)?;
    run(cli.command, &mut storage)?;
    storage.close()?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = match &cli.config {
        Some(file) => Config::from_file(file)?,
        None => Config::for_path(DEFAULT_PATH),
    };
    if let Some(path) = &cli.path {
        config.storage.path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_new(&config.level).map_err(|e| AppError::InvalidFilter(e.to_string()))?;

    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
    Ok(())
}

fn run(command: Commands, storage: &mut SqliteStorage) -> Result<(), AppError> {
    match command {
        Commands::Tables => {
            let names = storage.table_names()?;
            if names.is_empty() {
                println!("No tables found");
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
            Ok(())
        }
        Commands::Keys { table } => {
            let store = storage.table(&table)?;
            if !store.exists()? {
                eprintln!("Table '{}' not found", table);
                std::process::exit(1);
            }
            for key in store.keys() {
                println!("{}", key?);
            }
            Ok(())
        }
        Commands::Get { table, key, typed } => {
            let store = storage.table(&table)?;
            if !store.exists()? {
                eprintln!("Table '{}' not found", table);
                std::process::exit(1);
            }
            match store.get(&key) {
                Ok(value) => {
                    if typed {
                        println!("{}\t{}", value.type_tag(), value.to_json());
                    } else {
                        println!("{}", value.to_json());
                    }
                    Ok(())
                }
                Err(e) if e.is_key_not_found() => {
                    eprintln!("Key '{}' not found in table '{}'", key, table);
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Set { table, key, json } => {
            let value = Value::from(serde_json::from_str::<serde_json::Value>(&json)?);
            let store = storage.table(&table)?;
            store.create_table()?;
            store.set(&key, &value)?;
            println!("Set '{}' in table '{}' as {}", key, table, value.type_tag());
            Ok(())
        }
        Commands::Delete { table, key } => {
            let store = storage.table(&table)?;
            if store.exists()? && store.delete(&key)? {
                println!("Deleted '{}' from table '{}'", key, table);
            } else {
                eprintln!("Key '{}' not found in table '{}'", key, table);
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Drop { table } => {
            let mut snapshot = storage.read()?;
            if snapshot.remove(&table).is_none() {
                eprintln!("Table '{}' not found", table);
                std::process::exit(1);
            }
            storage.write_report(snapshot)?;
            println!("Dropped table '{}'", table);
            Ok(())
        }
        Commands::Dump => {
            let snapshot = storage.read()?;
            println!("{}", serde_json::to_string_pretty(&dump::dump(&snapshot))?);
            Ok(())
        }
        Commands::Load { file } => {
            let text = std::fs::read_to_string(&file)?;
            let snapshot = dump::load(serde_json::from_str(&text)?)?;
            let report = storage.write_report(snapshot)?;
            println!(
                "Loaded {} table(s): {} created, {} dropped",
                report.overwritten.len(),
                report.created.len(),
                report.dropped.len()
            );
            Ok(())
        }
    }
}
