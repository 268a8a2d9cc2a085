//! Tabula Command-Line Interface
//!
//! Scans tables, shows their schemas, and adds or drops columns.
//!
//! # Usage
//!
//! ```bash
//! # Scan the first 10 rows of a table
//! tabula --fixture tables.json -t events scan --limit 10
//!
//! # Show a table's schema as JSON
//! tabula --fixture tables.json -t events -o json schema
//!
//! # Add a non-nullable column with a default
//! tabula --fixture tables.json -t events add-column score INT64 --default 0
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod fixture;
mod formatter;

use commands::Session;
use config::CliConfig;
use formatter::OutputFormat;

/// Tabula command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "tabula",
    author = "Tabula Team",
    version,
    about = "Command-line interface for Tabula",
    long_about = "Scan tables of a columnar table store into records, inspect their schemas,\n\
                  and add or drop columns."
)]
struct Args {
    /// Comma-separated master addresses
    #[arg(short = 'm', long, global = true, env = "TABULA_MASTERS")]
    masters: Option<String>,

    /// Table to operate on
    #[arg(short = 't', long, global = true, env = "TABULA_TABLE")]
    table: Option<String>,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON fixture of tables to serve from the in-memory store
    #[arg(long, global = true, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum)]
    output: Option<OutputFormatArg>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the table into records
    Scan {
        /// Maximum rows to return; negative returns every row
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Show the table's columns
    Schema,
    /// Add a column to the table
    AddColumn {
        /// Column name
        name: String,
        /// Column type (INT8, INT16, INT32, INT64, UNIXTIME_MICROS, BINARY, STRING, BOOL, FLOAT, DOUBLE)
        #[arg(value_name = "TYPE")]
        column_type: String,
        /// Allow nulls; the column is added without a default
        #[arg(long)]
        nullable: bool,
        /// Default for existing rows, as a JSON literal
        #[arg(long, value_name = "JSON")]
        default: Option<String>,
    },
    /// Drop a column from the table
    DropColumn {
        /// Column name
        name: String,
    },
    /// List the tables of the store
    Tables,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
    /// Display raw values
    Raw,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format: OutputFormat = match args.output {
        Some(arg) => arg.into(),
        None => config.output_format.parse()?,
    };

    let Some(fixture_path) = config.fixture.as_deref() else {
        bail!("no table store to talk to; pass --fixture FILE to serve tables from memory");
    };
    info!("Loading fixture: {}", fixture_path.display());
    let store = fixture::load(fixture_path)?;

    let session = Session::open(store, config.client.clone(), format)?;
    let output = match &args.command {
        Command::Scan { limit } => session.scan(limit.unwrap_or(config.default_limit))?,
        Command::Schema => session.schema()?,
        Command::AddColumn {
            name,
            column_type,
            nullable,
            default,
        } => session.add_column(name, column_type, *nullable, default.as_deref())?,
        Command::DropColumn { name } => session.drop_column(name)?,
        Command::Tables => session.tables(),
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tabula_cli=debug,tabula_client=debug")
    } else {
        EnvFilter::new("tabula_cli=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    // Command-line arguments win over the file
    if let Some(masters) = &args.masters {
        config.client.master_addresses =
            tabula_common::ClientConfig::for_masters(masters).master_addresses;
    }
    if let Some(table) = &args.table {
        config.client.default_table = Some(table.clone());
    }
    if let Some(fixture) = &args.fixture {
        config.fixture = Some(fixture.clone());
    }

    config.client.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let args = Args::try_parse_from([
            "tabula", "--fixture", "t.json", "-t", "T", "scan", "--limit", "-1",
        ])
        .unwrap();
        assert_eq!(args.table.as_deref(), Some("T"));
        assert!(matches!(args.command, Command::Scan { limit: Some(-1) }));
    }

    #[test]
    fn test_parse_add_column() {
        let args = Args::try_parse_from([
            "tabula", "add-column", "score", "INT64", "--default", "0", "-o", "json",
        ])
        .unwrap();
        match args.command {
            Command::AddColumn {
                name,
                column_type,
                nullable,
                default,
            } => {
                assert_eq!(name, "score");
                assert_eq!(column_type, "INT64");
                assert!(!nullable);
                assert_eq!(default.as_deref(), Some("0"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(matches!(args.output, Some(OutputFormatArg::Json)));
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        config::CliConfig::builder()
            .masters("file-master:7051")
            .table("from_file")
            .build()
            .save(&path)
            .unwrap();

        let args = Args::try_parse_from([
            "tabula",
            "--config",
            path.to_str().unwrap(),
            "--masters",
            "a:7051,b:7051",
            "schema",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.client.master_addresses, vec!["a:7051", "b:7051"]);
        if std::env::var_os("TABULA_TABLE").is_none() {
            assert_eq!(config.client.default_table.as_deref(), Some("from_file"));
        }
    }
}
