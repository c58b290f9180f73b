//! starschema CLI - load agency data and query the star schema
//!
//! Usage:
//!   starschema load [--archive <zip>] [--member <name>] [--csv <file>]
//!   starschema detail [-p NAME=VALUE]... [--explain]
//!   starschema summary [-p NAME=VALUE]... [--explain]
//!   starschema report [-p PL_START_YEAR=YYYY] [-p PL_END_YEAR=YYYY] [-o <file>]
//!   starschema catalog
//!
//! Examples:
//!   starschema load --archive data/agencyperformance.zip
//!   starschema detail -p PROD_LINE=Auto -p STATE_ABBR=OH
//!   starschema summary -p VENDOR=Applied --explain
//!   starschema report -p PL_START_YEAR=2010 -o report.csv

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use starschema::config::Settings;
use starschema::export::write_csv;
use starschema::ingest::{extract_csv, read_csv_path};
use starschema::logging::{init_logging, LogConfig, LogFormat};
use starschema::prelude::*;

#[derive(Parser)]
#[command(name = "starschema")]
#[command(about = "Normalize agency performance data into a star schema and query it")]
#[command(version)]
struct Cli {
    /// Config file (defaults to STARSCHEMA_CONFIG, ./starschema.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the raw extract and rebuild the star schema
    Load {
        /// ZIP archive holding the extract
        #[arg(long, conflicts_with = "csv")]
        archive: Option<PathBuf>,

        /// CSV member inside the archive
        #[arg(long)]
        member: Option<String>,

        /// Plain CSV file instead of an archive
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Every fact row matching the filters, as JSON
    Detail(QueryArgs),

    /// Totals and averages over matching fact rows, as JSON
    Summary(QueryArgs),

    /// Premium totals per agency and product line, as CSV
    Report {
        #[command(flatten)]
        query: QueryArgs,

        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the accepted filter parameters and their owning tables
    Catalog,
}

#[derive(Args)]
struct QueryArgs {
    /// Filter parameter as NAME=VALUE (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Print the composed SQL with values inlined instead of running it
    #[arg(long)]
    explain: bool,
}

impl QueryArgs {
    fn filter_params(&self) -> FilterParams {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }
}

/// The subcommands answered with a JSON [`QueryResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonQuery {
    Detail,
    Summary,
}

impl JsonQuery {
    fn endpoint(self) -> Endpoint {
        match self {
            JsonQuery::Detail => Endpoint::Detail,
            JsonQuery::Summary => Endpoint::Summary,
        }
    }

    fn respond<S: Store>(
        self,
        service: &QueryService<S>,
        params: &FilterParams,
    ) -> Result<QueryResponse, ServiceError> {
        match self {
            JsonQuery::Detail => service.detail(params),
            JsonQuery::Summary => service.summary(params),
        }
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = if cli.verbose > 0 {
        LogConfig::from_verbosity(cli.verbose)
    } else {
        LogConfig::from_level_name(&settings.logging.level)
    }
    .with_format(cli.log_format.unwrap_or(settings.logging.format));
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = match &cli.command {
        Commands::Load {
            archive,
            member,
            csv,
        } => cmd_load(&cli, &settings, archive.clone(), member.clone(), csv.clone()),
        Commands::Detail(args) => cmd_query(&cli, &settings, JsonQuery::Detail, args),
        Commands::Summary(args) => cmd_query(&cli, &settings, JsonQuery::Summary, args),
        Commands::Report { query, output } => cmd_report(&cli, &settings, query, output.as_ref()),
        Commands::Catalog => cmd_catalog(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ServiceError>() {
            Some(service_error @ ServiceError::Param(_)) => {
                let body = serde_json::to_string(&service_error.body())
                    .unwrap_or_else(|_| service_error.to_string());
                eprintln!("{body}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    Ok(settings)
}

fn open_store(cli: &Cli, settings: &Settings) -> Result<SqliteStore> {
    let dialect = settings.database.dialect()?;
    if dialect != Dialect::Sqlite {
        bail!("the bundled store only executes sqlite statements, config selects {dialect}");
    }
    let path = match &cli.database {
        Some(path) => path.clone(),
        None => settings.database.resolved_path()?,
    };
    SqliteStore::open(&path).with_context(|| format!("open database {}", path.display()))
}

fn cmd_load(
    cli: &Cli,
    settings: &Settings,
    archive: Option<PathBuf>,
    member: Option<String>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let raw = match csv {
        Some(path) => read_csv_path(&path)?,
        None => {
            let archive = match archive {
                Some(path) => path,
                None => settings.ingest.resolved_archive()?,
            };
            let member = member.unwrap_or_else(|| settings.ingest.member.clone());
            extract_csv(&archive, &member)?
        }
    };

    let mut store = open_store(cli, settings)?;
    let target = LoadTarget {
        raw_table: Some(settings.ingest.raw_table.clone()),
        ..LoadTarget::default()
    };
    let summary = load(&mut store, &raw, &target)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_query(cli: &Cli, settings: &Settings, query: JsonQuery, args: &QueryArgs) -> Result<()> {
    let params = args.filter_params();
    if args.explain {
        return explain(settings, query.endpoint(), &params);
    }

    let service = QueryService::new(open_store(cli, settings)?)?;
    let response = query.respond(&service, &params)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut out, &response)?;
    writeln!(out)?;
    Ok(())
}

fn cmd_report(
    cli: &Cli,
    settings: &Settings,
    args: &QueryArgs,
    output: Option<&PathBuf>,
) -> Result<()> {
    let params = args.filter_params();
    if args.explain {
        return explain(settings, Endpoint::Report, &params);
    }

    let service = QueryService::new(open_store(cli, settings)?)?;
    let report = service.report(&params)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create report file {}", path.display()))?;
            write_csv(&report, BufWriter::new(file))?;
        }
        None => write_csv(&report, io::stdout().lock())?,
    }
    Ok(())
}

fn explain(settings: &Settings, endpoint: Endpoint, params: &FilterParams) -> Result<()> {
    let planner = RequestPlanner::new(settings.database.dialect()?)?;
    let statement = planner.plan(endpoint, params)?;
    println!("{}", statement.interpolated());
    Ok(())
}

fn cmd_catalog() -> Result<()> {
    let catalog = starschema::agency::parameter_catalog()?;
    let width = catalog.entries().map(|(name, _)| name.len()).max().unwrap_or(0);

    println!("{:<width$}  TABLE", "PARAMETER");
    for (name, table) in catalog.entries() {
        println!("{name:<width$}  {table}");
    }
    Ok(())
}
