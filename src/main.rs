#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use equipment_report::config::{AppConfig, load_config};
use equipment_report::history_cmd::HistoryFormat;
use equipment_report::{ReportResult, history_cmd, ingest_cmd, report_cmd, show_cmd};

#[derive(Parser, Debug)]
#[command(name = "equipment-report")]
#[command(about = "Summarize equipment sensor CSVs and render typeset reports", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or YAML with a .yaml/.yml extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset store file (overrides config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Number of datasets retained (overrides config)
    #[arg(long, global = true)]
    retention_limit: Option<usize>,

    /// Enable verbose logging (or set EQUIPMENT_REPORT_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and summarize a CSV file, then retain it
    Ingest {
        /// CSV with Equipment Name, Type, Flowrate, Pressure, Temperature
        csv: PathBuf,
        /// Dataset name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Write the JSON response to this file instead of stdout
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// List retained datasets, newest first
    History {
        /// Print as JSON
        #[arg(long, conflicts_with = "csv")]
        json: bool,
        /// Print as CSV
        #[arg(long)]
        csv: bool,
        /// Write the listing to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the summary of a retained dataset
    Show {
        /// Dataset id
        id: u64,
    },

    /// Render a retained dataset to a PDF report
    Report {
        /// Dataset id
        id: u64,
        /// Output file
        #[arg(long, default_value = report_cmd::DEFAULT_OUTPUT)]
        out: PathBuf,
        /// Report template (overrides config)
        #[arg(long)]
        template: Option<PathBuf>,
        /// Compiler executable (overrides config)
        #[arg(long)]
        compiler: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("EQUIPMENT_REPORT_LOG").unwrap_or_else(|_| {
        if verbose {
            "equipment_report=debug".to_string()
        } else {
            "equipment_report=info".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn resolve_config(cli: &Cli) -> ReportResult<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }
    if let Some(limit) = cli.retention_limit {
        config.retention_limit = limit;
    }
    if let Commands::Report {
        template, compiler, ..
    } = &cli.command
    {
        if let Some(template) = template {
            config.template_path = template.clone();
        }
        if let Some(compiler) = compiler {
            config.compiler_path = Some(compiler.clone());
        }
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> ReportResult<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Ingest { csv, name, json } => ingest_cmd::run(&config, csv, name, json),
        Commands::History { json, csv, out } => {
            let format = if json {
                HistoryFormat::Json
            } else if csv {
                HistoryFormat::Csv
            } else {
                HistoryFormat::Table
            };
            history_cmd::run(&config, format, out)
        }
        Commands::Show { id } => show_cmd::run(&config, id),
        Commands::Report { id, out, .. } => report_cmd::run(&config, id, Some(out)),
    }
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        let code = if e.is_not_found() { 2 } else { 1 };
        std::process::exit(code);
    }
}
