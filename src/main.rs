//! filescope - catalog a directory tree into SQLite and rank files by how often a
//! search term occurs in them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Input;
use filescope::config::{self, Config, ConfigError};
use filescope::diagnostics::TracingDiagnostics;
use filescope::ftms::report::{ChartRenderer, TerminalChart};
use filescope::ftms::{run, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filescope", author, version, about)]
#[command(long_about = "Catalog every file under a directory into a SQLite database, then \
count how often a term occurs in each file's name and text.\n\n\
Values missing from flags and the config file are prompted for.\n\n\
Examples:\n  \
filescope run --root ~/docs --exclude .png,.jpg --term invoice\n  \
filescope ingest --root ~/docs\n  \
filescope search --term invoice --no-chart")]
struct Cli {
    /// Config file (defaults to <config dir>/filescope/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite catalog database.
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Never prompt; fail when a required value is missing.
    #[arg(long, global = true)]
    no_input: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Catalog a directory, then search it (the default).
    Run {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Catalog a directory only.
    Ingest {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Search the existing catalog only.
    Search {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Directory to catalog.
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Comma-separated extensions to skip, e.g. ".php,.txt" (matched as typed).
    #[arg(long, value_name = "EXTS")]
    exclude: Option<String>,
}

#[derive(Args, Debug, Default)]
struct SearchArgs {
    /// Term to count.
    #[arg(long)]
    term: Option<String>,

    /// Where to write the CSV export.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Skip the terminal bar chart.
    #[arg(long)]
    no_chart: bool,
}

struct Prompter {
    interactive: bool,
}

impl Prompter {
    fn ask(&self, given: Option<String>, prompt: &str, name: &'static str) -> Result<String> {
        if let Some(value) = given {
            return Ok(value);
        }
        if !self.interactive {
            return Err(ConfigError::Missing(name).into());
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("Failed to read {name}"))
    }
}

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = Config::load(cli.config.as_deref())?;
    init_logging(file_config.log_level.as_deref());

    let prompter = Prompter {
        interactive: !cli.no_input,
    };
    let (scan, search) = match cli.command {
        None => (Some(ScanArgs::default()), Some(SearchArgs::default())),
        Some(Command::Run { scan, search }) => (Some(scan), Some(search)),
        Some(Command::Ingest { scan }) => (Some(scan), None),
        Some(Command::Search { search }) => (None, Some(search)),
    };

    let database = cli
        .database
        .or_else(|| file_config.database.path.as_deref().map(config::expand_path))
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_DATABASE));

    let (root, excluded) = match scan {
        Some(args) => {
            let root = match args.root {
                Some(root) => root,
                None => config::expand_path(&prompter.ask(
                    file_config.scan.root.clone(),
                    "Enter the directory to search",
                    "root",
                )?),
            };
            let excluded = match (args.exclude, file_config.scan.exclude.clone()) {
                (Some(raw), _) => config::parse_exclusions(&raw),
                (None, Some(list)) => list,
                (None, None) if prompter.interactive => config::parse_exclusions(&prompter.ask(
                    None,
                    "Enter file types to exclude (comma separated, e.g., '.php,.txt')",
                    "exclude",
                )?),
                (None, None) => Vec::new(),
            };
            (Some(root), excluded)
        }
        None => (None, Vec::new()),
    };

    let (term, csv_path, show_chart) = match search {
        Some(args) => {
            let term = prompter.ask(args.term, "Enter the search string", "term")?;
            let csv_path = args
                .csv
                .or_else(|| file_config.report.csv_path.as_deref().map(config::expand_path))
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CSV));
            (Some(term), csv_path, file_config.report.chart && !args.no_chart)
        }
        None => (None, PathBuf::from(config::DEFAULT_CSV), false),
    };

    let pipeline = PipelineConfig {
        database,
        root,
        excluded,
        term,
        csv_path,
    };

    let renderer = TerminalChart::default();
    let chart: Option<&dyn ChartRenderer> = if show_chart { Some(&renderer) } else { None };

    run(&pipeline, &TracingDiagnostics, chart)?;
    Ok(())
}
