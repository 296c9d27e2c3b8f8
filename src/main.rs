//! Ledgerite main entry point

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerite_config::Config;
use ledgerite_core::{
    build_expression, CoreError, DefaultErrorLogger, ErrorContext, ErrorLogger, Ledger, Query,
};
use ledgerite_parser::DefaultJournalParser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use commands::Renderer;

#[derive(Parser, Debug)]
#[command(name = "ledgerite")]
#[command(version, about = "Balance and register reports for plain-text ledger journals", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Journal file; replaces the files listed in the config when given
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Price database, read before the journal files
    #[arg(long, value_name = "FILE")]
    price_db: Option<PathBuf>,

    /// Comma separated sort terms, e.g. "-d"
    #[arg(short = 'S', long)]
    sort: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Account balances as a tree
    #[command(visible_alias = "bal")]
    Balance { filter: Vec<String> },
    /// Selected postings with a running total
    #[command(visible_aliases = ["reg", "r"])]
    Register { filter: Vec<String> },
    /// Matching transactions in journal format
    Print { filter: Vec<String> },
    /// Write the default configuration to stdout
    DefaultConfig,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Balance { .. } => "balance",
            Command::Register { .. } => "register",
            Command::Print { .. } => "print",
            Command::DefaultConfig => "default-config",
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    if !args.files.is_empty() {
        config.journal.files = args.files.clone();
    }
    if args.price_db.is_some() {
        config.journal.price_db = args.price_db.clone();
    }
    if args.sort.is_some() {
        config.report.sort = args.sort.clone();
    }
    Ok(config)
}

fn init_logging(config: &Config) {
    env_logger::Builder::new()
        .parse_filters(&config.logging.level)
        .parse_default_env()
        .init();
}

fn build_query(filter: &[String]) -> Result<Query, CoreError> {
    if filter.is_empty() {
        return Ok(Query::MatchAll);
    }
    Ok(build_expression(&filter.join(" "))?)
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(&args)?;
    init_logging(&config);
    log::debug!(
        "Running {} over {} journal file(s)",
        args.command.name(),
        config.journal.files.len()
    );

    let context = ErrorContext::new(args.command.name());
    let result = report(&args.command, config);
    if let Err(error) = &result {
        DefaultErrorLogger.log_error(error, &context);
    }
    let Some(output) = result? else {
        return Ok(ExitCode::FAILURE);
    };

    write_report(&mut io::stdout().lock(), &output).context("writing report to stdout")?;
    Ok(ExitCode::SUCCESS)
}

/// Write the report, stopping quietly once the reader has gone away
fn write_report(out: &mut impl Write, output: &str) -> io::Result<()> {
    match writeln!(out, "{}", output) {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}

fn open_ledger(config: Config) -> Result<Ledger, CoreError> {
    let mut ledger = Ledger::new(config, Arc::new(DefaultJournalParser))?;
    ledger.load()?;
    Ok(ledger)
}

/// Print every unbalanced transaction; true if there were any
fn report_unbalanced(ledger: &Ledger) -> Result<bool, CoreError> {
    let unbalanced = ledger.unbalanced_transactions()?;
    for transaction in &unbalanced {
        eprintln!("ERROR! Transaction unbalanced: {}", transaction.header());
    }
    Ok(!unbalanced.is_empty())
}

/// Render the report for `command`; `None` when the journal does not balance
fn report(command: &Command, config: Config) -> Result<Option<String>, CoreError> {
    let renderer = Renderer::from(&config.report);

    let output = match command {
        Command::Balance { filter } => {
            let ledger = open_ledger(config)?;
            if report_unbalanced(&ledger)? {
                return Ok(None);
            }
            renderer.balance(&ledger.balance_report(&build_query(filter)?)?)
        }
        Command::Register { filter } => {
            let ledger = open_ledger(config)?;
            if report_unbalanced(&ledger)? {
                return Ok(None);
            }
            renderer.register(&ledger.register_report(&build_query(filter)?)?)
        }
        Command::Print { filter } => {
            let ledger = open_ledger(config)?;
            commands::print::render(&ledger.print_report(&build_query(filter)?)?)
        }
        Command::DefaultConfig => Config::generate_default().trim_end().to_string(),
    };
    Ok(Some(output))
}
