use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tally_import::{ImportSummary, project};
use tally_ingest::{ExtractedDocument, ParseOutcome, StatementParser};

mod batch;
mod config;
mod output;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "tally", version = VERSION, about = "Credit-card statement parser and importer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse one statement and print the result as JSON
    Parse {
        /// The statement PDF
        #[arg(long)]
        pdf: PathBuf,

        /// Extractor output for the PDF (page/fragment JSON)
        #[arg(long)]
        text_runs: PathBuf,

        /// Statement format id (default: from config)
        #[arg(long)]
        format: Option<String>,

        #[arg(long)]
        pretty: bool,
    },

    /// Parse one statement and write importable transactions
    Import {
        #[arg(long)]
        pdf: PathBuf,

        #[arg(long)]
        text_runs: PathBuf,

        /// Account the transactions are imported into
        #[arg(long)]
        account: String,

        #[arg(long)]
        format: Option<String>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Import every statement in a directory (`x.pdf` + `x.json` pairs)
    Batch {
        #[arg(long)]
        dir: PathBuf,

        #[arg(long)]
        account: String,

        #[arg(long)]
        format: Option<String>,

        /// CSV output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List known statement formats
    Formats,

    /// Write ~/.tally/config.toml with the built-in format
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Parse {
            pdf,
            text_runs,
            format,
            pretty,
        } => {
            let parser = statement_parser(format.as_deref())?;
            let outcome = parse_one(&parser, &pdf, &text_runs)?;
            let json = if pretty {
                serde_json::to_string_pretty(&outcome)?
            } else {
                serde_json::to_string(&outcome)?
            };
            println!("{json}");
        }

        Command::Import {
            pdf,
            text_runs,
            account,
            format,
            output,
            json,
        } => {
            let parser = statement_parser(format.as_deref())?;
            let outcome = parse_one(&parser, &pdf, &text_runs)?;
            let records = project(&outcome.statement, &account);

            let out = output::open_output(output.as_deref())?;
            if json {
                output::write_json(out, &records)?;
            } else {
                output::write_csv(out, &records)?;
            }
            eprintln!("{}", ImportSummary::new(records.len(), outcome.skipped_entries()));
        }

        Command::Batch {
            dir,
            account,
            format,
            output,
        } => {
            if !dir.is_dir() {
                bail!("not a directory: {}", dir.display());
            }
            let parser = statement_parser(format.as_deref())?;
            let files = batch::discover(&dir)?;
            if files.is_empty() {
                bail!("no statement pairs (x.pdf + x.json) in {}", dir.display());
            }
            let count = files.len();
            let (records, summary) = batch::run(parser, files, &account).await?;

            output::write_csv(output::open_output(output.as_deref())?, &records)?;
            eprintln!("{count} statements: {summary}");
        }

        Command::Formats => {
            let cfg = config::load_config()?;
            for id in cfg.registry().ids() {
                let marker = if id == cfg.default_format { " (default)" } else { "" };
                println!("{id}{marker}");
            }
        }

        Command::InitConfig => {
            config::init_config()?;
        }
    }

    Ok(())
}

fn statement_parser(requested: Option<&str>) -> Result<StatementParser> {
    let cfg = config::load_config()?;
    let id = cfg.format_id(requested);
    cfg.registry()
        .parser(id)
        .with_context(|| format!("loading statement format {id:?}"))
}

pub(crate) fn load_statement(pdf: &Path, text_runs: &Path) -> Result<(Vec<u8>, ExtractedDocument)> {
    let bytes = fs::read(pdf).with_context(|| format!("read {}", pdf.display()))?;
    let s = fs::read_to_string(text_runs).with_context(|| format!("read {}", text_runs.display()))?;
    let doc = serde_json::from_str(&s).with_context(|| format!("parse {}", text_runs.display()))?;
    Ok((bytes, doc))
}

fn parse_one(parser: &StatementParser, pdf: &Path, text_runs: &Path) -> Result<ParseOutcome> {
    let (bytes, doc) = load_statement(pdf, text_runs)?;
    let outcome = parser
        .parse(&bytes, &doc)
        .with_context(|| format!("parsing {}", pdf.display()))?;
    for warning in outcome.warnings() {
        log::warn!("{}: {warning:?}", pdf.display());
    }
    Ok(outcome)
}
