//! fabseq CLI
//!
//! Runs the numbering core against a JSON model snapshot:
//! - `trace`: walk the connector network from the seed parts and list what
//!   would be numbered
//! - `number`: assign labels and write them back into the snapshot

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use fabseq_core::{
    collect_network, run_numbering, select_seeds, FabseqError, NumberingConfig, RunSummary,
    StartNumber, VisitRecord, DEFAULT_NUMBER_ATTRIBUTE, DEFAULT_TRACE_ATTRIBUTE,
};
use fabseq_model::{PartRef, SnapshotModel};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fabseq")]
#[command(
    author,
    version,
    about = "Sequence numbering for connected fabrication parts"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `FABSEQ_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the parts reachable from the seeds, in visit order, with their
    /// geometry signatures.
    Trace {
        #[command(flatten)]
        input: ModelArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Number the parts reachable from the seeds and write the labels back.
    Number(NumberArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Model snapshot (JSON)
    #[arg(short, long)]
    model: PathBuf,
    /// Seed part id (repeatable). Only fabrication parts are accepted.
    #[arg(long = "seed", required = true)]
    seeds: Vec<u64>,
    /// Parameter holding the angle of bent parts
    #[arg(long, default_value = fabseq_model::DEFAULT_ANGLE_PARAMETER)]
    angle_parameter: String,
}

#[derive(Args)]
struct NumberArgs {
    #[command(flatten)]
    input: ModelArgs,
    /// Label prefix
    #[arg(short, long)]
    branch: String,
    /// First number, as typed; leading zeros set the padding width
    #[arg(short, long)]
    start: String,
    #[arg(long, default_value = DEFAULT_NUMBER_ATTRIBUTE)]
    number_attribute: String,
    #[arg(long, default_value = DEFAULT_TRACE_ATTRIBUTE)]
    trace_attribute: String,
    /// Append `---{signature}` to every label
    #[arg(long)]
    embed_signature: bool,
    /// Where to write the updated snapshot (defaults to the input file)
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Compute labels without writing the snapshot
    #[arg(long)]
    dry_run: bool,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TraceReport {
    seeds: Vec<PartRef>,
    records: Vec<VisitRecord>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("FABSEQ_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Trace { input, json } => cmd_trace(&input, json),
        Commands::Number(args) => cmd_number(args),
    }
}

fn load_model(path: &Path, angle_parameter: &str) -> Result<SnapshotModel> {
    let model = SnapshotModel::load(path)
        .with_context(|| format!("failed to load model snapshot {}", path.display()))?;
    Ok(model.with_angle_parameter(angle_parameter))
}

fn seed_refs(seeds: &[u64]) -> Vec<PartRef> {
    seeds.iter().copied().map(PartRef).collect()
}

fn warn_empty_selection() {
    eprintln!("{} no elements selected", "warning:".yellow().bold());
}

fn cmd_trace(input: &ModelArgs, json: bool) -> Result<()> {
    let model = load_model(&input.model, &input.angle_parameter)?;
    let seeds = select_seeds(&model, &seed_refs(&input.seeds))?;

    let records = match collect_network(&model, &seeds) {
        Ok(records) => records,
        Err(FabseqError::EmptySelection) => {
            warn_empty_selection();
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        let report = TraceReport { seeds, records };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for record in &records {
            println!("{}\t{}", record.part, record.signature);
        }
        let numbered = records.iter().filter(|r| !r.is_sentinel()).count();
        eprintln!(
            "{} {} parts reached ({} to number)",
            "ok".green().bold(),
            records.len(),
            numbered
        );
    }
    Ok(())
}

fn cmd_number(args: NumberArgs) -> Result<()> {
    let mut model = load_model(&args.input.model, &args.input.angle_parameter)?;
    let start = StartNumber::parse(&args.start)
        .ok_or_else(|| anyhow!("start number `{}` is not a whole number", args.start))?;
    let config = NumberingConfig::new(args.branch, start)
        .with_attributes(args.number_attribute, args.trace_attribute)
        .with_embedded_signature(args.embed_signature);

    let summary = match run_numbering(&mut model, &seed_refs(&args.input.seeds), &config) {
        Ok(summary) => summary,
        Err(FabseqError::EmptySelection) => {
            warn_empty_selection();
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if args.dry_run {
        eprintln!("{} dry run, snapshot not written", "info:".yellow().bold());
        return Ok(());
    }
    let out = args.out.unwrap_or(args.input.model);
    model
        .save(&out)
        .with_context(|| format!("failed to write model snapshot {}", out.display()))?;
    eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let report = &summary.report;
    for assignment in &report.assignments {
        println!(
            "{}\t{}\t{}",
            assignment.part, assignment.label, assignment.signature
        );
    }
    for skipped in &report.skipped {
        eprintln!(
            "{} {} `{}`: {}",
            "skipped".yellow().bold(),
            skipped.part,
            skipped.attribute,
            skipped.reason
        );
    }
    eprintln!(
        "{} labelled {} of {} parts ({} distinct signatures, {} skipped)",
        "ok".green().bold(),
        report.processed,
        summary.visited.len(),
        report.distinct_signatures,
        report.skipped_parts()
    );
}
