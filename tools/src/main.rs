//! daybatch: raw data generator and pipeline inspector for the daily ELT batch.
//!
//! Usage:
//!   daybatch generate --ds 2024-12-12 --ts 2024-12-12T06:00:00+00:00 --save-locally
//!   daybatch cleanup raw_users.csv raw_transactions.csv
//!   daybatch plan --config data/generator.json

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use daybatch_core::{
    cleanup::remove_raw_files,
    config::BatchConfig,
    context::ExecutionContext,
    dataset::RawDataset,
    generator::RawDataGenerator,
    id::date_key,
    pipeline::challenge_pipeline,
    types::RecordCategory,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "daybatch", version, about = "Daily raw data batch")]
struct Cli {
    /// JSON config; built-in defaults when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate users, preferences and transactions for one simulated day.
    Generate {
        /// Simulated date, YYYY-MM-DD. Needs --ts as well.
        #[arg(long, requires = "ts")]
        ds: Option<String>,
        /// Simulated timestamp, ISO-8601 with optional offset.
        #[arg(long, requires = "ds")]
        ts: Option<String>,
        /// Master seed. Defaults to the simulated date as YYYYMMDD.
        #[arg(long)]
        seed: Option<u64>,
        /// Exact number of new users instead of a draw from the config range.
        #[arg(long)]
        users: Option<usize>,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Write raw_*.csv files into --out-dir.
        #[arg(long)]
        save_locally: bool,
        /// Print each table as CSV to stdout.
        #[arg(long)]
        print: bool,
        /// Fail the run if any integrity check does not hold.
        #[arg(long)]
        verify: bool,
    },
    /// Remove local raw files; the three defaults when none are given.
    Cleanup {
        files: Vec<PathBuf>,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print the pipeline task graph in execution order.
    Plan,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };

    match cli.command {
        Command::Generate {
            ds,
            ts,
            seed,
            users,
            data_dir,
            out_dir,
            save_locally,
            print,
            verify,
        } => {
            let ctx = match (ds, ts) {
                (Some(ds), Some(ts)) => ExecutionContext::from_scheduler(&ds, &ts)?,
                _ => ExecutionContext::fixture(),
            };
            let seed = seed.unwrap_or_else(|| date_key(ctx.date()));
            run_generate(&config, &ctx, seed, users, &data_dir, &out_dir, save_locally, print, verify)
        }
        Command::Cleanup { files, dir } => {
            let report = remove_raw_files(&dir, &files)?;
            println!("removed: {}", report.removed.len());
            for missing in &report.missing {
                println!("missing: {}", missing.display());
            }
            Ok(())
        }
        Command::Plan => print_plan(&config),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_generate(
    config: &BatchConfig,
    ctx: &ExecutionContext,
    seed: u64,
    users: Option<usize>,
    data_dir: &Path,
    out_dir: &Path,
    save_locally: bool,
    print: bool,
    verify: bool,
) -> Result<()> {
    println!("daybatch generate");
    println!("  date:      {}", ctx.date());
    println!("  timestamp: {}", ctx.timestamp());
    println!("  seed:      {seed}");
    println!("  data_dir:  {}", data_dir.display());
    println!();

    let generator = RawDataGenerator::from_data_dir(config.generator.clone(), data_dir)?;
    let dataset = match users {
        Some(n) => generator.generate_with_count(ctx, seed, n)?,
        None => generator.generate(ctx, seed)?,
    };

    let violations = dataset.verify(generator.config());
    for v in &violations {
        log::error!("integrity: {v}");
    }
    if verify && !violations.is_empty() {
        bail!("{} integrity violations", violations.len());
    }

    if print {
        print_tables(&dataset)?;
    }
    if save_locally {
        for path in dataset.write_csv(out_dir)? {
            println!("  wrote {}", path.display());
        }
    }
    print_summary(&dataset);
    Ok(())
}

fn print_tables(dataset: &RawDataset) -> Result<()> {
    for category in RecordCategory::ALL {
        println!("=== {} ===", category.raw_file_name());
        print!("{}", dataset.table_to_string(category)?);
        println!();
    }
    Ok(())
}

fn print_summary(dataset: &RawDataset) {
    let today = dataset.context.date();
    let current_day = dataset
        .transactions
        .iter()
        .filter(|t| t.transaction_date == today)
        .count();
    let net_cents: i64 = dataset.transactions.iter().map(|t| t.amount.cents()).sum();

    println!("=== RUN SUMMARY ===");
    println!("  users:            {}", dataset.users.len());
    println!("  preferences:      {}", dataset.preferences.len());
    println!("  transactions:     {}", dataset.transactions.len());
    println!("    current day:    {current_day}");
    println!("    prior days:     {}", dataset.transactions.len() - current_day);
    println!("  net amount:       {:.2}", net_cents as f64 / 100.0);
}

fn print_plan(config: &BatchConfig) -> Result<()> {
    let pipeline = challenge_pipeline(&config.pipeline)?;
    let settings = &pipeline.settings;
    let project = pipeline.dbt_project();

    println!("=== {} ({}) ===", settings.dag_id, settings.display_name);
    println!("  schedule:         {}", settings.schedule);
    println!("  start date:       {}", settings.start_date);
    println!("  max active runs:  {}", settings.max_active_runs);
    println!("  max active tasks: {}", settings.max_active_tasks);
    println!();

    for task in pipeline.graph.topological_order()? {
        let upstream: Vec<String> = pipeline
            .graph
            .upstream(&task.id)?
            .iter()
            .map(|t| t.id.clone())
            .collect();
        println!("[{}] {}", task.layer, task.id);
        if !upstream.is_empty() {
            println!("    after: {}", upstream.join(", "));
        }
        match task.operator.render_command(&project) {
            Some(cmd) => println!("    $ {cmd}"),
            None => println!("    {}", task.operator.describe()),
        }
    }
    Ok(())
}
