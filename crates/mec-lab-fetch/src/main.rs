use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

mod app_count;
mod campaign;
mod failure;
mod mec;
mod normal;

use campaign::{Campaign, CampaignOverride, RunSummary};

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract study CSVs from OMNeT++ result files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fault-free study scalars from results/Normal.
    Normal(CommonArgs),
    /// Per-time vector summary (with bucketed measured utility) from
    /// results/Normal.
    AppCount(CommonArgs),
    /// Link/node failure time series and recovery times from
    /// results/{LinkFailure,NodeFailure}.
    Failure(CommonArgs),
    /// Energy scalar sweep from results/Full-Test-MEC-1.
    Mec1(CommonArgs),
    /// Energy scalar sweep from results/Full-Test-MEC-2.
    Mec2(CommonArgs),
    /// Vector summary from results/AppCount-Test-MEC-1.
    MecAppCount(CommonArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory holding the simulator's result files.
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Directory the CSVs are written to (created if missing).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// TOML file overriding the campaign defaults.
    #[arg(long)]
    campaign: Option<PathBuf>,

    /// Write a JSON summary of the finished run.
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

impl CommonArgs {
    fn resolve(&self, default_results: &str, default_out: &str) -> Result<Campaign> {
        let overrides = self
            .campaign
            .as_deref()
            .map(CampaignOverride::load)
            .transpose()?;
        Campaign::resolve(
            default_results,
            default_out,
            self.results_dir.clone(),
            self.out_dir.clone(),
            overrides,
        )
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let (summary, args) = match &cli.command {
        Command::Normal(args) => {
            let campaign = args.resolve("results/Normal", "result-analysis/normal")?;
            (normal::run(&campaign)?, args)
        }
        Command::AppCount(args) => {
            let campaign = args.resolve("results/Normal", "result-analysis/normal")?;
            (app_count::run(&campaign)?, args)
        }
        Command::Failure(args) => {
            let campaign = args.resolve("results", "result-analysis/failure")?;
            (failure::run(&campaign)?, args)
        }
        Command::Mec1(args) => {
            let campaign = args.resolve("results/Full-Test-MEC-1", "result-analysis/mec1")?;
            (mec::run_mec1(&campaign)?, args)
        }
        Command::Mec2(args) => {
            let campaign = args.resolve("results/Full-Test-MEC-2", "result-analysis/mec2")?;
            (mec::run_mec2(&campaign)?, args)
        }
        Command::MecAppCount(args) => {
            let campaign = args.resolve("results/AppCount-Test-MEC-1", "result-analysis/mec1")?;
            (mec::run_app_count(&campaign)?, args)
        }
    };

    report(&summary);
    if let Some(path) = &args.summary_out {
        summary.write(path)?;
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    let rows: usize = summary.outputs.iter().map(|o| o.rows).sum();
    info!(
        campaign = summary.campaign,
        files_seen = summary.files_seen,
        outputs = summary.outputs.len(),
        rows,
        "all extractions complete"
    );
}
