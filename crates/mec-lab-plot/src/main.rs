use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod app_count;
mod chart;
mod energy;
mod failure;
mod frame;
mod labels;
mod recovery;
mod stats;
mod utility;

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize extraction CSVs and render study charts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-scheme scalar means grouped by scheduling interval.
    Utility(UtilityCli),
    /// Energy savings per network quality level, J/s grouped bars.
    Energy(EnergyCli),
    /// Scheme comparison bucketed by pending application count.
    AppCount(AppCountCli),
    /// Utility ratio to the fault-free run during injection windows.
    Failure(FailureCli),
    /// Scheduler recovery time over failure probability.
    Recovery(RecoveryCli),
}

#[derive(Args, Debug)]
struct UtilityCli {
    /// `expected_utility_mean.csv` or `improved_utility_mean.csv` from the
    /// normal extraction.
    csv: PathBuf,

    /// Column to average per (interval, scheme).
    #[arg(long, default_value = "utility")]
    value_column: String,

    /// Y-axis label on the chart.
    #[arg(long, default_value = "Scheme Utility")]
    y_label: String,

    /// Scheme the percentage gaps are computed against.
    #[arg(long, default_value = "FastSA")]
    baseline: String,

    /// PNG file the chart is written to.
    #[arg(long, default_value = "utility.png")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct EnergyCli {
    /// Energy CSV (`algorithm,pilot,energy`) from a MEC extraction.
    csv: PathBuf,

    /// Offload-energy CSV to subtract before converting, yielding measured
    /// rather than expected savings.
    #[arg(long)]
    measured: Option<PathBuf>,

    /// Scheme the percentage gaps are computed against.
    #[arg(long, default_value = "SARound")]
    baseline: String,

    /// PNG file the chart is written to.
    #[arg(long, default_value = "energy.png")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct AppCountCli {
    /// `app_count_summary.csv` from an extraction run.
    csv: PathBuf,

    /// Column to average per (load range, scheme).
    #[arg(long, default_value = "savedEnergy:vector")]
    value_column: String,

    /// Divisor applied to the raw values; 10000 turns per-window
    /// millijoules into J/s.
    #[arg(long, default_value_t = 1.0)]
    divisor: f64,

    /// Y-axis label on the chart.
    #[arg(long, default_value = "Energy Saving (J/s)")]
    y_label: String,

    /// Scheme the percentage gaps are computed against.
    #[arg(long, default_value = "FastSA")]
    baseline: String,

    /// PNG file the chart is written to.
    #[arg(long, default_value = "app_count.png")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FailureCli {
    /// `link_failure_data.csv` from the failure extraction.
    link_csv: PathBuf,

    /// `node_failure_data.csv` from the failure extraction.
    node_csv: PathBuf,

    /// Fault-free run extracted in the same format.
    base_csv: PathBuf,

    /// Width of one failure-injection window in simulated seconds.
    #[arg(long, default_value_t = 50.0)]
    interval: f64,

    /// PNG file the chart is written to.
    #[arg(long, default_value = "failure.png")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RecoveryCli {
    /// `link_recovery_time.csv` from the failure extraction.
    link_csv: PathBuf,

    /// `node_recovery_time.csv` from the failure extraction.
    node_csv: PathBuf,

    /// PNG file the chart is written to.
    #[arg(long, default_value = "recovery.png")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Utility(args) => utility::run(&utility::UtilityArgs {
            csv: args.csv,
            value_column: args.value_column,
            y_label: args.y_label,
            out: args.out,
            baseline: args.baseline,
        }),
        Command::Energy(args) => energy::run(&energy::EnergyArgs {
            csv: args.csv,
            measured: args.measured,
            out: args.out,
            baseline: args.baseline,
        }),
        Command::AppCount(args) => app_count::run(&app_count::AppCountArgs {
            csv: args.csv,
            value_column: args.value_column,
            divisor: args.divisor,
            y_label: args.y_label,
            out: args.out,
            baseline: args.baseline,
        }),
        Command::Failure(args) => failure::run(&failure::FailureArgs {
            link_csv: args.link_csv,
            node_csv: args.node_csv,
            base_csv: args.base_csv,
            interval: args.interval,
            out: args.out,
        }),
        Command::Recovery(args) => recovery::run(&recovery::RecoveryArgs {
            link_csv: args.link_csv,
            node_csv: args.node_csv,
            out: args.out,
        }),
    }
}
