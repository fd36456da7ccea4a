use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    batch::BatchArgs, statistic::OnDateArgs, statistic::WindowArgs, summary::SummaryArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "querystat",
    version,
    about = "Aggregate statistics over query execution logs"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Average elapsed seconds of queries run on the UTC day of a timestamp.
    ElapsedTime(OnDateArgs),
    /// Average rows returned per second within a window.
    RowsPerSecond(WindowArgs),
    /// Average rows returned per distinct thread within a window.
    RowsPerThread(WindowArgs),
    /// Average number of threads busy per second within a window.
    ThreadsPerSecond(WindowArgs),
    /// Answer request targets, one per line, against a single loaded dataset.
    Batch(BatchArgs),
    Summary(SummaryArgs),
    /// Print the JSON schema of the statistic payload.
    Schema,
}
