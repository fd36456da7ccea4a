#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use querystat::cli::app::{Cli, Command, RuntimeArgs};
use querystat::cli::commands;
use querystat::config::{DATASET_ENV_VAR, RuntimePaths};
use querystat::models::EnvelopeCommandFailure;
use querystat::routes::{RequestError, Statistic};
use querystat::stats::{QueryStatisticCalculator, RangeError, SchemaError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_SCHEMA_FAILURE: i32 = 2;
const EXIT_REQUEST_REJECTED: i32 = 3;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let command_name = command_name(&cli.command);
    eprintln!("querystat: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => {
            eprintln!("querystat: completed `{command_name}` (exit_code={EXIT_SUCCESS})");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            eprintln!("querystat: failed `{command_name}` (exit_code={exit_code})");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    // `schema` is the only command that runs without a dataset.
    let runtime = &cli.runtime;
    let load = || -> Result<(RuntimePaths, QueryStatisticCalculator)> {
        let runtime_paths = resolve_runtime_paths(runtime)?;
        let calculator = commands::load_calculator(&runtime_paths.dataset_path)?;
        Ok((runtime_paths, calculator))
    };

    match cli.command {
        Command::Schema => commands::print_payload_schema(),
        Command::ElapsedTime(args) => {
            let (_, calculator) = load()?;
            commands::statistic::run_on_date(&args, &calculator)
        }
        Command::RowsPerSecond(args) => {
            let (_, calculator) = load()?;
            commands::statistic::run_window(Statistic::RowsPerSecond, &args, &calculator)
        }
        Command::RowsPerThread(args) => {
            let (_, calculator) = load()?;
            commands::statistic::run_window(Statistic::RowsPerThread, &args, &calculator)
        }
        Command::ThreadsPerSecond(args) => {
            let (_, calculator) = load()?;
            commands::statistic::run_window(Statistic::ThreadsPerSecond, &args, &calculator)
        }
        Command::Batch(args) => {
            let (_, calculator) = load()?;
            commands::batch::run(&args, &calculator)
        }
        Command::Summary(args) => {
            let (runtime_paths, calculator) = load()?;
            commands::summary::run(&args, &runtime_paths.dataset_path, &calculator)
        }
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if cause.downcast_ref::<SchemaError>().is_some() {
            return EXIT_SCHEMA_FAILURE;
        }
        if cause.downcast_ref::<RequestError>().is_some()
            || cause.downcast_ref::<RangeError>().is_some()
            || cause.downcast_ref::<EnvelopeCommandFailure>().is_some()
        {
            return EXIT_REQUEST_REJECTED;
        }
    }

    EXIT_RUNTIME_FAILURE
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::ElapsedTime(_) => "elapsed-time",
        Command::RowsPerSecond(_) => "rows-per-second",
        Command::RowsPerThread(_) => "rows-per-thread",
        Command::ThreadsPerSecond(_) => "threads-per-second",
        Command::Batch(_) => "batch",
        Command::Summary(_) => "summary",
        Command::Schema => "schema",
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    let dataset_env = std::env::var_os(DATASET_ENV_VAR);
    let paths = querystat::config::resolve_runtime_paths(
        &home_dir,
        &cwd,
        args.dataset.as_deref(),
        dataset_env.as_deref(),
    )?;
    eprintln!(
        "config: dataset path={} source={}",
        paths.dataset_path.display(),
        paths.dataset_source.as_str()
    );
    Ok(paths)
}
