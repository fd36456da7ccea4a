use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::routes;
use crate::stats::QueryStatisticCalculator;

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// File with one request target per line; stdin when omitted.
    #[arg(long, value_name = "PATH")]
    pub requests: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub requests: usize,
    pub answered: usize,
    pub rejected: usize,
}

pub fn run(args: &BatchArgs, calculator: &QueryStatisticCalculator) -> Result<()> {
    let source = args
        .requests
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    eprintln!("batch: start requests={source}");

    let stdout = std::io::stdout();
    let report = match &args.requests {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open requests file: {}", path.display()))?;
            answer_requests(calculator, BufReader::new(file), stdout.lock())?
        }
        None => answer_requests(calculator, std::io::stdin().lock(), stdout.lock())?,
    };

    eprintln!(
        "batch: complete requests={} answered={} rejected={}",
        report.requests, report.answered, report.rejected
    );
    Ok(())
}

/// Writes `<status>\t<body>` for every request target read from `input`.
/// Blank lines and `#` comments are skipped; a rejected request does not stop
/// the batch.
pub fn answer_requests<R: BufRead, W: Write>(
    calculator: &QueryStatisticCalculator,
    input: R,
    mut output: W,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for line in input.lines() {
        let line = line.context("failed to read request line")?;
        let target = line.trim();
        if target.is_empty() || target.starts_with('#') {
            continue;
        }

        report.requests += 1;
        let response = routes::handle(calculator, target);
        if response.is_success() {
            report.answered += 1;
        } else {
            report.rejected += 1;
            eprintln!("batch: rejected status={} target={target}", response.status);
        }

        writeln!(output, "{}\t{}", response.status, response.body)
            .context("failed to write response")?;
    }

    output.flush().context("failed to flush responses")?;
    Ok(report)
}
