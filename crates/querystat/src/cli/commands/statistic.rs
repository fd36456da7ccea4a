use anyhow::{Context, Error, Result};
use clap::Args;
use serde_json::json;

use crate::models::{EnvelopeCommandFailure, ResponseEnvelope};
use crate::routes::{
    FINISH_TIMESTAMP_PARAM, START_TIMESTAMP_PARAM, Statistic, StatisticRequest,
    TIMESTAMP_PARAM,
};
use crate::stats::QueryStatisticCalculator;

#[derive(Debug, Clone, Args)]
pub struct OnDateArgs {
    #[arg(long, value_name = "MS", allow_hyphen_values = true)]
    pub timestamp: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    #[arg(long, value_name = "MS", allow_hyphen_values = true)]
    pub start_timestamp: String,

    #[arg(long, value_name = "MS", allow_hyphen_values = true)]
    pub finish_timestamp: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run_on_date(args: &OnDateArgs, calculator: &QueryStatisticCalculator) -> Result<()> {
    run(
        Statistic::ElapsedTime,
        &[(TIMESTAMP_PARAM, args.timestamp.as_str())],
        args.json,
        calculator,
    )
}

pub fn run_window(
    statistic: Statistic,
    args: &WindowArgs,
    calculator: &QueryStatisticCalculator,
) -> Result<()> {
    run(
        statistic,
        &[
            (START_TIMESTAMP_PARAM, args.start_timestamp.as_str()),
            (FINISH_TIMESTAMP_PARAM, args.finish_timestamp.as_str()),
        ],
        args.json,
        calculator,
    )
}

fn run(
    statistic: Statistic,
    params: &[(&str, &str)],
    json_output: bool,
    calculator: &QueryStatisticCalculator,
) -> Result<()> {
    let command = format!("stat.{}", statistic.name());
    let answer = StatisticRequest::from_params(statistic, |name| {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    })
    .and_then(|request| request.evaluate(calculator));

    let answer = match answer {
        Ok(answer) => answer,
        Err(error) if json_output => {
            let mut envelope = ResponseEnvelope::error(&command, error.code(), error.to_string())
                .with_meta("status", json!(error.status()));
            if let Some(details) = error.details() {
                envelope = envelope.with_error_details(details);
            }
            return Err(Error::new(EnvelopeCommandFailure::new(envelope)));
        }
        Err(error) => return Err(Error::new(error)),
    };

    if json_output {
        let payload = serde_json::to_value(answer.payload())
            .context("failed to encode statistic payload")?;
        let envelope = ResponseEnvelope::ok(&command, payload)
            .with_meta("status", json!(200))
            .with_meta("value_defined", json!(answer.value.is_finite()))
            .with_meta("merged_records", json!(calculator.summary().merged_records));
        let encoded =
            serde_json::to_string(&envelope).context("failed to encode response envelope")?;
        println!("{encoded}");
    } else {
        println!("{}", answer.sentence);
    }

    Ok(())
}
