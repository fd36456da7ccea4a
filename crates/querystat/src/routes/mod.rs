use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde_json::{Value, json};
use url::Url;

use crate::models::StatisticPayload;
use crate::stats::{QueryStatisticCalculator, RangeError};
use crate::utils::time::{format_date, format_datetime, parse_millis};

const BASE_URL: &str = "http://localhost/";

pub const TIMESTAMP_PARAM: &str = "timestamp";
pub const START_TIMESTAMP_PARAM: &str = "start_timestamp";
pub const FINISH_TIMESTAMP_PARAM: &str = "finish_timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    ElapsedTime,
    RowsPerSecond,
    RowsPerThread,
    ThreadsPerSecond,
}

impl Statistic {
    pub const ALL: [Self; 4] = [
        Self::ElapsedTime,
        Self::RowsPerSecond,
        Self::RowsPerThread,
        Self::ThreadsPerSecond,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ElapsedTime => "elapsed_time",
            Self::RowsPerSecond => "rows_per_second",
            Self::RowsPerThread => "rows_per_thread",
            Self::ThreadsPerSecond => "thread_per_second",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.strip_prefix('/')?;
        Self::ALL.into_iter().find(|statistic| statistic.name() == name)
    }

    #[must_use]
    pub const fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::ElapsedTime => &[TIMESTAMP_PARAM],
            Self::RowsPerSecond | Self::RowsPerThread | Self::ThreadsPerSecond => {
                &[START_TIMESTAMP_PARAM, FINISH_TIMESTAMP_PARAM]
            }
        }
    }
}

/// Why a request could not be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    MalformedTarget { target: String, message: String },
    UnknownRoute { path: String },
    MissingParameter { name: &'static str },
    InvalidParameter { name: &'static str, message: String },
    Range(RangeError),
    Render { message: String },
}

impl RequestError {
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::UnknownRoute { .. } => 404,
            _ => 400,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedTarget { .. } => "malformed_target",
            Self::UnknownRoute { .. } => "unknown_route",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::Range(_) => "range_error",
            Self::Render { .. } => "render_failed",
        }
    }

    /// Structured fields for the JSON error envelope.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        let details = match self {
            Self::MalformedTarget { target, .. } => json!({ "target": target }),
            Self::UnknownRoute { path } => json!({ "path": path }),
            Self::MissingParameter { name } | Self::InvalidParameter { name, .. } => {
                json!({ "parameter": name })
            }
            Self::Range(RangeError::OutOfBounds {
                timestamp,
                min_start,
                max_finish,
            }) => json!({
                "timestamp": timestamp,
                "min_start": min_start,
                "max_finish": max_finish,
            }),
            Self::Range(RangeError::EmptyWindow { timestamp }) => {
                json!({ "start_timestamp": timestamp, "finish_timestamp": timestamp })
            }
            Self::Range(RangeError::InvertedWindow { start, finish }) => {
                json!({ "start_timestamp": start, "finish_timestamp": finish })
            }
            Self::Render { .. } => return None,
        };
        Some(details)
    }

    /// Body text returned to the caller.
    #[must_use]
    pub fn response_body(&self) -> String {
        match self {
            Self::MissingParameter { name } => {
                format!("Error! \"{name}\" GET argument is required")
            }
            Self::UnknownRoute { path } => format!("Error! Unknown endpoint \"{path}\""),
            _ => format!("Error! Wrong input. Exception message: [{self}]"),
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedTarget { target, message } => {
                write!(f, "cannot parse request target \"{target}\": {message}")
            }
            Self::UnknownRoute { path } => write!(f, "unknown endpoint \"{path}\""),
            Self::MissingParameter { name } => write!(f, "\"{name}\" GET argument is required"),
            Self::InvalidParameter { name, message } => write!(f, "{name}: {message}"),
            Self::Range(error) => Display::fmt(error, f),
            Self::Render { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Range(error) => Some(error),
            _ => None,
        }
    }
}

impl From<RangeError> for RequestError {
    fn from(error: RangeError) -> Self {
        Self::Range(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticRequest {
    ElapsedTime { timestamp: i64 },
    RowsPerSecond { start: i64, finish: i64 },
    RowsPerThread { start: i64, finish: i64 },
    ThreadsPerSecond { start: i64, finish: i64 },
}

impl StatisticRequest {
    /// Builds a request from raw parameter values. Parameters are looked up in
    /// declaration order, so the first missing or malformed one is reported.
    pub fn from_params<'a>(
        statistic: Statistic,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<Self, RequestError> {
        let mut values = Vec::with_capacity(2);
        for &name in statistic.parameters() {
            let raw = lookup(name).ok_or(RequestError::MissingParameter { name })?;
            let value = parse_millis(raw).map_err(|error| RequestError::InvalidParameter {
                name,
                message: format!("{error:#}"),
            })?;
            values.push(value);
        }

        let request = match (statistic, values.as_slice()) {
            (Statistic::ElapsedTime, &[timestamp]) => Self::ElapsedTime { timestamp },
            (Statistic::RowsPerSecond, &[start, finish]) => Self::RowsPerSecond { start, finish },
            (Statistic::RowsPerThread, &[start, finish]) => Self::RowsPerThread { start, finish },
            (Statistic::ThreadsPerSecond, &[start, finish]) => {
                Self::ThreadsPerSecond { start, finish }
            }
            _ => {
                return Err(RequestError::Render {
                    message: format!("unexpected parameter count for {}", statistic.name()),
                });
            }
        };

        Ok(request)
    }

    #[must_use]
    pub const fn statistic(self) -> Statistic {
        match self {
            Self::ElapsedTime { .. } => Statistic::ElapsedTime,
            Self::RowsPerSecond { .. } => Statistic::RowsPerSecond,
            Self::RowsPerThread { .. } => Statistic::RowsPerThread,
            Self::ThreadsPerSecond { .. } => Statistic::ThreadsPerSecond,
        }
    }

    pub fn evaluate(self, calculator: &QueryStatisticCalculator) -> Result<StatisticAnswer, RequestError> {
        let value = match self {
            Self::ElapsedTime { timestamp } => {
                calculator.average_elapsed_seconds_on_date(timestamp)?
            }
            Self::RowsPerSecond { start, finish } => {
                calculator.average_rows_per_second(start, finish)?
            }
            Self::RowsPerThread { start, finish } => {
                calculator.average_rows_per_thread(start, finish)?
            }
            Self::ThreadsPerSecond { start, finish } => {
                calculator.average_threads_per_second(start, finish)?
            }
        };

        let sentence = render_sentence(self, value).map_err(|error| RequestError::Render {
            message: format!("{error:#}"),
        })?;

        Ok(StatisticAnswer {
            request: self,
            value,
            sentence,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticAnswer {
    pub request: StatisticRequest,
    pub value: f64,
    pub sentence: String,
}

impl StatisticAnswer {
    #[must_use]
    pub fn payload(&self) -> StatisticPayload {
        let (timestamp, start_timestamp, finish_timestamp) = match self.request {
            StatisticRequest::ElapsedTime { timestamp } => (Some(timestamp), None, None),
            StatisticRequest::RowsPerSecond { start, finish }
            | StatisticRequest::RowsPerThread { start, finish }
            | StatisticRequest::ThreadsPerSecond { start, finish } => {
                (None, Some(start), Some(finish))
            }
        };

        StatisticPayload {
            statistic: self.request.statistic().name().to_string(),
            value: self.value.is_finite().then_some(self.value),
            timestamp,
            start_timestamp,
            finish_timestamp,
            sentence: self.sentence.clone(),
        }
    }
}

fn render_sentence(request: StatisticRequest, value: f64) -> anyhow::Result<String> {
    let value = render_value(value);
    let sentence = match request {
        StatisticRequest::ElapsedTime { timestamp } => format!(
            "The average elapsed time for all queries on {timestamp} ({}) is {value} seconds",
            format_date(timestamp)?
        ),
        StatisticRequest::RowsPerSecond { start, finish } => format!(
            "The average per second number of rows returned from all queries during {} is {value}",
            render_window(start, finish)?
        ),
        StatisticRequest::RowsPerThread { start, finish } => format!(
            "The average per thread number of rows returned from all queries during {} is {value}",
            render_window(start, finish)?
        ),
        StatisticRequest::ThreadsPerSecond { start, finish } => format!(
            "The average per second number of threads executing at the same during {} is {value}",
            render_window(start, finish)?
        ),
    };

    Ok(sentence)
}

/// Three decimals; an undefined mean reads `nan`.
fn render_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    format!("{value:.3}")
}

fn render_window(start: i64, finish: i64) -> anyhow::Result<String> {
    Ok(format!(
        "{start} ({}) and {finish} ({})",
        format_datetime(start)?,
        format_datetime(finish)?
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Answers one request target such as `/elapsed_time?timestamp=1571356830600`.
#[must_use]
pub fn handle(calculator: &QueryStatisticCalculator, target: &str) -> Response {
    match route(calculator, target) {
        Ok(body) => Response { status: 200, body },
        Err(error) => {
            eprintln!("routes: [{error}] during [{}] processing", target.trim());
            Response {
                status: error.status(),
                body: error.response_body(),
            }
        }
    }
}

pub fn route(calculator: &QueryStatisticCalculator, target: &str) -> Result<String, RequestError> {
    let (path, params) = parse_target(target)?;
    if path == "/" {
        return Ok(index_body());
    }

    let statistic = Statistic::from_path(&path).ok_or(RequestError::UnknownRoute { path })?;
    let request = StatisticRequest::from_params(statistic, |name| params.get(name).map(String::as_str))?;

    Ok(request.evaluate(calculator)?.sentence)
}

/// Splits a target into its path and query parameters. The first occurrence
/// of a repeated parameter wins.
fn parse_target(target: &str) -> Result<(String, BTreeMap<String, String>), RequestError> {
    let malformed = |error: url::ParseError| RequestError::MalformedTarget {
        target: target.to_string(),
        message: error.to_string(),
    };
    let url = Url::parse(BASE_URL)
        .and_then(|base| base.join(target.trim()))
        .map_err(malformed)?;

    let mut params = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    Ok((url.path().to_string(), params))
}

fn index_body() -> String {
    let endpoints = Statistic::ALL
        .iter()
        .map(|statistic| {
            let query = statistic
                .parameters()
                .iter()
                .map(|name| format!("{name}=<ms>"))
                .collect::<Vec<_>>()
                .join("&");
            format!("/{}?{query}", statistic.name())
        })
        .collect::<Vec<_>>();
    format!("Endpoints: {}", endpoints.join(" "))
}
