#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dataset;
pub mod models;
pub mod routes;
pub mod stats;
pub mod utils;

pub use cli::app::{Cli, Command};
pub use stats::{QueryStatisticCalculator, RangeError, SchemaError};
