//! Future runtime CLI library
//!
//! Provides the argument parser, the scenario catalogue and the runner
//! behind the `corten-future` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runtime;
pub mod scenarios;

pub use cli::{Cli, FormatArg, ModeArg};
pub use error::{CliError, CliResult};
pub use runtime::{Runner, RunSummary};
pub use scenarios::{Scenario, ScenarioReport, SCENARIOS};
