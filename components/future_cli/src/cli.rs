//! Command-line arguments

use async_runtime::{SchedulingMode, DEFAULT_MAX_TURNS};
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

/// Runs demonstration scenarios for the future runtime.
#[derive(Parser, Debug, Clone)]
#[command(name = "corten-future", version)]
pub struct Cli {
    /// Scenario to run; repeat to run several. Runs all when omitted
    #[arg(short = 's', long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// List available scenarios and exit
    #[arg(short, long)]
    pub list: bool,

    /// Queue that future reactions are scheduled on
    #[arg(long, value_enum, default_value_t = ModeArg::Macrotask)]
    pub mode: ModeArg,

    /// Report format
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Event-loop turn budget per scenario
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_TURNS)]
    pub max_turns: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log level selected by the `-v` count.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Command-line spelling of [`SchedulingMode`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// One reaction per event-loop turn
    Macrotask,
    /// Reactions drained after the current task
    Microtask,
}

impl From<ModeArg> for SchedulingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Macrotask => SchedulingMode::Macrotask,
            ModeArg::Microtask => SchedulingMode::Microtask,
        }
    }
}

/// Report format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable transcript
    Text,
    /// One JSON document
    Json,
}
