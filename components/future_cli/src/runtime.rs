//! Scenario orchestration
//!
//! The Runner owns the event-loop configuration chosen on the command line
//! and gives every scenario a fresh loop built from it.

use crate::cli::FormatArg;
use crate::error::{CliError, CliResult};
use crate::scenarios::{self, Scenario, ScenarioReport, SCENARIOS};
use async_runtime::{EventLoop, SchedulingMode, DEFAULT_MAX_TURNS};
use serde::Serialize;
use std::fmt::Write as _;
use std::rc::Rc;

/// Runs scenarios under one event-loop configuration.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    mode: SchedulingMode,
    max_turns: usize,
}

impl Runner {
    /// Create a runner with macrotask scheduling and the default turn budget.
    ///
    /// # Example
    /// ```
    /// use async_runtime::SchedulingMode;
    /// use future_cli::Runner;
    ///
    /// let runner = Runner::new().with_mode(SchedulingMode::Microtask);
    /// let scenarios = runner.select(&["ordering".to_string()]).unwrap();
    /// let summary = runner.run(&scenarios).unwrap();
    /// assert!(summary.all_passed());
    /// ```
    pub fn new() -> Self {
        Self {
            mode: SchedulingMode::default(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Set the scheduling mode
    pub fn with_mode(mut self, mode: SchedulingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the per-scenario turn budget
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Resolves scenario names; no names means every scenario.
    ///
    /// # Errors
    /// Returns `CliError::UnknownScenario` for the first name that matches
    /// nothing.
    pub fn select(&self, names: &[String]) -> CliResult<Vec<&'static Scenario>> {
        if names.is_empty() {
            return Ok(SCENARIOS.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                scenarios::find(name).ok_or_else(|| CliError::UnknownScenario(name.clone()))
            })
            .collect()
    }

    /// Runs each scenario on its own event loop.
    ///
    /// # Errors
    /// Returns `CliError::Runtime` if an event loop fails, for instance by
    /// exceeding its turn budget.
    pub fn run(&self, scenarios: &[&Scenario]) -> CliResult<RunSummary> {
        let reports = scenarios
            .iter()
            .map(|scenario| scenario.run(self.event_loop()))
            .collect::<CliResult<Vec<_>>>()?;
        Ok(RunSummary {
            mode: self.mode.to_string(),
            max_turns: self.max_turns,
            reports,
        })
    }

    fn event_loop(&self) -> Rc<EventLoop> {
        Rc::new(
            EventLoop::new()
                .with_mode(self.mode)
                .with_max_turns(self.max_turns),
        )
    }

    /// The `--list` output: one scenario per line.
    pub fn list() -> String {
        let width = SCENARIOS.iter().map(|s| s.name.len()).max().unwrap_or(0);
        SCENARIOS.iter().fold(String::new(), |mut out, scenario| {
            let _ = writeln!(
                out,
                "{:width$}  {}",
                scenario.name,
                scenario.description,
                width = width
            );
            out
        })
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Reports of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Scheduling mode used
    pub mode: String,
    /// Turn budget used
    pub max_turns: usize,
    /// One report per scenario, in run order
    pub reports: Vec<ScenarioReport>,
}

impl RunSummary {
    /// Number of scenarios with failed checks
    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| !r.passed).count()
    }

    /// True when every scenario passed
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Converts failed checks into `CliError::Failed`.
    pub fn into_result(self) -> CliResult<()> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(CliError::Failed {
                failed,
                total: self.reports.len(),
            }),
        }
    }

    /// Renders the summary in the requested format.
    pub fn render(&self, format: FormatArg) -> CliResult<String> {
        match format {
            FormatArg::Json => Ok(serde_json::to_string_pretty(self)?),
            FormatArg::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            let status = if report.passed { "ok" } else { "FAILED" };
            let _ = writeln!(
                out,
                "== {} [{}] ({} tasks, {}ms)",
                report.name, status, report.tasks_run, report.elapsed_ms
            );
            for line in &report.output {
                let _ = writeln!(out, "   {}", line);
            }
            for failure in &report.failures {
                let _ = writeln!(out, "   ! {}", failure);
            }
        }
        let _ = write!(
            out,
            "{} of {} scenarios passed ({} mode)",
            self.reports.len() - self.failed(),
            self.reports.len(),
            self.mode
        );
        out
    }
}
