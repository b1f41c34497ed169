//! Corten Future CLI
//!
//! Entry point for the scenario runner. Parses CLI arguments, sets up
//! logging and delegates to the Runner.

use clap::Parser as ClapParser;
use future_cli::{Cli, CliError, CliResult, Runner};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => {}
        Err(CliError::Failed { failed, total }) => {
            eprintln!("{} of {} scenarios failed", failed, total);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG`, when set, takes precedence over `-v`.
fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_env("RUST_LOG")
        .init();
}

fn run(cli: &Cli) -> CliResult<()> {
    if cli.list {
        print!("{}", Runner::list());
        return Ok(());
    }

    let runner = Runner::new()
        .with_mode(cli.mode.into())
        .with_max_turns(cli.max_turns);
    let scenarios = runner.select(&cli.scenarios)?;
    log::debug!("running {} scenarios", scenarios.len());

    let summary = runner.run(&scenarios)?;
    println!("{}", summary.render(cli.format)?);
    summary.into_result()
}
