//! reviewdiff - structured git diff review for the command line.

use std::process::ExitCode;

use clap::Parser;

use reviewdiff::cli::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
