use clap::Parser;
use std::process::ExitCode;

use sizesort::cli::{Cli, run};
use sizesort::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
