mod cli;
mod inspect;
mod process;

use clap::Parser;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::process::ExitCode;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = TermLogger::init(
        cli.loglevel,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Couldn't initialize logger: {}", e);
    }

    let result = match cli.command {
        Commands::Process(args) => process::run_process(args).map(|complete| {
            if !complete {
                log::warn!("Not all requested frames were processed");
            }
            complete
        }),
        Commands::Inspect(args) => inspect::run_inspect(args).map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
