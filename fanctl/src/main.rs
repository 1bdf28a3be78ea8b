use std::process::ExitCode;

use clap::Parser;
use fanctl::cli::{self, Args};

fn main() -> ExitCode {
    let args = Args::parse();
    fanctl::logging::init(args.verbose, args.journald);

    match cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{e:?}");
            eprintln!("error: {e:#}");
            ExitCode::from(cli::exit_code(&e))
        }
    }
}
