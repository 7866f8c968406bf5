#![allow(clippy::cargo_common_metadata)]
use rec_driver::{
    cli,
    core::{CatalogRecommender, Driver, Launch},
    error::{ABORT_EXIT_CODE, DriverError},
    setup_logging,
};
use std::{io, process::ExitCode};
use tracing::error;

const PROGRAM: &str = "rec-driver";

fn main() -> ExitCode {
    // Parse command line arguments; hooks are installed first
    let parsed = match Driver::new(PROGRAM).parse(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => return abort(&err),
    };

    // Setup logging based on debug flag
    if let Err(err) = setup_logging(parsed.options().debug) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match parsed.launch(CatalogRecommender::create) {
        Ok(Launch::Version(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Ok(Launch::Help(text)) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Ok(Launch::Ready(session)) => {
            let stdout = io::stdout();
            let stderr = io::stderr();
            match cli::execute_dry_run(&session, &mut stdout.lock(), &mut stderr.lock()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    error!("{:#}", err);
                    ExitCode::from(ABORT_EXIT_CODE)
                }
            }
        }
        Err(err) => abort(&err),
    }
}

/// Report a user or configuration error and pick the abort status
fn abort(err: &DriverError) -> ExitCode {
    match err {
        // clap renders its own "error:" prefix and trailing newline
        DriverError::Options { .. } => eprint!("{err}"),
        DriverError::UnexpectedArgument { usage, .. } => eprintln!("error: {err}\n\n{usage}"),
        _ => eprintln!("error: {err}"),
    }
    ExitCode::from(err.exit_code())
}
