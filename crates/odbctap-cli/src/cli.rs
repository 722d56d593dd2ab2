//! odbctap - run ODBC conformance tests and report them as TAP
//!
//! Usage: odbctap [DSN [UID [PWD]]] [OPTIONS]
//!
//! Exit codes:
//!   0 - The report was written, whatever the test results
//!   1 - The driver manager could not be loaded, the connection could not
//!       be set up, or the report could not be written

mod app;
mod args;
mod logging;

use std::io;
use std::process::ExitCode;

use clap::Parser;

use crate::args::Args;
use crate::logging::LoggingConfig;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = logging::init(&LoggingConfig::from_args(&args)) {
        eprintln!("odbctap: {:#}", err);
        return ExitCode::FAILURE;
    }

    match app::run(&args, io::stdout().lock()) {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "run aborted");
            eprintln!("odbctap: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
