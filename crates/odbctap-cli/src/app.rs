//! What the binary does once its arguments are parsed

use std::io::{self, Write};

use anyhow::Context;
use odbctap_core::Driver;
use odbctap_driver_odbc::OdbcDriver;
use odbctap_harness::{RunError, RunSummary, Runner, TestRegistry};

use crate::args::Args;

/// The registered tests narrowed by `--filter`
pub fn select_tests(args: &Args) -> TestRegistry {
    let registry = odbctap_suite::basics();
    match &args.filter {
        Some(pattern) => registry.filtered(pattern),
        None => registry,
    }
}

/// Write one test name per line
pub fn list_tests(registry: &TestRegistry, out: &mut impl Write) -> io::Result<()> {
    for name in registry.names() {
        writeln!(out, "{}", name)?;
    }
    out.flush()
}

/// List or run the selected tests, returning the process exit status
pub fn run(args: &Args, mut out: impl Write) -> anyhow::Result<u8> {
    let registry = select_tests(args);
    if args.list {
        list_tests(&registry, &mut out).context("failed to write test list")?;
        return Ok(0);
    }

    let driver = OdbcDriver::load(args.driver_manager.as_deref())
        .context("failed to load the ODBC driver manager")?;
    run_tests(&driver, args, &registry, out)
}

/// Run `registry` on `driver` with the credentials from `args`
pub fn run_tests(
    driver: &dyn Driver,
    args: &Args,
    registry: &TestRegistry,
    out: impl Write,
) -> anyhow::Result<u8> {
    let credentials = args.credentials();
    tracing::info!(dsn = %credentials.dsn, uid = %credentials.uid, tests = registry.len(), "starting run");
    exit_status(Runner::new(driver, credentials).run(registry, out))
}

/// Exit status of a finished run
///
/// Failed tests are reported in the TAP stream and do not change the
/// status; only a run that could not set up or write its report fails.
pub fn exit_status(result: Result<RunSummary, RunError>) -> anyhow::Result<u8> {
    match result {
        Ok(summary) => {
            if !summary.teardown.is_clean() {
                tracing::warn!(
                    failures = summary.teardown.failures.len(),
                    "handles were not released cleanly"
                );
            }
            Ok(0)
        }
        Err(RunError::Setup(err)) => {
            Err(anyhow::Error::new(err).context("could not set up the shared connection"))
        }
        Err(RunError::Io(err)) => Err(anyhow::Error::new(err).context("failed to write TAP report")),
    }
}
