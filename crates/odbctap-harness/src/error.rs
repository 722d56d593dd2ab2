use std::panic::Location;

use odbctap_core::SqlReturn;
use thiserror::Error;

use crate::lifecycle::{SetupStep, TeardownStep};

/// A step of acquiring the shared handle chain failed; no test can run
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{step} returned {rc}")]
pub struct SetupError {
    pub step: SetupStep,
    pub rc: SqlReturn,
}

/// A step of releasing the handle chain failed; reported, never escalated
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{step} returned {rc}")]
pub struct TeardownFailure {
    pub step: TeardownStep,
    pub rc: SqlReturn,
}

/// A checked call inside a test body did not meet its expectation
///
/// Returned with `?` from the body, it ends that test as `not ok`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description} = {rc} at {location}")]
pub struct AssertionFailure {
    /// The checked call, as written in the diagnostics
    pub description: String,
    /// What the call returned
    pub rc: SqlReturn,
    /// The exact outcome that was required, for `expect_stmt`
    pub expected: Option<SqlReturn>,
    pub location: &'static Location<'static>,
}

/// Why a run ended without a complete report
#[derive(Error, Debug)]
pub enum RunError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("failed to write TAP report: {0}")]
    Io(#[from] std::io::Error),
}
