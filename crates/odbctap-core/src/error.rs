//! Error types for the driver boundary

use thiserror::Error;

use crate::SqlReturn;

/// The driver could not supply a diagnostic record for a known failure
///
/// `rc` is the outcome of the diagnostic call itself (typically `NO_DATA`
/// when no record exists, or `INVALID_HANDLE`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no diagnostic record available (SQLGetDiagRec returned {rc})")]
pub struct DiagnosticUnavailable {
    pub rc: SqlReturn,
}
