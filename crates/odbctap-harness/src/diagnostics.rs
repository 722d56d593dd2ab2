//! Diagnostic extraction for failed driver calls

use std::panic::Location;

use odbctap_core::{DiagnosticRecord, DiagnosticUnavailable, Driver, Handle, SqlReturn};

use crate::tap::DiagnosticSink;

/// Report a failed call and the first diagnostic record of its handle
///
/// Does nothing when `rc` is success or success with info. Otherwise writes
/// `<description> = <rc>` followed by either the record, tagged with its
/// SQLSTATE and `location`, or a line saying no diagnostics could be read.
/// Only record number 1 is ever requested.
///
/// Must run before any further call on `handle`, which would replace its
/// diagnostics. Returns what the driver supplied, or `None` when the call
/// succeeded.
pub fn report_diagnostics(
    sink: &mut dyn DiagnosticSink,
    driver: &dyn Driver,
    rc: SqlReturn,
    handle: Handle,
    description: &str,
    location: &Location<'_>,
) -> Option<Result<DiagnosticRecord, DiagnosticUnavailable>> {
    if rc.succeeded() {
        return None;
    }

    tracing::debug!(%rc, outcome = rc.name(), call = description, "call failed");
    sink.diagnostic(&format!("{} = {}", description, rc));

    let fetched = driver.diagnostic_record(handle, 1);
    match &fetched {
        Ok(record) => {
            tracing::debug!(
                state = %record.state,
                native_error = record.native_error,
                handle_type = handle.handle_type().label(),
                "read diagnostic record"
            );
            sink.diagnostic(&format!(
                "[{}] {} in {} on line {}",
                record.state,
                record.message,
                location.file(),
                location.line()
            ));
        }
        Err(unavailable) => {
            tracing::warn!(
                rc = %unavailable.rc,
                handle_type = handle.handle_type().label(),
                "driver supplied no diagnostic record"
            );
            sink.diagnostic(&format!(
                "Did not get expected diagnostics from SQLGetDiagRec() in file {} on line {}",
                location.file(),
                location.line()
            ));
        }
    }

    Some(fetched)
}
