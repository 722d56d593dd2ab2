//! Checked driver calls used inside test bodies
//!
//! Each check runs one driver call and compares its outcome with what the
//! test requires. A mismatch writes diagnostics to the report and returns
//! `Err(AssertionFailure)`, so a test body aborts at the first failed check
//! with `?`:
//!
//! ```rust,ignore
//! fn t_basic(ctx: &mut TestContext<'_>) -> TestResult {
//!     ctx.ok_sql("INSERT INTO t_basic VALUES (1, 'foo')")?;
//!     ctx.expect_stmt(
//!         "SQLFetch(hstmt)",
//!         |driver, handles| driver.fetch(handles.statement()),
//!         SqlReturn::NO_DATA,
//!     )?;
//!     Ok(())
//! }
//! ```

use std::panic::Location;

use odbctap_core::{DbcHandle, Driver, EnvHandle, Handle, SqlReturn, StmtHandle};

use crate::diagnostics::report_diagnostics;
use crate::error::AssertionFailure;
use crate::lifecycle::ConnectionHandles;
use crate::tap::DiagnosticSink;

/// Outcome of a test body; `Err` means the test is `not ok`
pub type TestResult = Result<(), AssertionFailure>;

/// What a test body gets to work with: the driver, the shared handles and
/// the report stream for diagnostics
pub struct TestContext<'a> {
    driver: &'a dyn Driver,
    handles: &'a ConnectionHandles,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> TestContext<'a> {
    pub fn new(
        driver: &'a dyn Driver,
        handles: &'a ConnectionHandles,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            driver,
            handles,
            sink,
        }
    }

    pub fn driver(&self) -> &'a dyn Driver {
        self.driver
    }

    pub fn handles(&self) -> &'a ConnectionHandles {
        self.handles
    }

    pub fn environment(&self) -> EnvHandle {
        self.handles.environment()
    }

    pub fn connection(&self) -> DbcHandle {
        self.handles.connection()
    }

    pub fn statement(&self) -> StmtHandle {
        self.handles.statement()
    }

    /// Require success (or success with info) from a statement call
    #[track_caller]
    pub fn ok_stmt<F>(&mut self, description: &str, call: F) -> TestResult
    where
        F: FnOnce(&dyn Driver, &ConnectionHandles) -> SqlReturn,
    {
        let location = Location::caller();
        let rc = call(self.driver, self.handles);
        let handle = Handle::Statement(self.handles.statement());
        self.require_success(rc, handle, description, location)
    }

    /// Require success (or success with info) from a connection call
    #[track_caller]
    pub fn ok_con<F>(&mut self, description: &str, call: F) -> TestResult
    where
        F: FnOnce(&dyn Driver, &ConnectionHandles) -> SqlReturn,
    {
        let location = Location::caller();
        let rc = call(self.driver, self.handles);
        let handle = Handle::Connection(self.handles.connection());
        self.require_success(rc, handle, description, location)
    }

    /// Require exactly `expected` from a statement call
    ///
    /// Used for outcomes that are not errors, such as `NO_DATA` after the
    /// last row. On mismatch the expected and actual codes are reported
    /// even when the actual outcome was a success.
    #[track_caller]
    pub fn expect_stmt<F>(&mut self, description: &str, call: F, expected: SqlReturn) -> TestResult
    where
        F: FnOnce(&dyn Driver, &ConnectionHandles) -> SqlReturn,
    {
        let location = Location::caller();
        let rc = call(self.driver, self.handles);
        if rc == expected {
            return Ok(());
        }

        let handle = Handle::Statement(self.handles.statement());
        report_diagnostics(self.sink, self.driver, rc, handle, description, location);
        self.sink.diagnostic(&format!(
            "Expected {}, but got {} in {} on line {}",
            expected,
            rc,
            location.file(),
            location.line()
        ));
        tracing::debug!(%rc, %expected, call = description, "unexpected outcome");

        Err(AssertionFailure {
            description: description.to_string(),
            rc,
            expected: Some(expected),
            location,
        })
    }

    /// Execute `sql` directly on the shared statement and require success
    #[track_caller]
    pub fn ok_sql(&mut self, sql: &str) -> TestResult {
        let location = Location::caller();
        let statement = self.handles.statement();
        let rc = self.driver.exec_direct(statement, sql);
        let description = format!("SQLExecDirect(hstmt, \"{}\", SQL_NTS)", sql);
        self.require_success(rc, Handle::Statement(statement), &description, location)
    }

    fn require_success(
        &mut self,
        rc: SqlReturn,
        handle: Handle,
        description: &str,
        location: &'static Location<'static>,
    ) -> TestResult {
        tracing::debug!(%rc, call = description, "checked call");
        if rc.succeeded() {
            return Ok(());
        }

        report_diagnostics(self.sink, self.driver, rc, handle, description, location);
        Err(AssertionFailure {
            description: description.to_string(),
            rc,
            expected: None,
            location,
        })
    }
}
