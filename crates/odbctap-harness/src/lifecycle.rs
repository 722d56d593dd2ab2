//! Acquisition and release of the shared handle chain
//!
//! One environment, one connection and one statement serve every test of a
//! run. `setup` builds the chain and fails the run if any step up to the
//! statement allocation fails; `teardown` releases it step by step and never
//! stops early.

use std::fmt;
use std::panic::Location;

use odbctap_core::{
    Allocation, CompletionType, ConnectAttribute, Credentials, CursorType, DbcHandle, Driver,
    EnvAttribute, EnvHandle, Handle, OdbcVersion, RawHandle, SimulateCursor, SqlReturn,
    StmtAttribute, StmtHandle,
};

use crate::diagnostics::report_diagnostics;
use crate::error::{SetupError, TeardownFailure};
use crate::tap::DiagnosticSink;

/// The environment, connection and statement shared by all tests of a run
///
/// Only `setup` creates one, and `teardown` consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionHandles {
    environment: EnvHandle,
    connection: DbcHandle,
    statement: StmtHandle,
}

impl ConnectionHandles {
    pub fn environment(&self) -> EnvHandle {
        self.environment
    }

    pub fn connection(&self) -> DbcHandle {
        self.connection
    }

    pub fn statement(&self) -> StmtHandle {
        self.statement
    }
}

/// Steps of `setup`, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    AllocEnvironment,
    SetOdbcVersion,
    AllocConnection,
    Connect,
    EnableAutocommit,
    AllocStatement,
    SetCursorStatic,
    SetSimulateCursor,
    SetCursorKeyset,
}

impl SetupStep {
    /// The call as printed in diagnostics
    pub const fn description(self) -> &'static str {
        match self {
            SetupStep::AllocEnvironment => "SQLAllocHandle(SQL_HANDLE_ENV, SQL_NULL_HANDLE, &henv)",
            SetupStep::SetOdbcVersion => {
                "SQLSetEnvAttr(henv, SQL_ATTR_ODBC_VERSION, SQL_OV_ODBC3, 0)"
            }
            SetupStep::AllocConnection => "SQLAllocHandle(SQL_HANDLE_DBC, henv, &hdbc)",
            SetupStep::Connect => "SQLConnect(hdbc, dsn, SQL_NTS, uid, SQL_NTS, pwd, SQL_NTS)",
            SetupStep::EnableAutocommit => {
                "SQLSetConnectAttr(hdbc, SQL_ATTR_AUTOCOMMIT, SQL_AUTOCOMMIT_ON, 0)"
            }
            SetupStep::AllocStatement => "SQLAllocHandle(SQL_HANDLE_STMT, hdbc, &hstmt)",
            SetupStep::SetCursorStatic => {
                "SQLSetStmtAttr(hstmt, SQL_ATTR_CURSOR_TYPE, SQL_CURSOR_STATIC, 0)"
            }
            SetupStep::SetSimulateCursor => {
                "SQLSetStmtAttr(hstmt, SQL_ATTR_SIMULATE_CURSOR, SQL_SC_NON_UNIQUE, 0)"
            }
            SetupStep::SetCursorKeyset => {
                "SQLSetStmtAttr(hstmt, SQL_ATTR_CURSOR_TYPE, SQL_CURSOR_KEYSET_DRIVEN, 0)"
            }
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Steps of `teardown`, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownStep {
    Commit,
    FreeStatement,
    Disconnect,
    FreeConnection,
    FreeEnvironment,
}

impl TeardownStep {
    pub const fn description(self) -> &'static str {
        match self {
            TeardownStep::Commit => "SQLEndTran(SQL_HANDLE_DBC, hdbc, SQL_COMMIT)",
            TeardownStep::FreeStatement => "SQLFreeHandle(SQL_HANDLE_STMT, hstmt)",
            TeardownStep::Disconnect => "SQLDisconnect(hdbc)",
            TeardownStep::FreeConnection => "SQLFreeHandle(SQL_HANDLE_DBC, hdbc)",
            TeardownStep::FreeEnvironment => "SQLFreeHandle(SQL_HANDLE_ENV, henv)",
        }
    }
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Steps of a teardown that did not succeed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reports each step's outcome through the diagnostic extractor
struct StepReporter<'a> {
    driver: &'a dyn Driver,
    sink: &'a mut dyn DiagnosticSink,
}

impl StepReporter<'_> {
    /// Returns whether `rc` counts as success
    #[track_caller]
    fn check(&mut self, step: impl fmt::Display, rc: SqlReturn, handle: Handle) -> bool {
        let location = Location::caller();
        let description = step.to_string();
        tracing::debug!(%rc, step = %description, "lifecycle step");
        report_diagnostics(self.sink, self.driver, rc, handle, &description, location);
        rc.succeeded()
    }

    #[track_caller]
    fn require(&mut self, step: SetupStep, rc: SqlReturn, handle: Handle) -> Result<(), SetupError> {
        if self.check(step, rc, handle) {
            Ok(())
        } else {
            Err(SetupError { step, rc })
        }
    }

    #[track_caller]
    fn allocated<H>(
        &mut self,
        step: SetupStep,
        allocation: Allocation<H>,
        parent: Handle,
    ) -> Result<H, SetupError> {
        self.require(step, allocation.rc, parent)?;
        allocation.handle.ok_or_else(|| {
            self.sink
                .diagnostic(&format!("{} = {} but no handle was returned", step, allocation.rc));
            SetupError {
                step,
                rc: allocation.rc,
            }
        })
    }

    #[track_caller]
    fn release(&mut self, step: TeardownStep, rc: SqlReturn, handle: Handle, report: &mut TeardownReport) {
        if !self.check(step, rc, handle) {
            tracing::warn!(%rc, step = %step, "teardown step failed");
            report.failures.push(TeardownFailure { step, rc });
        }
    }
}

/// Handles acquired so far, for releasing a partial chain
#[derive(Debug, Default)]
struct Acquired {
    environment: Option<EnvHandle>,
    connection: Option<DbcHandle>,
    connected: bool,
    statement: Option<StmtHandle>,
}

/// Acquire the handle chain shared by every test of a run
///
/// Allocates an environment declaring ODBC 3, allocates a connection and
/// connects with `credentials`, enables autocommit, allocates the statement
/// and sets its cursor attributes. Every step's failure is reported to
/// `sink`. A rejected cursor attribute is only reported; any other failure
/// releases whatever was acquired and returns the failing step.
#[tracing::instrument(skip_all, fields(driver = driver.name(), dsn = %credentials.dsn, uid = %credentials.uid))]
pub fn setup(
    driver: &dyn Driver,
    credentials: &Credentials,
    sink: &mut dyn DiagnosticSink,
) -> Result<ConnectionHandles, SetupError> {
    let mut reporter = StepReporter { driver, sink };
    let mut acquired = Acquired::default();

    match acquire(&mut reporter, credentials, &mut acquired) {
        Ok(handles) => {
            tracing::debug!(?handles, "handle chain acquired");
            Ok(handles)
        }
        Err(err) => {
            tracing::warn!(error = %err, "setup failed, releasing partial handle chain");
            let report = release_partial(&mut reporter, &acquired);
            if !report.is_clean() {
                tracing::warn!(failures = report.failures.len(), "partial release incomplete");
            }
            Err(err)
        }
    }
}

fn acquire(
    reporter: &mut StepReporter<'_>,
    credentials: &Credentials,
    acquired: &mut Acquired,
) -> Result<ConnectionHandles, SetupError> {
    let driver = reporter.driver;

    let null_env = Handle::Environment(EnvHandle::new(RawHandle::NULL));
    let environment =
        reporter.allocated(SetupStep::AllocEnvironment, driver.alloc_environment(), null_env)?;
    acquired.environment = Some(environment);

    reporter.require(
        SetupStep::SetOdbcVersion,
        driver.set_env_attr(environment, EnvAttribute::OdbcVersion(OdbcVersion::V3)),
        environment.into(),
    )?;

    let connection = reporter.allocated(
        SetupStep::AllocConnection,
        driver.alloc_connection(environment),
        environment.into(),
    )?;
    acquired.connection = Some(connection);

    reporter.require(
        SetupStep::Connect,
        driver.connect(
            connection,
            &credentials.dsn,
            &credentials.uid,
            &credentials.pwd,
        ),
        connection.into(),
    )?;
    acquired.connected = true;

    reporter.require(
        SetupStep::EnableAutocommit,
        driver.set_connect_attr(connection, ConnectAttribute::AutoCommit(true)),
        connection.into(),
    )?;

    let statement = reporter.allocated(
        SetupStep::AllocStatement,
        driver.alloc_statement(connection),
        connection.into(),
    )?;
    acquired.statement = Some(statement);

    // The static cursor type is overridden two calls later; only keyset-driven
    // takes effect. All three calls are always issued so drivers see the same
    // sequence, and a rejected attribute leaves the driver's default in place.
    let cursor_attributes = [
        (SetupStep::SetCursorStatic, StmtAttribute::CursorType(CursorType::Static)),
        (
            SetupStep::SetSimulateCursor,
            StmtAttribute::SimulateCursor(SimulateCursor::NonUnique),
        ),
        (SetupStep::SetCursorKeyset, StmtAttribute::CursorType(CursorType::KeysetDriven)),
    ];
    for (step, attribute) in cursor_attributes {
        let rc = driver.set_stmt_attr(statement, attribute);
        if !reporter.check(step, rc, statement.into()) {
            tracing::warn!(%rc, step = %step, "statement attribute rejected, continuing");
        }
    }

    Ok(ConnectionHandles {
        environment,
        connection,
        statement,
    })
}

fn release_partial(reporter: &mut StepReporter<'_>, acquired: &Acquired) -> TeardownReport {
    let driver = reporter.driver;
    let mut report = TeardownReport::default();

    if let Some(statement) = acquired.statement {
        reporter.release(
            TeardownStep::FreeStatement,
            driver.free_statement(statement),
            statement.into(),
            &mut report,
        );
    }
    if let Some(connection) = acquired.connection {
        if acquired.connected {
            reporter.release(
                TeardownStep::Disconnect,
                driver.disconnect(connection),
                connection.into(),
                &mut report,
            );
        }
        reporter.release(
            TeardownStep::FreeConnection,
            driver.free_connection(connection),
            connection.into(),
            &mut report,
        );
    }
    if let Some(environment) = acquired.environment {
        reporter.release(
            TeardownStep::FreeEnvironment,
            driver.free_environment(environment),
            environment.into(),
            &mut report,
        );
    }

    report
}

/// Release the handle chain after the last test
///
/// Commits, frees the statement, disconnects, frees the connection and
/// frees the environment. Every step runs even if an earlier one failed;
/// failures are reported to `sink` and collected, never propagated.
#[tracing::instrument(skip_all, fields(driver = driver.name()))]
pub fn teardown(
    driver: &dyn Driver,
    handles: ConnectionHandles,
    sink: &mut dyn DiagnosticSink,
) -> TeardownReport {
    let mut reporter = StepReporter { driver, sink };
    let mut report = TeardownReport::default();
    let ConnectionHandles {
        environment,
        connection,
        statement,
    } = handles;

    reporter.release(
        TeardownStep::Commit,
        driver.end_transaction(connection, CompletionType::Commit),
        connection.into(),
        &mut report,
    );
    reporter.release(
        TeardownStep::FreeStatement,
        driver.free_statement(statement),
        statement.into(),
        &mut report,
    );
    reporter.release(
        TeardownStep::Disconnect,
        driver.disconnect(connection),
        connection.into(),
        &mut report,
    );
    reporter.release(
        TeardownStep::FreeConnection,
        driver.free_connection(connection),
        connection.into(),
        &mut report,
    );
    reporter.release(
        TeardownStep::FreeEnvironment,
        driver.free_environment(environment),
        environment.into(),
        &mut report,
    );

    tracing::debug!(failures = report.failures.len(), "handle chain released");
    report
}
