//! TAP test harness for handle-based database drivers
//!
//! Tests are registered once, share a single environment/connection/statement
//! handle chain, and run strictly in registration order. Each result is
//! written as a TAP line; failed checks add `#` diagnostic lines read from
//! the driver.
//!
//! ```rust,ignore
//! use odbctap_harness::{register_tests, Runner, TestContext, TestResult};
//!
//! fn select_one(ctx: &mut TestContext<'_>) -> TestResult {
//!     ctx.ok_sql("SELECT 1")?;
//!     ctx.ok_stmt("SQLFetch(hstmt)", |driver, handles| driver.fetch(handles.statement()))?;
//!     ctx.ok_stmt("SQLFreeStmt(hstmt, SQL_CLOSE)", |driver, handles| {
//!         driver.close_cursor(handles.statement())
//!     })
//! }
//!
//! let registry = register_tests![select_one];
//! Runner::new(&driver, credentials).run(&registry, std::io::stdout().lock())?;
//! ```

mod assertions;
mod diagnostics;
mod error;
mod lifecycle;
mod runner;
mod tap;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod lifecycle_tests;
#[cfg(test)]
mod runner_tests;

pub use assertions::{TestContext, TestResult};
pub use diagnostics::report_diagnostics;
pub use error::{AssertionFailure, RunError, SetupError, TeardownFailure};
pub use lifecycle::{
    ConnectionHandles, SetupStep, TeardownReport, TeardownStep, setup, teardown,
};
pub use runner::{RunSummary, Runner, TestCase, TestFn, TestRegistry};
pub use tap::{DiagnosticSink, TapLine, TapReport, TapWriter, TestOutcome};
