//! Test registry and the sequential TAP runner

use std::fmt;
use std::io::Write;

use odbctap_core::{Credentials, Driver};

use crate::assertions::{TestContext, TestResult};
use crate::error::RunError;
use crate::lifecycle::{self, TeardownReport};
use crate::tap::{TapReport, TapWriter, TestOutcome};

/// Signature of a test body
pub type TestFn = fn(&mut TestContext<'_>) -> TestResult;

/// A named test body
#[derive(Clone, Copy)]
pub struct TestCase {
    name: &'static str,
    body: TestFn,
}

impl TestCase {
    pub const fn new(name: &'static str, body: TestFn) -> Self {
        Self { name, body }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run(&self, ctx: &mut TestContext<'_>) -> TestResult {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// Ordered list of tests; registration order is execution and report order
#[derive(Debug, Clone, Default)]
pub struct TestRegistry {
    tests: Vec<TestCase>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a test
    pub fn add(&mut self, name: &'static str, body: TestFn) -> &mut Self {
        self.tests.push(TestCase::new(name, body));
        self
    }

    /// Builder form of `add`
    pub fn with(mut self, name: &'static str, body: TestFn) -> Self {
        self.add(name, body);
        self
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tests.iter().map(TestCase::name)
    }

    /// Tests whose name contains `pattern`, keeping their relative order
    pub fn filtered(&self, pattern: &str) -> Self {
        self.tests
            .iter()
            .filter(|test| test.name.contains(pattern))
            .copied()
            .collect()
    }
}

impl FromIterator<TestCase> for TestRegistry {
    fn from_iter<I: IntoIterator<Item = TestCase>>(iter: I) -> Self {
        Self {
            tests: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TestRegistry {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}

/// Build a `TestRegistry` from test functions, each named after its identifier
///
/// ```rust,ignore
/// let registry = register_tests![my_basics, t_max_select];
/// ```
#[macro_export]
macro_rules! register_tests {
    ($($test:ident),* $(,)?) => {
        <$crate::TestRegistry as ::std::iter::FromIterator<$crate::TestCase>>::from_iter([
            $($crate::TestCase::new(stringify!($test), $test)),*
        ])
    };
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub report: TapReport,
    pub teardown: TeardownReport,
}

/// Runs a registry against one driver, one test at a time
pub struct Runner<'d> {
    driver: &'d dyn Driver,
    credentials: Credentials,
}

impl<'d> Runner<'d> {
    pub fn new(driver: &'d dyn Driver, credentials: Credentials) -> Self {
        Self {
            driver,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Run every test of `registry` and write the TAP stream to `out`
    ///
    /// The plan line comes first. The handle chain is then acquired; if
    /// that fails the run stops with `RunError::Setup` and no test runs.
    /// Otherwise each test runs with the shared handles and gets its result
    /// line, and the chain is released after the last one whatever the
    /// results were. Test failures are part of the report, not an error.
    #[tracing::instrument(skip_all, fields(driver = self.driver.name(), tests = registry.len()))]
    pub fn run<W: Write>(&self, registry: &TestRegistry, out: W) -> Result<RunSummary, RunError> {
        let mut tap = TapWriter::new(out);
        tap.plan(registry.len());

        let handles = match lifecycle::setup(self.driver, &self.credentials, &mut tap) {
            Ok(handles) => handles,
            Err(err) => {
                if let Err(io_err) = tap.finish() {
                    tracing::warn!(error = %io_err, "failed to flush TAP output after setup failure");
                }
                return Err(err.into());
            }
        };

        for test in registry {
            let span = tracing::info_span!("test", name = test.name());
            let _enter = span.enter();

            tap.begin_test();
            let result = {
                let mut ctx = TestContext::new(self.driver, &handles, &mut tap);
                test.run(&mut ctx)
            };
            let outcome = match result {
                Ok(()) => TestOutcome::Pass,
                Err(failure) => {
                    tracing::debug!(%failure, "assertion failed");
                    TestOutcome::Fail
                }
            };

            let ordinal = tap.result(outcome, test.name());
            tracing::info!(ordinal, outcome = outcome.status(), "test finished");
        }

        let teardown = lifecycle::teardown(self.driver, handles, &mut tap);
        let report = tap.finish()?;

        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            teardown_failures = teardown.failures.len(),
            "run complete"
        );
        Ok(RunSummary { report, teardown })
    }
}
