//! Tests for the sequential TAP runner

use std::cell::Cell;
use std::io;
use std::sync::Once;

use indoc::indoc;
use odbctap_core::{Credentials, DiagnosticRecord, SqlReturn};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::assertions::{TestContext, TestResult};
use crate::error::RunError;
use crate::lifecycle::{SetupStep, TeardownStep};
use crate::runner::{RunSummary, Runner, TestRegistry};
use crate::tap::TestOutcome;
use crate::testing::ScriptedDriver;

static INIT: Once = Once::new();

fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn run(driver: &ScriptedDriver, registry: &TestRegistry) -> (Result<RunSummary, RunError>, String) {
    init_test_logging();
    let mut buffer = Vec::new();
    let result = Runner::new(driver, Credentials::default()).run(registry, &mut buffer);
    (result, String::from_utf8(buffer).expect("TAP output is UTF-8"))
}

/// Replace the `in <file> on line <n>` tail of diagnostic lines, which
/// depends on where the check was written
fn normalize(output: &str) -> String {
    output
        .lines()
        .map(|line| match line.rfind(" on line ") {
            Some(at) => match line[..at].rfind(" in ") {
                Some(start) => format!("{} in <location>", &line[..start]),
                None => line.to_string(),
            },
            None => line.to_string(),
        })
        .map(|line| line + "\n")
        .collect()
}

fn select_one(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("SELECT 1")
}

fn bad_syntax(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("SELEC 1")?;
    ctx.ok_sql("SELECT 'after the failure'")
}

fn fetch_past_end(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("SELECT * FROM t1")?;
    ctx.expect_stmt(
        "SQLFetch(hstmt)",
        |driver, handles| driver.fetch(handles.statement()),
        SqlReturn::NO_DATA,
    )
}

fn syntax_error_driver() -> ScriptedDriver {
    ScriptedDriver::new().sql_outcome(
        "SELEC 1",
        SqlReturn::ERROR,
        Some(DiagnosticRecord::new(
            "42000",
            "You have an error in your SQL syntax",
            1064,
        )),
    )
}

#[test]
fn test_report_for_passing_and_failing_tests() {
    let driver = syntax_error_driver();
    let registry = TestRegistry::new()
        .with("A", select_one)
        .with("B", bad_syntax)
        .with("C", select_one);

    let (result, output) = run(&driver, &registry);

    let summary = result.expect("test failures are not a run error");
    assert_eq!(
        normalize(&output),
        indoc! {r#"
            1..3
            1 ok - A
            2 not ok - B
            # SQLExecDirect(hstmt, "SELEC 1", SQL_NTS) = -1
            # [42000] You have an error in your SQL syntax in <location>
            3 ok - C
        "#}
    );
    assert_eq!(summary.report.passed(), 2);
    assert_eq!(summary.report.failed(), 1);
    assert!(summary.report.is_complete());
    assert!(summary.teardown.is_clean());
}

thread_local! {
    static FAILING_LINE: Cell<u32> = const { Cell::new(0) };
}

fn failing_check_with_known_line(ctx: &mut TestContext<'_>) -> TestResult {
    FAILING_LINE.set(line!() + 1);
    ctx.ok_sql("SELEC 1")
}

#[test]
fn test_diagnostic_names_the_failing_check() {
    let driver = syntax_error_driver();
    let registry = TestRegistry::new().with("located", failing_check_with_known_line);

    let (_, output) = run(&driver, &registry);

    let expected = format!(
        "# [42000] You have an error in your SQL syntax in {} on line {}",
        file!(),
        FAILING_LINE.get()
    );
    assert!(
        output.lines().any(|line| line == expected),
        "missing {expected:?} in:\n{output}"
    );
}

#[test]
fn test_failed_check_ends_the_test_body() {
    let driver = syntax_error_driver();
    let registry = TestRegistry::new()
        .with("bad_syntax", bad_syntax)
        .with("select_one", select_one);

    let (result, _) = run(&driver, &registry);

    let summary = result.expect("test failures are not a run error");
    assert!(
        !driver
            .calls()
            .contains(&"exec_direct(SELECT 'after the failure')".to_string())
    );
    assert_eq!(driver.call_count("exec_direct"), 2);
    assert_eq!(
        summary
            .report
            .lines
            .iter()
            .map(|line| line.outcome)
            .collect::<Vec<_>>(),
        [TestOutcome::Fail, TestOutcome::Pass]
    );
}

#[test]
fn test_expected_no_data_but_got_success() {
    let driver = ScriptedDriver::new().result_rows("FROM t1", 1);
    let registry = TestRegistry::new().with("fetch_past_end", fetch_past_end);

    let (_, output) = run(&driver, &registry);

    assert_eq!(
        normalize(&output),
        indoc! {"
            1..1
            1 not ok - fetch_past_end
            # Expected 100, but got 0 in <location>
        "}
    );
}

#[test]
fn test_expected_no_data_but_got_error() {
    let driver = ScriptedDriver::new().fail_call(
        "fetch",
        SqlReturn::ERROR,
        Some(DiagnosticRecord::new("24000", "Invalid cursor state", 0)),
    );
    let registry = TestRegistry::new().with("fetch_past_end", fetch_past_end);

    let (_, output) = run(&driver, &registry);

    assert_eq!(
        normalize(&output),
        indoc! {"
            1..1
            1 not ok - fetch_past_end
            # SQLFetch(hstmt) = -1
            # [24000] Invalid cursor state in <location>
            # Expected 100, but got -1 in <location>
        "}
    );
}

#[test]
fn test_exact_outcome_passes() {
    let driver = ScriptedDriver::new();
    let registry = TestRegistry::new().with("fetch_past_end", fetch_past_end);

    let (_, output) = run(&driver, &registry);

    assert_eq!(output, "1..1\n1 ok - fetch_past_end\n");
}

#[test]
fn test_missing_diagnostics_are_reported() {
    let driver = ScriptedDriver::new().sql_outcome("SELEC 1", SqlReturn::ERROR, None);
    let registry = TestRegistry::new().with("bad_syntax", bad_syntax);

    let (_, output) = run(&driver, &registry);

    assert_eq!(
        normalize(&output),
        indoc! {r#"
            1..1
            1 not ok - bad_syntax
            # SQLExecDirect(hstmt, "SELEC 1", SQL_NTS) = -1
            # Did not get expected diagnostics from SQLGetDiagRec() in <location>
        "#}
    );
}

#[test]
fn test_setup_failure_stops_before_any_test() {
    let driver = ScriptedDriver::new().fail_call(
        "connect",
        SqlReturn::ERROR,
        Some(DiagnosticRecord::new("08001", "Can't connect to server", 2003)),
    );
    let registry = TestRegistry::new()
        .with("first", select_one)
        .with("second", select_one);

    let (result, output) = run(&driver, &registry);

    match result {
        Err(RunError::Setup(err)) => assert_eq!(err.step, SetupStep::Connect),
        other => panic!("expected a setup error, got {other:?}"),
    }
    assert_eq!(
        normalize(&output),
        indoc! {"
            1..2
            # SQLConnect(hdbc, dsn, SQL_NTS, uid, SQL_NTS, pwd, SQL_NTS) = -1
            # [08001] Can't connect to server in <location>
        "}
    );
    assert_eq!(driver.call_count("exec_direct"), 0);
    assert_eq!(driver.call_count("end_transaction"), 0);
    assert_eq!(driver.call_count("free_environment"), 1);
}

#[test]
fn test_rejected_cursor_attributes_still_run_tests() {
    let driver = ScriptedDriver::new().fail_call(
        "set_stmt_attr",
        SqlReturn::ERROR,
        Some(DiagnosticRecord::new("HYC00", "Optional feature not implemented", 0)),
    );
    let registry = TestRegistry::new()
        .with("first", select_one)
        .with("second", select_one);

    let (result, output) = run(&driver, &registry);

    let summary = result.expect("rejected cursor attributes are not a run error");
    assert_eq!(
        normalize(&output),
        indoc! {"
            1..2
            # SQLSetStmtAttr(hstmt, SQL_ATTR_CURSOR_TYPE, SQL_CURSOR_STATIC, 0) = -1
            # [HYC00] Optional feature not implemented in <location>
            # SQLSetStmtAttr(hstmt, SQL_ATTR_SIMULATE_CURSOR, SQL_SC_NON_UNIQUE, 0) = -1
            # [HYC00] Optional feature not implemented in <location>
            # SQLSetStmtAttr(hstmt, SQL_ATTR_CURSOR_TYPE, SQL_CURSOR_KEYSET_DRIVEN, 0) = -1
            # [HYC00] Optional feature not implemented in <location>
            1 ok - first
            2 ok - second
        "}
    );
    assert_eq!(summary.report.passed(), 2);
    assert!(summary.teardown.is_clean());
    assert_eq!(driver.call_count("set_stmt_attr"), 3);
    assert_eq!(driver.call_count("exec_direct"), 2);

    let calls = driver.calls();
    assert_eq!(
        &calls[calls.len() - 5..],
        [
            "end_transaction(Commit)",
            "free_statement",
            "disconnect",
            "free_connection",
            "free_environment",
        ]
    );
}

#[test]
fn test_teardown_runs_once_after_all_tests() {
    let driver = ScriptedDriver::new().sql_outcome("SELEC 1", SqlReturn::ERROR, None);
    let registry = TestRegistry::new()
        .with("one", bad_syntax)
        .with("two", bad_syntax)
        .with("three", bad_syntax);

    let (result, _) = run(&driver, &registry);

    let summary = result.expect("test failures are not a run error");
    assert_eq!(summary.report.failed(), 3);
    assert_eq!(driver.call_count("end_transaction"), 1);

    let calls = driver.calls();
    assert_eq!(
        &calls[calls.len() - 5..],
        [
            "end_transaction(Commit)",
            "free_statement",
            "disconnect",
            "free_connection",
            "free_environment",
        ]
    );
}

#[test]
fn test_teardown_failure_follows_the_results() {
    let driver = ScriptedDriver::new().fail_call("free_statement", SqlReturn::INVALID_HANDLE, None);
    let registry = TestRegistry::new().with("select_one", select_one);

    let (result, output) = run(&driver, &registry);

    let summary = result.expect("teardown failures are not a run error");
    assert_eq!(summary.teardown.failures.len(), 1);
    assert_eq!(summary.teardown.failures[0].step, TeardownStep::FreeStatement);
    assert_eq!(
        normalize(&output),
        indoc! {"
            1..1
            1 ok - select_one
            # SQLFreeHandle(SQL_HANDLE_STMT, hstmt) = -2
            # Did not get expected diagnostics from SQLGetDiagRec() in <location>
        "}
    );
    assert_eq!(driver.call_count("free_environment"), 1);
}

#[test]
fn test_empty_registry_still_connects() {
    let driver = ScriptedDriver::new();

    let (result, output) = run(&driver, &TestRegistry::new());

    let summary = result.expect("an empty run succeeds");
    assert_eq!(output, "1..0\n");
    assert!(summary.report.is_complete());
    assert_eq!(driver.call_count("connect"), 1);
    assert_eq!(driver.call_count("disconnect"), 1);
}

#[test]
fn test_ordinals_follow_registration_order() {
    let driver = ScriptedDriver::new();
    let registry = crate::register_tests![select_one, fetch_past_end, bad_syntax];

    let (result, _) = run(&driver, &registry);

    let summary = result.expect("run completes");
    let lines: Vec<(usize, &str)> = summary
        .report
        .lines
        .iter()
        .map(|line| (line.ordinal, line.name.as_str()))
        .collect();
    assert_eq!(
        lines,
        [(1, "select_one"), (2, "fetch_past_end"), (3, "bad_syntax")]
    );
}

#[rstest]
#[case::everything("", &["select_one", "fetch_past_end", "bad_syntax"])]
#[case::substring("_", &["select_one", "fetch_past_end", "bad_syntax"])]
#[case::single("fetch", &["fetch_past_end"])]
#[case::nothing("nope", &[])]
fn test_filtered_registry_keeps_order(#[case] pattern: &str, #[case] expected: &[&str]) {
    let registry = crate::register_tests![select_one, fetch_past_end, bad_syntax];

    let names: Vec<&str> = registry.filtered(pattern).names().collect();

    assert_eq!(names, expected);
}

struct BrokenPipe;

impl io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_write_error_still_runs_tests_and_teardown() {
    init_test_logging();
    let driver = ScriptedDriver::new();
    let registry = TestRegistry::new().with("select_one", select_one);

    let result = Runner::new(&driver, Credentials::default()).run(&registry, BrokenPipe);

    assert!(matches!(result, Err(RunError::Io(_))));
    assert_eq!(driver.call_count("exec_direct"), 1);
    assert_eq!(driver.call_count("free_environment"), 1);
}
