//! The basics suite against a scripted driver

use indoc::indoc;
use odbctap_core::{Credentials, DiagnosticRecord, SqlReturn};
use odbctap_harness::testing::ScriptedDriver;
use odbctap_harness::{RunSummary, Runner, TestRegistry};
use odbctap_suite::MAX_SELECT_ROWS;
use pretty_assertions::assert_eq;
use rstest::rstest;

/// A driver that answers every basics test the way a conforming server does
fn conforming_driver() -> ScriptedDriver {
    ScriptedDriver::new()
        .result_rows("FROM t_basic", 3)
        .result_rows("FROM t_autocommit", 1)
        .result_rows("FROM t_max_select", MAX_SELECT_ROWS)
        .sql_outcome("DELETE FROM t_delete_none", SqlReturn::NO_DATA, None)
        .sql_outcome(
            "SELEKT",
            SqlReturn::ERROR,
            Some(DiagnosticRecord::new(
                "42000",
                "You have an error in your SQL syntax",
                1064,
            )),
        )
}

fn run(driver: &ScriptedDriver, registry: &TestRegistry) -> (RunSummary, String) {
    let mut buffer = Vec::new();
    let summary = Runner::new(driver, Credentials::default())
        .run(registry, &mut buffer)
        .expect("run completes");
    (summary, String::from_utf8(buffer).expect("TAP output is UTF-8"))
}

#[test]
fn test_basics_pass_against_conforming_driver() {
    let driver = conforming_driver();

    let (summary, output) = run(&driver, &odbctap_suite::basics());

    assert_eq!(
        output,
        indoc! {"
            1..6
            1 ok - my_basics
            2 ok - t_delete_no_rows
            3 ok - t_autocommit_visible
            4 ok - t_transaction_commit
            5 ok - t_max_select
            6 ok - t_syntax_error
        "}
    );
    assert_eq!(summary.report.failed(), 0);
    assert!(summary.teardown.is_clean());
}

#[test]
fn test_max_select_fetches_every_row_then_no_data() {
    let driver = conforming_driver();
    let registry = odbctap_suite::basics().filtered("t_max_select");

    let (summary, _) = run(&driver, &registry);

    assert_eq!(summary.report.passed(), 1);
    assert_eq!(driver.call_count("fetch"), MAX_SELECT_ROWS + 1);
    assert_eq!(driver.call_count("close_cursor"), 1);
    assert_eq!(
        driver.call_count("exec_direct"),
        MAX_SELECT_ROWS + 4,
        "drop, create, inserts, select and drop"
    );
}

#[test]
fn test_transaction_commit_commits_on_the_connection() {
    let driver = conforming_driver();
    let registry = odbctap_suite::basics().filtered("t_transaction_commit");

    run(&driver, &registry);

    // One commit from the test body, one from teardown.
    assert_eq!(driver.call_count("end_transaction"), 2);
}

#[rstest]
#[case::missing_rows("my_basics", ScriptedDriver::new())]
#[case::delete_reports_success("t_delete_no_rows", ScriptedDriver::new())]
#[case::syntax_accepted("t_syntax_error", ScriptedDriver::new())]
#[case::commit_rejected(
    "t_transaction_commit",
    ScriptedDriver::new().fail_call("end_transaction", SqlReturn::ERROR, None)
)]
fn test_nonconforming_driver_fails_the_test(#[case] name: &str, #[case] driver: ScriptedDriver) {
    let registry = odbctap_suite::basics().filtered(name);

    let (summary, output) = run(&driver, &registry);

    assert_eq!(summary.report.failed(), 1);
    assert!(
        output.contains(&format!("1 not ok - {}", name)),
        "unexpected report:\n{output}"
    );
}

#[test]
fn test_failed_fetch_reports_missing_row() {
    let driver = ScriptedDriver::new();
    let registry = odbctap_suite::basics().filtered("my_basics");

    let (_, output) = run(&driver, &registry);

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "1..1");
    assert_eq!(lines[1], "1 not ok - my_basics");
    assert_eq!(lines[2], "# SQLFetch(hstmt) = 100");
    assert!(
        lines[3].starts_with("# Did not get expected diagnostics from SQLGetDiagRec() in file "),
        "unexpected diagnostic: {}",
        lines[3]
    );
    assert!(lines[3].contains("basics.rs"));
}
