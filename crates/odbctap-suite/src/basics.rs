use odbctap_core::{CompletionType, SqlReturn};
use odbctap_harness::{TestContext, TestResult};

/// Rows inserted by `t_max_select`
pub const MAX_SELECT_ROWS: usize = 100;

/// Statement every conforming server rejects
const INVALID_SQL: &str = "SELEKT 1";

#[track_caller]
fn fetch_row(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_stmt("SQLFetch(hstmt)", |driver, handles| {
        driver.fetch(handles.statement())
    })
}

#[track_caller]
fn fetch_end(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.expect_stmt(
        "SQLFetch(hstmt)",
        |driver, handles| driver.fetch(handles.statement()),
        SqlReturn::NO_DATA,
    )
}

#[track_caller]
fn close_cursor(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_stmt("SQLFreeStmt(hstmt, SQL_CLOSE)", |driver, handles| {
        driver.close_cursor(handles.statement())
    })
}

/// Create, fill, read back and drop a small table
pub fn my_basics(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("DROP TABLE IF EXISTS t_basic")?;
    ctx.ok_sql("CREATE TABLE t_basic (id INT, name VARCHAR(20))")?;
    ctx.ok_sql("INSERT INTO t_basic VALUES (1, 'foo'), (2, 'bar'), (3, 'baz')")?;

    ctx.ok_sql("SELECT id, name FROM t_basic ORDER BY id")?;
    for _ in 0..3 {
        fetch_row(ctx)?;
    }
    fetch_end(ctx)?;
    close_cursor(ctx)?;

    ctx.ok_sql("DROP TABLE IF EXISTS t_basic")
}

/// A searched DELETE that matches nothing reports no data
pub fn t_delete_no_rows(ctx: &mut TestContext<'_>) -> TestResult {
    const DELETE: &str = "DELETE FROM t_delete_none WHERE id = 42";

    ctx.ok_sql("DROP TABLE IF EXISTS t_delete_none")?;
    ctx.ok_sql("CREATE TABLE t_delete_none (id INT)")?;
    ctx.expect_stmt(
        &format!("SQLExecDirect(hstmt, \"{}\", SQL_NTS)", DELETE),
        |driver, handles| driver.exec_direct(handles.statement(), DELETE),
        SqlReturn::NO_DATA,
    )?;

    ctx.ok_sql("DROP TABLE IF EXISTS t_delete_none")
}

/// With autocommit on, an inserted row is visible to the next SELECT
pub fn t_autocommit_visible(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("DROP TABLE IF EXISTS t_autocommit")?;
    ctx.ok_sql("CREATE TABLE t_autocommit (id INT)")?;
    ctx.ok_sql("INSERT INTO t_autocommit VALUES (7)")?;

    ctx.ok_sql("SELECT id FROM t_autocommit WHERE id = 7")?;
    fetch_row(ctx)?;
    fetch_end(ctx)?;
    close_cursor(ctx)?;

    ctx.ok_sql("DROP TABLE IF EXISTS t_autocommit")
}

/// An explicit commit on the connection succeeds
pub fn t_transaction_commit(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("DROP TABLE IF EXISTS t_commit")?;
    ctx.ok_sql("CREATE TABLE t_commit (id INT)")?;
    ctx.ok_sql("INSERT INTO t_commit VALUES (1)")?;
    ctx.ok_con("SQLEndTran(SQL_HANDLE_DBC, hdbc, SQL_COMMIT)", |driver, handles| {
        driver.end_transaction(handles.connection(), CompletionType::Commit)
    })?;

    ctx.ok_sql("DROP TABLE IF EXISTS t_commit")
}

/// Every one of `MAX_SELECT_ROWS` inserted rows can be fetched, and no more
pub fn t_max_select(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.ok_sql("DROP TABLE IF EXISTS t_max_select")?;
    ctx.ok_sql("CREATE TABLE t_max_select (a INT, b VARCHAR(30))")?;
    for i in 1..=MAX_SELECT_ROWS {
        ctx.ok_sql(&format!(
            "INSERT INTO t_max_select VALUES ({}, 'MySQL{}')",
            i, i
        ))?;
    }

    ctx.ok_sql("SELECT a, b FROM t_max_select")?;
    for _ in 0..MAX_SELECT_ROWS {
        fetch_row(ctx)?;
    }
    fetch_end(ctx)?;
    close_cursor(ctx)?;

    ctx.ok_sql("DROP TABLE IF EXISTS t_max_select")
}

/// The server rejects malformed SQL with an error
pub fn t_syntax_error(ctx: &mut TestContext<'_>) -> TestResult {
    ctx.expect_stmt(
        &format!("SQLExecDirect(hstmt, \"{}\", SQL_NTS)", INVALID_SQL),
        |driver, handles| driver.exec_direct(handles.statement(), INVALID_SQL),
        SqlReturn::ERROR,
    )
}
