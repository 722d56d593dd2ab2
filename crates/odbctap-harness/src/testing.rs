//! Scripted in-process driver
//!
//! `ScriptedDriver` stands in for a live driver in tests. Every call is
//! recorded, succeeds unless scripted otherwise, and scripted failures leave
//! a diagnostic record on the handle the call was issued against until the
//! next call on that handle. `RecordingSink` collects the diagnostics a
//! harness call writes.

use std::collections::HashMap;

use odbctap_core::{
    Allocation, CompletionType, ConnectAttribute, DbcHandle, DiagnosticRecord,
    DiagnosticUnavailable, Driver, EnvAttribute, EnvHandle, Handle, RawHandle, SqlReturn,
    StmtAttribute, StmtHandle,
};
use parking_lot::Mutex;

use crate::tap::DiagnosticSink;

/// Sink that keeps diagnostic lines in memory, without the `# ` prefix
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for RecordingSink {
    fn diagnostic(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    rc: SqlReturn,
    record: Option<DiagnosticRecord>,
}

#[derive(Debug, Default)]
struct ScriptState {
    next_handle: usize,
    calls: Vec<String>,
    call_outcomes: HashMap<&'static str, Scripted>,
    sql_outcomes: Vec<(String, Scripted)>,
    result_rows: Vec<(String, usize)>,
    pending: HashMap<RawHandle, DiagnosticRecord>,
    remaining_rows: HashMap<RawHandle, usize>,
}

impl ScriptState {
    /// Record a call on `handle` and apply any outcome scripted for `op`
    fn enter(&mut self, op: &'static str, detail: Option<String>, handle: RawHandle) -> SqlReturn {
        self.calls.push(match detail {
            Some(detail) => format!("{}({})", op, detail),
            None => op.to_string(),
        });
        self.pending.remove(&handle);

        match self.call_outcomes.get(op).cloned() {
            Some(scripted) => self.apply(handle, scripted),
            None => SqlReturn::SUCCESS,
        }
    }

    fn apply(&mut self, handle: RawHandle, scripted: Scripted) -> SqlReturn {
        if let Some(record) = scripted.record {
            self.pending.insert(handle, record);
        }
        scripted.rc
    }

    fn allocate(&mut self) -> RawHandle {
        self.next_handle += 1;
        RawHandle::from_raw(self.next_handle)
    }
}

/// In-process driver whose outcomes are scripted by the test
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    state: Mutex<ScriptState>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `op` return `rc`, leaving `record` on its handle
    ///
    /// `op` is the `Driver` method name, e.g. `"connect"` or `"fetch"`.
    pub fn fail_call(
        self,
        op: &'static str,
        rc: SqlReturn,
        record: Option<DiagnosticRecord>,
    ) -> Self {
        self.state
            .lock()
            .call_outcomes
            .insert(op, Scripted { rc, record });
        self
    }

    /// Make `exec_direct` return `rc` for SQL containing `pattern`
    pub fn sql_outcome(
        self,
        pattern: impl Into<String>,
        rc: SqlReturn,
        record: Option<DiagnosticRecord>,
    ) -> Self {
        self.state
            .lock()
            .sql_outcomes
            .push((pattern.into(), Scripted { rc, record }));
        self
    }

    /// Make a successful `exec_direct` of SQL containing `pattern` produce
    /// `rows` rows for `fetch`
    pub fn result_rows(self, pattern: impl Into<String>, rows: usize) -> Self {
        self.state.lock().result_rows.push((pattern.into(), rows));
        self
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of calls whose log entry starts with `op`
    pub fn call_count(&self, op: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.as_str() == op || call.starts_with(&format!("{}(", op)))
            .count()
    }

    fn allocation<H>(
        &self,
        op: &'static str,
        parent: RawHandle,
        wrap: impl FnOnce(RawHandle) -> H,
    ) -> Allocation<H> {
        let mut state = self.state.lock();
        let rc = state.enter(op, None, parent);
        if !rc.succeeded() {
            return Allocation::failed(rc);
        }
        let raw = state.allocate();
        Allocation::new(rc, Some(wrap(raw)))
    }
}

impl Driver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn alloc_environment(&self) -> Allocation<EnvHandle> {
        self.allocation("alloc_environment", RawHandle::NULL, EnvHandle::new)
    }

    fn alloc_connection(&self, env: EnvHandle) -> Allocation<DbcHandle> {
        self.allocation("alloc_connection", env.raw(), DbcHandle::new)
    }

    fn alloc_statement(&self, dbc: DbcHandle) -> Allocation<StmtHandle> {
        self.allocation("alloc_statement", dbc.raw(), StmtHandle::new)
    }

    fn set_env_attr(&self, env: EnvHandle, attribute: EnvAttribute) -> SqlReturn {
        self.state
            .lock()
            .enter("set_env_attr", Some(format!("{:?}", attribute)), env.raw())
    }

    fn set_connect_attr(&self, dbc: DbcHandle, attribute: ConnectAttribute) -> SqlReturn {
        self.state
            .lock()
            .enter("set_connect_attr", Some(format!("{:?}", attribute)), dbc.raw())
    }

    fn set_stmt_attr(&self, stmt: StmtHandle, attribute: StmtAttribute) -> SqlReturn {
        self.state
            .lock()
            .enter("set_stmt_attr", Some(format!("{:?}", attribute)), stmt.raw())
    }

    fn connect(&self, dbc: DbcHandle, dsn: &str, uid: &str, _pwd: &str) -> SqlReturn {
        self.state
            .lock()
            .enter("connect", Some(format!("{}, {}", dsn, uid)), dbc.raw())
    }

    fn exec_direct(&self, stmt: StmtHandle, sql: &str) -> SqlReturn {
        let mut state = self.state.lock();
        let rc = state.enter("exec_direct", Some(sql.to_string()), stmt.raw());
        if !rc.succeeded() {
            return rc;
        }

        let scripted = state
            .sql_outcomes
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, scripted)| scripted.clone());
        let rc = match scripted {
            Some(scripted) => state.apply(stmt.raw(), scripted),
            None => rc,
        };

        if rc.succeeded() {
            let rows = state
                .result_rows
                .iter()
                .find(|(pattern, _)| sql.contains(pattern.as_str()))
                .map(|(_, rows)| *rows)
                .unwrap_or(0);
            state.remaining_rows.insert(stmt.raw(), rows);
        }
        rc
    }

    fn fetch(&self, stmt: StmtHandle) -> SqlReturn {
        let mut state = self.state.lock();
        let rc = state.enter("fetch", None, stmt.raw());
        if rc != SqlReturn::SUCCESS {
            return rc;
        }
        match state.remaining_rows.get_mut(&stmt.raw()) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                SqlReturn::SUCCESS
            }
            _ => SqlReturn::NO_DATA,
        }
    }

    fn close_cursor(&self, stmt: StmtHandle) -> SqlReturn {
        let mut state = self.state.lock();
        let rc = state.enter("close_cursor", None, stmt.raw());
        state.remaining_rows.remove(&stmt.raw());
        rc
    }

    fn end_transaction(&self, dbc: DbcHandle, completion: CompletionType) -> SqlReturn {
        self.state
            .lock()
            .enter("end_transaction", Some(format!("{:?}", completion)), dbc.raw())
    }

    fn disconnect(&self, dbc: DbcHandle) -> SqlReturn {
        self.state.lock().enter("disconnect", None, dbc.raw())
    }

    fn free_statement(&self, stmt: StmtHandle) -> SqlReturn {
        self.state.lock().enter("free_statement", None, stmt.raw())
    }

    fn free_connection(&self, dbc: DbcHandle) -> SqlReturn {
        self.state.lock().enter("free_connection", None, dbc.raw())
    }

    fn free_environment(&self, env: EnvHandle) -> SqlReturn {
        self.state.lock().enter("free_environment", None, env.raw())
    }

    fn diagnostic_record(
        &self,
        handle: Handle,
        record: i16,
    ) -> Result<DiagnosticRecord, DiagnosticUnavailable> {
        let mut state = self.state.lock();
        state.calls.push("diagnostic_record".to_string());
        if record != 1 {
            return Err(DiagnosticUnavailable {
                rc: SqlReturn::NO_DATA,
            });
        }
        state
            .pending
            .get(&handle.raw())
            .cloned()
            .ok_or(DiagnosticUnavailable {
                rc: SqlReturn::NO_DATA,
            })
    }
}
