//! Driver trait definition

use crate::{
    CompletionType, ConnectAttribute, DbcHandle, DiagnosticRecord, DiagnosticUnavailable,
    EnvAttribute, EnvHandle, Handle, SqlReturn, StmtAttribute, StmtHandle,
};

/// Result of a handle allocation
///
/// Allocation reports an outcome code like every other call; `handle` is
/// only present when the driver actually produced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation<H> {
    pub rc: SqlReturn,
    pub handle: Option<H>,
}

impl<H> Allocation<H> {
    pub fn new(rc: SqlReturn, handle: Option<H>) -> Self {
        Self { rc, handle }
    }

    pub fn failed(rc: SqlReturn) -> Self {
        Self { rc, handle: None }
    }
}

/// Handle-based, synchronous call interface of a database client driver
///
/// Every call blocks and returns an outcome code. Error detail is not part
/// of the return value: after a failed call it has to be fetched with
/// `diagnostic_record` on the handle the call was issued against, before
/// any further call on that handle replaces it.
pub trait Driver {
    /// Name of the driver or driver manager, for logging
    fn name(&self) -> &str;

    /// Allocate an environment handle
    fn alloc_environment(&self) -> Allocation<EnvHandle>;

    /// Allocate a connection handle under `env`
    fn alloc_connection(&self, env: EnvHandle) -> Allocation<DbcHandle>;

    /// Allocate a statement handle under `dbc`
    fn alloc_statement(&self, dbc: DbcHandle) -> Allocation<StmtHandle>;

    fn set_env_attr(&self, env: EnvHandle, attribute: EnvAttribute) -> SqlReturn;

    fn set_connect_attr(&self, dbc: DbcHandle, attribute: ConnectAttribute) -> SqlReturn;

    fn set_stmt_attr(&self, stmt: StmtHandle, attribute: StmtAttribute) -> SqlReturn;

    /// Connect to a data source
    fn connect(&self, dbc: DbcHandle, dsn: &str, uid: &str, pwd: &str) -> SqlReturn;

    /// Execute SQL text directly on the statement
    fn exec_direct(&self, stmt: StmtHandle, sql: &str) -> SqlReturn;

    /// Advance the statement's cursor by one row
    fn fetch(&self, stmt: StmtHandle) -> SqlReturn;

    /// Close the statement's open cursor, discarding pending results
    fn close_cursor(&self, stmt: StmtHandle) -> SqlReturn;

    /// Commit or roll back the connection's current transaction
    fn end_transaction(&self, dbc: DbcHandle, completion: CompletionType) -> SqlReturn;

    fn disconnect(&self, dbc: DbcHandle) -> SqlReturn;

    fn free_statement(&self, stmt: StmtHandle) -> SqlReturn;

    fn free_connection(&self, dbc: DbcHandle) -> SqlReturn;

    fn free_environment(&self, env: EnvHandle) -> SqlReturn;

    /// Read diagnostic record number `record` (1-based) from `handle`
    fn diagnostic_record(
        &self,
        handle: Handle,
        record: i16,
    ) -> Result<DiagnosticRecord, DiagnosticUnavailable>;
}
