//! `Driver` implementation over the ODBC driver manager

use std::ffi::c_void;
use std::path::Path;
use std::ptr;

use odbctap_core::{
    Allocation, CompletionType, ConnectAttribute, DbcHandle, DiagnosticRecord,
    DiagnosticUnavailable, Driver, EnvAttribute, EnvHandle, Handle, HandleType,
    MAX_MESSAGE_LENGTH, RawHandle, SqlReturn, SqlState, StmtAttribute, StmtHandle,
};

use crate::error::DriverLoadError;
use crate::library::{OdbcLibrary, library_candidates};

/// `SQL_CLOSE` option of `SQLFreeStmt`
const SQL_CLOSE: u16 = 0;

/// Length of the SQLSTATE buffer, including the terminating NUL
const STATE_BUFFER_LEN: usize = 6;

/// Message buffer length passed to `SQLGetDiagRec`, one short of the
/// allocated buffer
pub(crate) const MESSAGE_BUFFER_LEN: i16 = (MAX_MESSAGE_LENGTH - 1) as i16;

/// Driver backed by the system ODBC driver manager
pub struct OdbcDriver {
    library: OdbcLibrary,
    path: String,
}

impl OdbcDriver {
    /// Load the driver manager from `path`, or from the first platform
    /// candidate that loads when `path` is `None`
    #[tracing::instrument(skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self, DriverLoadError> {
        match path {
            Some(path) => Self::open(path.to_string_lossy().into_owned()),
            None => Self::load_default(),
        }
    }

    fn load_default() -> Result<Self, DriverLoadError> {
        let mut tried = Vec::new();
        for candidate in library_candidates() {
            match Self::open(candidate.to_string()) {
                Ok(driver) => return Ok(driver),
                Err(DriverLoadError::Library { path, source }) => {
                    tracing::debug!(%path, error = %source, "driver manager candidate unavailable");
                    tried.push(path);
                }
                Err(err) => return Err(err),
            }
        }
        Err(DriverLoadError::NotFound { tried })
    }

    fn open(path: String) -> Result<Self, DriverLoadError> {
        let library = OdbcLibrary::open(&path)?;
        tracing::info!(%path, "loaded ODBC driver manager");
        Ok(Self { library, path })
    }

    /// Path or library name the driver manager was loaded from
    pub fn library_path(&self) -> &str {
        &self.path
    }

    fn allocate(&self, handle_type: HandleType, parent: RawHandle) -> (SqlReturn, RawHandle) {
        let mut output: *mut c_void = ptr::null_mut();
        // SAFETY: `parent` is null or a handle this driver manager issued, and
        // `output` is a valid location for the new handle.
        let rc = unsafe { (self.library.alloc_handle)(handle_type.code(), parent.as_ptr(), &mut output) };
        let rc = SqlReturn(rc);
        tracing::trace!(handle_type = handle_type.label(), %rc, "SQLAllocHandle");
        (rc, RawHandle::from_ptr(output))
    }

    fn allocation<H>(
        &self,
        handle_type: HandleType,
        parent: RawHandle,
        wrap: impl FnOnce(RawHandle) -> H,
    ) -> Allocation<H> {
        let (rc, raw) = self.allocate(handle_type, parent);
        if rc.succeeded() && !raw.is_null() {
            Allocation::new(rc, Some(wrap(raw)))
        } else {
            Allocation::failed(rc)
        }
    }

    fn free(&self, handle: Handle) -> SqlReturn {
        let handle_type = handle.handle_type();
        // SAFETY: the handle was issued by this driver manager and is not used
        // again after being freed.
        let rc = unsafe { (self.library.free_handle)(handle_type.code(), handle.raw().as_ptr()) };
        SqlReturn(rc)
    }
}

/// Integer attribute values travel in the pointer argument
fn attribute_value(value: usize) -> *mut c_void {
    value as *mut c_void
}

/// Length argument for a string passed to `SQLConnect`
pub(crate) fn short_length(text: &str) -> Option<i16> {
    i16::try_from(text.len()).ok()
}

/// Length argument for a statement passed to `SQLExecDirect`
pub(crate) fn long_length(text: &str) -> Option<i32> {
    i32::try_from(text.len()).ok()
}

/// Decode the message buffer filled by `SQLGetDiagRec`
///
/// `text_len` is the full length of the message, which may exceed what fit
/// into the buffer.
pub(crate) fn decode_message(buffer: &[u8], text_len: i16) -> String {
    let available = buffer.len().saturating_sub(1);
    let len = usize::try_from(text_len).unwrap_or(0).min(available);
    let text = &buffer[..len];
    let end = text.iter().position(|byte| *byte == 0).unwrap_or(len);
    String::from_utf8_lossy(&text[..end]).into_owned()
}

impl Driver for OdbcDriver {
    fn name(&self) -> &str {
        &self.path
    }

    fn alloc_environment(&self) -> Allocation<EnvHandle> {
        self.allocation(HandleType::Environment, RawHandle::NULL, EnvHandle::new)
    }

    fn alloc_connection(&self, env: EnvHandle) -> Allocation<DbcHandle> {
        self.allocation(HandleType::Connection, env.raw(), DbcHandle::new)
    }

    fn alloc_statement(&self, dbc: DbcHandle) -> Allocation<StmtHandle> {
        self.allocation(HandleType::Statement, dbc.raw(), StmtHandle::new)
    }

    fn set_env_attr(&self, env: EnvHandle, attribute: EnvAttribute) -> SqlReturn {
        // SAFETY: integer attribute, no buffer is read through the pointer.
        let rc = unsafe {
            (self.library.set_env_attr)(
                env.raw().as_ptr(),
                attribute.code(),
                attribute_value(attribute.value()),
                0,
            )
        };
        SqlReturn(rc)
    }

    fn set_connect_attr(&self, dbc: DbcHandle, attribute: ConnectAttribute) -> SqlReturn {
        // SAFETY: integer attribute, no buffer is read through the pointer.
        let rc = unsafe {
            (self.library.set_connect_attr)(
                dbc.raw().as_ptr(),
                attribute.code(),
                attribute_value(attribute.value()),
                0,
            )
        };
        SqlReturn(rc)
    }

    fn set_stmt_attr(&self, stmt: StmtHandle, attribute: StmtAttribute) -> SqlReturn {
        // SAFETY: integer attribute, no buffer is read through the pointer.
        let rc = unsafe {
            (self.library.set_stmt_attr)(
                stmt.raw().as_ptr(),
                attribute.code(),
                attribute_value(attribute.value()),
                0,
            )
        };
        SqlReturn(rc)
    }

    #[tracing::instrument(skip(self, dbc, pwd), fields(dbc = ?dbc.raw()))]
    fn connect(&self, dbc: DbcHandle, dsn: &str, uid: &str, pwd: &str) -> SqlReturn {
        let (Some(dsn_len), Some(uid_len), Some(pwd_len)) =
            (short_length(dsn), short_length(uid), short_length(pwd))
        else {
            tracing::warn!("connection string argument too long");
            return SqlReturn::ERROR;
        };

        // SAFETY: every string is passed with its exact length and outlives
        // the call.
        let rc = unsafe {
            (self.library.connect)(
                dbc.raw().as_ptr(),
                dsn.as_ptr(),
                dsn_len,
                uid.as_ptr(),
                uid_len,
                pwd.as_ptr(),
                pwd_len,
            )
        };
        SqlReturn(rc)
    }

    fn exec_direct(&self, stmt: StmtHandle, sql: &str) -> SqlReturn {
        let Some(len) = long_length(sql) else {
            tracing::warn!(bytes = sql.len(), "statement too long");
            return SqlReturn::ERROR;
        };

        // SAFETY: `sql` is passed with its exact length and outlives the call.
        let rc = unsafe { (self.library.exec_direct)(stmt.raw().as_ptr(), sql.as_ptr(), len) };
        let rc = SqlReturn(rc);
        tracing::trace!(%rc, sql, "SQLExecDirect");
        rc
    }

    fn fetch(&self, stmt: StmtHandle) -> SqlReturn {
        // SAFETY: no bound columns, so the driver writes nothing back.
        SqlReturn(unsafe { (self.library.fetch)(stmt.raw().as_ptr()) })
    }

    fn close_cursor(&self, stmt: StmtHandle) -> SqlReturn {
        // SAFETY: plain handle call.
        SqlReturn(unsafe { (self.library.free_stmt)(stmt.raw().as_ptr(), SQL_CLOSE) })
    }

    fn end_transaction(&self, dbc: DbcHandle, completion: CompletionType) -> SqlReturn {
        // SAFETY: plain handle call.
        let rc = unsafe {
            (self.library.end_tran)(
                HandleType::Connection.code(),
                dbc.raw().as_ptr(),
                completion.code(),
            )
        };
        SqlReturn(rc)
    }

    fn disconnect(&self, dbc: DbcHandle) -> SqlReturn {
        // SAFETY: plain handle call.
        SqlReturn(unsafe { (self.library.disconnect)(dbc.raw().as_ptr()) })
    }

    fn free_statement(&self, stmt: StmtHandle) -> SqlReturn {
        self.free(stmt.into())
    }

    fn free_connection(&self, dbc: DbcHandle) -> SqlReturn {
        self.free(dbc.into())
    }

    fn free_environment(&self, env: EnvHandle) -> SqlReturn {
        self.free(env.into())
    }

    fn diagnostic_record(
        &self,
        handle: Handle,
        record: i16,
    ) -> Result<DiagnosticRecord, DiagnosticUnavailable> {
        let mut state = [0u8; STATE_BUFFER_LEN];
        let mut native_error = 0i32;
        let mut message = [0u8; MAX_MESSAGE_LENGTH];
        let mut text_len = 0i16;

        // SAFETY: the state buffer holds five characters plus NUL and the
        // length passed for the message buffer is below its size.
        let rc = unsafe {
            (self.library.get_diag_rec)(
                handle.handle_type().code(),
                handle.raw().as_ptr(),
                record,
                state.as_mut_ptr(),
                &mut native_error,
                message.as_mut_ptr(),
                MESSAGE_BUFFER_LEN,
                &mut text_len,
            )
        };
        let rc = SqlReturn(rc);
        if !rc.succeeded() {
            return Err(DiagnosticUnavailable { rc });
        }

        Ok(DiagnosticRecord::new(
            SqlState::from_bytes(&state),
            decode_message(&message, text_len),
            native_error,
        ))
    }
}
