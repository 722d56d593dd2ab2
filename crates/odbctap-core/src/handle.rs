//! Opaque handles issued by the driver
//!
//! Handles are plain values: the driver owns the resource behind them and
//! the harness only passes them back into driver calls. The typed wrappers
//! keep an environment from being handed to a statement call by mistake.

use std::ffi::c_void;
use std::fmt;

/// Untyped handle value (`SQLHANDLE`)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(usize);

impl RawHandle {
    /// `SQL_NULL_HANDLE`
    pub const NULL: RawHandle = RawHandle(0);

    pub const fn from_raw(value: usize) -> Self {
        Self(value)
    }

    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr as usize)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub const fn value(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Kind of handle, as passed to `SQLAllocHandle`/`SQLGetDiagRec`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleType {
    Environment,
    Connection,
    Statement,
}

impl HandleType {
    /// `SQL_HANDLE_ENV`, `SQL_HANDLE_DBC`, `SQL_HANDLE_STMT`
    pub const fn code(self) -> i16 {
        match self {
            HandleType::Environment => 1,
            HandleType::Connection => 2,
            HandleType::Statement => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            HandleType::Environment => "SQL_HANDLE_ENV",
            HandleType::Connection => "SQL_HANDLE_DBC",
            HandleType::Statement => "SQL_HANDLE_STMT",
        }
    }
}

/// Environment handle (`SQLHENV`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvHandle(RawHandle);

impl EnvHandle {
    pub const fn new(raw: RawHandle) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> RawHandle {
        self.0
    }
}

/// Connection handle (`SQLHDBC`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DbcHandle(RawHandle);

impl DbcHandle {
    pub const fn new(raw: RawHandle) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> RawHandle {
        self.0
    }
}

/// Statement handle (`SQLHSTMT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtHandle(RawHandle);

impl StmtHandle {
    pub const fn new(raw: RawHandle) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> RawHandle {
        self.0
    }
}

/// Any handle diagnostics can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Environment(EnvHandle),
    Connection(DbcHandle),
    Statement(StmtHandle),
}

impl Handle {
    pub const fn handle_type(self) -> HandleType {
        match self {
            Handle::Environment(_) => HandleType::Environment,
            Handle::Connection(_) => HandleType::Connection,
            Handle::Statement(_) => HandleType::Statement,
        }
    }

    pub const fn raw(self) -> RawHandle {
        match self {
            Handle::Environment(h) => h.raw(),
            Handle::Connection(h) => h.raw(),
            Handle::Statement(h) => h.raw(),
        }
    }
}

impl From<EnvHandle> for Handle {
    fn from(handle: EnvHandle) -> Self {
        Handle::Environment(handle)
    }
}

impl From<DbcHandle> for Handle {
    fn from(handle: DbcHandle) -> Self {
        Handle::Connection(handle)
    }
}

impl From<StmtHandle> for Handle {
    fn from(handle: StmtHandle) -> Self {
        Handle::Statement(handle)
    }
}
