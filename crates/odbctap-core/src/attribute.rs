//! Attributes the harness sets on its handles

/// Version of the call-level interface the application declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OdbcVersion {
    V2,
    V3,
}

impl OdbcVersion {
    pub const fn value(self) -> usize {
        match self {
            OdbcVersion::V2 => 2,
            OdbcVersion::V3 => 3,
        }
    }
}

/// Environment attribute (`SQLSetEnvAttr`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvAttribute {
    OdbcVersion(OdbcVersion),
}

impl EnvAttribute {
    /// Attribute identifier
    pub const fn code(self) -> i32 {
        match self {
            // SQL_ATTR_ODBC_VERSION
            EnvAttribute::OdbcVersion(_) => 200,
        }
    }

    /// Integer value, passed in the pointer argument
    pub const fn value(self) -> usize {
        match self {
            EnvAttribute::OdbcVersion(version) => version.value(),
        }
    }
}

/// Connection attribute (`SQLSetConnectAttr`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectAttribute {
    AutoCommit(bool),
}

impl ConnectAttribute {
    pub const fn code(self) -> i32 {
        match self {
            // SQL_ATTR_AUTOCOMMIT
            ConnectAttribute::AutoCommit(_) => 102,
        }
    }

    pub const fn value(self) -> usize {
        match self {
            ConnectAttribute::AutoCommit(on) => on as usize,
        }
    }
}

/// `SQL_ATTR_CURSOR_TYPE` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorType {
    ForwardOnly,
    KeysetDriven,
    Dynamic,
    Static,
}

impl CursorType {
    pub const fn value(self) -> usize {
        match self {
            CursorType::ForwardOnly => 0,
            CursorType::KeysetDriven => 1,
            CursorType::Dynamic => 2,
            CursorType::Static => 3,
        }
    }
}

/// `SQL_ATTR_SIMULATE_CURSOR` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulateCursor {
    NonUnique,
    TryUnique,
    Unique,
}

impl SimulateCursor {
    pub const fn value(self) -> usize {
        match self {
            SimulateCursor::NonUnique => 0,
            SimulateCursor::TryUnique => 1,
            SimulateCursor::Unique => 2,
        }
    }
}

/// Statement attribute (`SQLSetStmtAttr`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StmtAttribute {
    CursorType(CursorType),
    SimulateCursor(SimulateCursor),
}

impl StmtAttribute {
    pub const fn code(self) -> i32 {
        match self {
            StmtAttribute::CursorType(_) => 6,
            StmtAttribute::SimulateCursor(_) => 10,
        }
    }

    pub const fn value(self) -> usize {
        match self {
            StmtAttribute::CursorType(cursor) => cursor.value(),
            StmtAttribute::SimulateCursor(mode) => mode.value(),
        }
    }
}

/// How `SQLEndTran` completes the current transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionType {
    Commit,
    Rollback,
}

impl CompletionType {
    pub const fn code(self) -> i16 {
        match self {
            CompletionType::Commit => 0,
            CompletionType::Rollback => 1,
        }
    }
}
