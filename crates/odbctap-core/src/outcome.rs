//! Outcome codes returned by driver calls

use std::fmt;

/// The categorical result of a driver call (`SQLRETURN`)
///
/// Renders as its numeric code, which is what the TAP diagnostics print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlReturn(pub i16);

impl SqlReturn {
    pub const SUCCESS: SqlReturn = SqlReturn(0);
    pub const SUCCESS_WITH_INFO: SqlReturn = SqlReturn(1);
    pub const STILL_EXECUTING: SqlReturn = SqlReturn(2);
    pub const ERROR: SqlReturn = SqlReturn(-1);
    pub const INVALID_HANDLE: SqlReturn = SqlReturn(-2);
    pub const NEED_DATA: SqlReturn = SqlReturn(99);
    pub const NO_DATA: SqlReturn = SqlReturn(100);

    /// `SQL_SUCCEEDED`: the call returned success or success with info
    pub const fn succeeded(self) -> bool {
        matches!(self.0, 0 | 1)
    }

    /// Raw numeric code
    pub const fn code(self) -> i16 {
        self.0
    }

    /// Symbolic name for the well-known codes
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::SUCCESS => Some("SQL_SUCCESS"),
            Self::SUCCESS_WITH_INFO => Some("SQL_SUCCESS_WITH_INFO"),
            Self::STILL_EXECUTING => Some("SQL_STILL_EXECUTING"),
            Self::ERROR => Some("SQL_ERROR"),
            Self::INVALID_HANDLE => Some("SQL_INVALID_HANDLE"),
            Self::NEED_DATA => Some("SQL_NEED_DATA"),
            Self::NO_DATA => Some("SQL_NO_DATA"),
            _ => None,
        }
    }
}

impl fmt::Display for SqlReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i16> for SqlReturn {
    fn from(code: i16) -> Self {
        SqlReturn(code)
    }
}
