//! Diagnostic records

use std::fmt;

/// Longest message the harness reads from a diagnostic record
/// (`SQL_MAX_MESSAGE_LENGTH`)
pub const MAX_MESSAGE_LENGTH: usize = 512;

/// Five-character SQLSTATE code
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlState([u8; 5]);

impl SqlState {
    /// Build from the raw state buffer; short input is padded with spaces
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut state = [b' '; 5];
        for (slot, byte) in state.iter_mut().zip(bytes.iter().take_while(|b| **b != 0)) {
            *slot = *byte;
        }
        Self(state)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("?????")
    }

    /// Class portion of the state (first two characters)
    pub fn class(&self) -> &str {
        std::str::from_utf8(&self.0[..2]).unwrap_or("??")
    }
}

impl From<&str> for SqlState {
    fn from(state: &str) -> Self {
        Self::from_bytes(state.as_bytes())
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SqlState({})", self.as_str())
    }
}

/// Error detail retrieved from a handle after a failed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// SQLSTATE of the failure
    pub state: SqlState,
    /// Driver-supplied message, at most `MAX_MESSAGE_LENGTH - 1` bytes
    pub message: String,
    /// Native error code of the data source
    pub native_error: i32,
}

impl DiagnosticRecord {
    pub fn new(state: impl Into<SqlState>, message: impl Into<String>, native_error: i32) -> Self {
        Self {
            state: state.into(),
            message: message.into(),
            native_error,
        }
    }
}
