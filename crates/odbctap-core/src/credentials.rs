//! Connection credentials for a harness run

use std::fmt;

/// Data-source name used when none is supplied
pub const DEFAULT_DSN: &str = "test";
/// User id used when none is supplied
pub const DEFAULT_UID: &str = "root";
/// Password used when none is supplied
pub const DEFAULT_PWD: &str = "";

/// The three credentials passed to `SQLConnect`
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Data-source name
    pub dsn: String,
    /// User id
    pub uid: String,
    /// Password
    pub pwd: String,
}

impl Credentials {
    pub fn new(dsn: impl Into<String>, uid: impl Into<String>, pwd: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            uid: uid.into(),
            pwd: pwd.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_DSN, DEFAULT_UID, DEFAULT_PWD)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("dsn", &self.dsn)
            .field("uid", &self.uid)
            .field("pwd", &"***")
            .finish()
    }
}
