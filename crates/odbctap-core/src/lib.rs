//! odbctap Core - the driver boundary the harness is written against
//!
//! This crate defines the handle-based, call-return interface a database
//! client driver exposes to the test harness:
//!
//! - `Driver` - Trait for the synchronous calls the harness issues
//! - `SqlReturn` - Outcome code of every call
//! - `EnvHandle`, `DbcHandle`, `StmtHandle` - Opaque driver-owned handles
//! - `DiagnosticRecord` - Error detail retrieved after a failed call
//! - `Credentials` - Data-source name, user id and password for a run

mod attribute;
mod credentials;
mod diagnostic;
mod driver;
mod error;
mod handle;
mod outcome;

pub use attribute::*;
pub use credentials::*;
pub use diagnostic::*;
pub use driver::*;
pub use error::*;
pub use handle::*;
pub use outcome::*;
