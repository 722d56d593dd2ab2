//! ODBC driver manager binding
//!
//! The driver manager (unixODBC, iODBC or `odbc32.dll`) is loaded at
//! runtime, so building needs no ODBC headers or import libraries.

mod driver;
mod error;
mod library;

#[cfg(test)]
mod driver_tests;

pub use driver::OdbcDriver;
pub use error::DriverLoadError;
pub use library::library_candidates;
