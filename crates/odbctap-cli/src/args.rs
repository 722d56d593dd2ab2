//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use odbctap_core::{Credentials, DEFAULT_DSN, DEFAULT_PWD, DEFAULT_UID};

/// Run ODBC conformance tests against a data source and report them as TAP
#[derive(Parser)]
#[command(name = "odbctap", version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Data source name to connect to
    #[arg(env = "ODBCTAP_DSN", default_value = DEFAULT_DSN)]
    pub dsn: String,

    /// User name
    #[arg(env = "ODBCTAP_UID", default_value = DEFAULT_UID)]
    pub uid: String,

    /// Password
    #[arg(env = "ODBCTAP_PWD", default_value = DEFAULT_PWD, hide_env_values = true)]
    pub pwd: String,

    /// Further positional arguments are accepted and ignored
    #[arg(hide = true)]
    pub ignored: Vec<String>,

    /// Path or name of the ODBC driver manager library
    #[arg(long, env = "ODBCTAP_DRIVER_MANAGER", value_name = "PATH")]
    pub driver_manager: Option<PathBuf>,

    /// Only run tests whose name contains this text
    #[arg(long, value_name = "SUBSTRING")]
    pub filter: Option<String>,

    /// Print the test names and exit without connecting
    #[arg(long)]
    pub list: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Format of the log written to stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.dsn, &self.uid, &self.pwd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}
