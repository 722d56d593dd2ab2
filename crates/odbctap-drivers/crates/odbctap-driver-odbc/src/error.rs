/// The driver manager library could not be used
#[derive(Debug, thiserror::Error)]
pub enum DriverLoadError {
    #[error("failed to load driver manager '{path}': {source}")]
    Library {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("driver manager '{path}' does not export {symbol}: {source}")]
    MissingSymbol {
        path: String,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("no ODBC driver manager found (tried {})", .tried.join(", "))]
    NotFound { tried: Vec<String> },
}
