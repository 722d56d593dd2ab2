//! Runtime-loaded driver manager entry points

use std::ffi::{OsStr, c_void};

use libloading::{Library, Symbol};

use crate::error::DriverLoadError;

pub(crate) type SqlHandle = *mut c_void;

pub(crate) type AllocHandleFn =
    unsafe extern "system" fn(handle_type: i16, input: SqlHandle, output: *mut SqlHandle) -> i16;
pub(crate) type FreeHandleFn = unsafe extern "system" fn(handle_type: i16, handle: SqlHandle) -> i16;
pub(crate) type SetAttrFn =
    unsafe extern "system" fn(handle: SqlHandle, attribute: i32, value: *mut c_void, length: i32) -> i16;
pub(crate) type ConnectFn = unsafe extern "system" fn(
    dbc: SqlHandle,
    dsn: *const u8,
    dsn_len: i16,
    uid: *const u8,
    uid_len: i16,
    pwd: *const u8,
    pwd_len: i16,
) -> i16;
pub(crate) type HandleFn = unsafe extern "system" fn(handle: SqlHandle) -> i16;
pub(crate) type ExecDirectFn =
    unsafe extern "system" fn(stmt: SqlHandle, text: *const u8, text_len: i32) -> i16;
pub(crate) type FreeStmtFn = unsafe extern "system" fn(stmt: SqlHandle, option: u16) -> i16;
pub(crate) type EndTranFn =
    unsafe extern "system" fn(handle_type: i16, handle: SqlHandle, completion: i16) -> i16;
pub(crate) type GetDiagRecFn = unsafe extern "system" fn(
    handle_type: i16,
    handle: SqlHandle,
    record: i16,
    state: *mut u8,
    native_error: *mut i32,
    message: *mut u8,
    buffer_len: i16,
    text_len: *mut i16,
) -> i16;

#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &["odbc32.dll"];
#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &["libodbc.2.dylib", "libiodbc.2.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CANDIDATES: &[&str] = &["libodbc.so.2", "libodbc.so", "libiodbc.so.2"];

/// Library names tried, in order, when no driver manager path is given
pub fn library_candidates() -> &'static [&'static str] {
    CANDIDATES
}

/// Entry points resolved from a loaded driver manager
///
/// The function pointers stay valid for as long as `_library` is loaded,
/// which is the lifetime of this value.
pub(crate) struct OdbcLibrary {
    pub(crate) alloc_handle: AllocHandleFn,
    pub(crate) free_handle: FreeHandleFn,
    pub(crate) set_env_attr: SetAttrFn,
    pub(crate) set_connect_attr: SetAttrFn,
    pub(crate) set_stmt_attr: SetAttrFn,
    pub(crate) connect: ConnectFn,
    pub(crate) disconnect: HandleFn,
    pub(crate) exec_direct: ExecDirectFn,
    pub(crate) fetch: HandleFn,
    pub(crate) free_stmt: FreeStmtFn,
    pub(crate) end_tran: EndTranFn,
    pub(crate) get_diag_rec: GetDiagRecFn,
    _library: Library,
}

impl OdbcLibrary {
    /// Load the library at `path` and resolve every entry point
    pub(crate) fn open(path: impl AsRef<OsStr>) -> Result<Self, DriverLoadError> {
        let path = path.as_ref();
        let display = path.to_string_lossy().into_owned();

        // SAFETY: loading runs the library's initializers; driver managers
        // are ordinary shared libraries without unusual init requirements.
        let library = unsafe { Library::new(path) }.map_err(|source| DriverLoadError::Library {
            path: display.clone(),
            source,
        })?;

        let symbols = Resolver {
            library: &library,
            path: &display,
        };
        // SAFETY: each type alias matches the ODBC 3 prototype of the named
        // ANSI entry point.
        unsafe {
            Ok(Self {
                alloc_handle: symbols.get("SQLAllocHandle")?,
                free_handle: symbols.get("SQLFreeHandle")?,
                set_env_attr: symbols.get("SQLSetEnvAttr")?,
                set_connect_attr: symbols.get("SQLSetConnectAttr")?,
                set_stmt_attr: symbols.get("SQLSetStmtAttr")?,
                connect: symbols.get("SQLConnect")?,
                disconnect: symbols.get("SQLDisconnect")?,
                exec_direct: symbols.get("SQLExecDirect")?,
                fetch: symbols.get("SQLFetch")?,
                free_stmt: symbols.get("SQLFreeStmt")?,
                end_tran: symbols.get("SQLEndTran")?,
                get_diag_rec: symbols.get("SQLGetDiagRec")?,
                _library: library,
            })
        }
    }
}

struct Resolver<'a> {
    library: &'a Library,
    path: &'a str,
}

impl Resolver<'_> {
    /// Copy the function pointer for `symbol` out of the library
    ///
    /// # Safety
    ///
    /// `T` must be the exact function pointer type of the exported symbol.
    unsafe fn get<T: Copy>(&self, symbol: &'static str) -> Result<T, DriverLoadError> {
        let resolved: Symbol<'_, T> = unsafe { self.library.get(symbol.as_bytes()) }.map_err(
            |source| DriverLoadError::MissingSymbol {
                path: self.path.to_string(),
                symbol,
                source,
            },
        )?;
        Ok(*resolved)
    }
}
