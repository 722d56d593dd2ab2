//! Conformance tests run by the `odbctap` binary
//!
//! Every test works on the shared statement handle and closes its cursor
//! before passing, so the next test starts from a clean statement.

mod basics;

pub use basics::{
    MAX_SELECT_ROWS, my_basics, t_autocommit_visible, t_delete_no_rows, t_max_select,
    t_syntax_error, t_transaction_commit,
};

use odbctap_harness::{TestRegistry, register_tests};

/// The basic statement and transaction tests, in execution order
pub fn basics() -> TestRegistry {
    register_tests![
        my_basics,
        t_delete_no_rows,
        t_autocommit_visible,
        t_transaction_commit,
        t_max_select,
        t_syntax_error,
    ]
}
