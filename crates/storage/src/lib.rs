#![forbid(unsafe_code)]

//! SQLite persistence for ordered map markers and their sync groups.
//!
//! Active markers keep their visiting order as a chain of successor ids; see
//! [`mk_core::chain`] for how the order is recovered from a scan.

mod store;

pub use store::*;
