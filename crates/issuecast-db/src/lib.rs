//! Issuecast Database Layer
//!
//! SQLite-backed issue store read by the payload assembler.

pub mod migrations;
pub mod pool;
pub mod queries;

pub use pool::{init_pool, DbError, DbPool, DbResult};
