//! Database query implementations.

pub mod issues;
