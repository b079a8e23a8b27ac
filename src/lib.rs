//! sql-submit - submit multi-statement SQL scripts as one job.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod logging;
pub mod operation;
pub mod script;
pub mod source;
