//! Integration tests for sql-submit.

pub mod config_test;
pub mod script_test;
pub mod source_test;
