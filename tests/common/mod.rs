//! Common test utilities module
//!
//! Provides shared utilities for tests including:
//! - Temporary file and directory management
//! - Synthetic monthly history

pub mod test_utils;

#[allow(unused_imports)]
pub use test_utils::{
    create_test_csv, first_month, monthly_history, seasonal_history, short_history,
    write_history, TempTestDir, TempTestFile,
};
