//! Diagnostics Module
//!
//! Scored check reports and the built-in cache self-check suite.

mod report;
mod self_check;

pub use report::{ReportDocument, TestReport, TestResult};
pub use self_check::{run_cache_self_check, SELF_CHECK_SUITE};
