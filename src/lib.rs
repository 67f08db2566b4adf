//! Styler Cache - a grouped TTL cache service
//!
//! Provides get/set/delete, get-or-compute (`remember`), group clearing and
//! bulk warm-up over an in-process store with lazy expiry, plus a scored
//! self-check suite and an HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use diagnostics::{run_cache_self_check, TestReport, TestResult};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
