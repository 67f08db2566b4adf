//! Test Report Module
//!
//! Collects check results during a run, scores them against a threshold and
//! serializes the outcome as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

// == Test Result ==
/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub category: String,
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        passed: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            passed,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn pass(category: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(category, name, true, message)
    }

    pub fn fail(category: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(category, name, false, message)
    }
}

// == Test Report ==
/// Append-only collection of results for one suite run.
#[derive(Debug, Clone)]
pub struct TestReport {
    suite: String,
    /// Minimum passing percentage (0..=100)
    threshold: f64,
    started_at: DateTime<Utc>,
    results: Vec<TestResult>,
}

/// Serialized form of a finished report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passing checks
    pub score: f64,
    pub success: bool,
    /// Per-category (passed, total)
    pub categories: BTreeMap<String, (usize, usize)>,
    pub results: Vec<TestResult>,
}

impl TestReport {
    pub fn new(suite: impl Into<String>, threshold: f64) -> Self {
        Self {
            suite: suite.into(),
            threshold: threshold.clamp(0.0, 100.0),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, result: TestResult) {
        if result.passed {
            debug!("[PASS] {}/{}: {}", result.category, result.name, result.message);
        } else {
            warn!("[FAIL] {}/{}: {}", result.category, result.name, result.message);
        }
        self.results.push(result);
    }

    // == Check ==
    /// Runs one check and records its outcome.
    ///
    /// `Ok(message)` passes, `Err(message)` fails. A panic inside the check
    /// is caught here and recorded as a failure so the suite keeps going.
    pub fn check<F>(&mut self, category: &str, name: &str, check: F)
    where
        F: FnOnce() -> std::result::Result<String, String>,
    {
        let result = match panic::catch_unwind(AssertUnwindSafe(check)) {
            Ok(Ok(message)) => TestResult::pass(category, name, message),
            Ok(Err(message)) => TestResult::fail(category, name, message),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                TestResult::fail(category, name, format!("check panicked: {}", reason))
            }
        };
        self.record(result);
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    // == Score ==
    /// Percentage of passing checks. An empty report scores 0.
    pub fn score(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.passed() as f64 * 100.0 / self.total() as f64
        }
    }

    pub fn is_success(&self) -> bool {
        !self.results.is_empty() && self.score() >= self.threshold
    }

    pub fn categories(&self) -> BTreeMap<String, (usize, usize)> {
        let mut categories: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for result in &self.results {
            let slot = categories.entry(result.category.clone()).or_default();
            slot.1 += 1;
            if result.passed {
                slot.0 += 1;
            }
        }
        categories
    }

    pub fn document(&self) -> ReportDocument {
        ReportDocument {
            suite: self.suite.clone(),
            started_at: self.started_at,
            generated_at: Utc::now(),
            threshold: self.threshold,
            total: self.total(),
            passed: self.passed(),
            failed: self.failed(),
            score: self.score(),
            success: self.is_success(),
            categories: self.categories(),
            results: self.results.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Writes the JSON report, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}
