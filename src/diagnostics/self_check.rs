//! Cache Self-Check Suite
//!
//! Exercises the cache contract against scratch stores on a manual clock and
//! records each property as a [`TestResult`](super::TestResult).

use std::cell::Cell;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::cache::{CacheStore, ManualClock, MAX_KEY_LENGTH};
use crate::diagnostics::TestReport;

/// Name the suite reports under.
pub const SELF_CHECK_SUITE: &str = "cache-self-check";

type CheckResult = std::result::Result<String, String>;

fn ensure(condition: bool, failure: impl Into<String>) -> std::result::Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(failure.into())
    }
}

fn scratch_store() -> (CacheStore, ManualClock) {
    let clock = ManualClock::starting_at(1_700_000_000_000);
    let store = CacheStore::new(64, 300)
        .with_key_prefix("selfcheck_")
        .with_clock(Arc::new(clock.clone()));
    (store, clock)
}

// == Runner ==
/// Runs every cache check and returns the scored report.
pub fn run_cache_self_check(threshold: f64) -> TestReport {
    let mut report = TestReport::new(SELF_CHECK_SUITE, threshold);

    report.check("storage", "set_then_get", check_set_then_get);
    report.check("storage", "delete_then_get", check_delete_then_get);
    report.check("expiry", "visible_before_ttl", check_visible_before_ttl);
    report.check("expiry", "default_after_ttl", check_default_after_ttl);
    report.check("expiry", "zero_ttl_persists", check_zero_ttl_persists);
    report.check("remember", "computes_once", check_remember_computes_once);
    report.check("remember", "recomputes_after_expiry", check_remember_recomputes);
    report.check("groups", "clear_is_scoped", check_clear_is_scoped);
    report.check("metrics", "hit_rate", check_hit_rate);
    report.check("keys", "long_keys_hashed", check_long_keys_hashed);
    report.check("keys", "empty_key_rejected", check_empty_key_rejected);
    report.check("warmup", "failures_isolated", check_warm_up_isolation);

    info!(
        "Self-check finished: {}/{} passed ({:.1}%, threshold {:.1}%)",
        report.passed(),
        report.total(),
        report.score(),
        report.threshold()
    );
    report
}

// == Checks ==
fn check_set_then_get() -> CheckResult {
    let (mut store, _) = scratch_store();
    store
        .set("color", json!("#ff0000"), Some(60), "theme")
        .map_err(|e| e.to_string())?;
    let got = store.get("color", "theme");
    ensure(got == Some(json!("#ff0000")), format!("expected #ff0000, got {:?}", got))?;
    Ok("stored value returned".to_string())
}

fn check_delete_then_get() -> CheckResult {
    let (mut store, _) = scratch_store();
    store.set("color", json!("#ff0000"), None, "theme").map_err(|e| e.to_string())?;
    store.delete("color", "theme").map_err(|e| e.to_string())?;
    store.delete("color", "theme").map_err(|e| e.to_string())?;
    let got = store.get_or("color", "theme", json!("fallback"));
    ensure(got == json!("fallback"), format!("deleted key still returned {}", got))?;
    Ok("delete is idempotent and hides the key".to_string())
}

fn check_visible_before_ttl() -> CheckResult {
    let (mut store, clock) = scratch_store();
    store.set("color", json!("#ff0000"), Some(60), "theme").map_err(|e| e.to_string())?;
    clock.advance_secs(59);
    ensure(store.get("color", "theme").is_some(), "entry vanished before its TTL")?;
    Ok("entry visible at 59s of 60s".to_string())
}

fn check_default_after_ttl() -> CheckResult {
    let (mut store, clock) = scratch_store();
    store.set("color", json!("#ff0000"), Some(60), "theme").map_err(|e| e.to_string())?;
    clock.advance_secs(61);
    let got = store.get_or("color", "theme", json!("#000000"));
    ensure(got == json!("#000000"), format!("expired entry returned {}", got))?;
    ensure(store.is_empty(), "expired entry not purged on read")?;
    Ok("default returned after 61s".to_string())
}

fn check_zero_ttl_persists() -> CheckResult {
    let (mut store, clock) = scratch_store();
    store.set("layout", json!({"menu": "left"}), Some(0), "settings").map_err(|e| e.to_string())?;
    clock.advance_secs(90 * 24 * 3600);
    ensure(store.has("layout", "settings"), "zero-TTL entry expired")?;
    Ok("zero TTL never expires".to_string())
}

fn check_remember_computes_once() -> CheckResult {
    let (mut store, _) = scratch_store();
    let calls = Cell::new(0u32);
    let compute = || {
        calls.set(calls.get() + 1);
        Ok::<Value, String>(json!("generated"))
    };

    for _ in 0..5 {
        store.remember("css", "preview", Some(60), compute).map_err(|e| e.to_string())?;
    }
    ensure(calls.get() == 1, format!("callback ran {} times", calls.get()))?;
    Ok("callback ran once for five calls".to_string())
}

fn check_remember_recomputes() -> CheckResult {
    let (mut store, clock) = scratch_store();
    let calls = Cell::new(0u32);
    let compute = || {
        calls.set(calls.get() + 1);
        Ok::<Value, String>(json!(calls.get()))
    };

    store.remember("css", "preview", Some(60), compute).map_err(|e| e.to_string())?;
    clock.advance_secs(60);
    let value = store.remember("css", "preview", Some(60), compute).map_err(|e| e.to_string())?;
    ensure(calls.get() == 2, format!("callback ran {} times", calls.get()))?;
    ensure(value == json!(2), format!("stale value {} returned", value))?;
    Ok("callback re-ran after expiry".to_string())
}

fn check_clear_is_scoped() -> CheckResult {
    let (mut store, _) = scratch_store();
    for (key, group) in [("a", "theme"), ("b", "theme"), ("c", "menu")] {
        store.set(key, json!(key), None, group).map_err(|e| e.to_string())?;
    }

    let removed = store.clear(Some("theme"));
    ensure(removed == 2, format!("cleared {} entries, expected 2", removed))?;
    ensure(store.has("c", "menu"), "entry in another group was removed")?;
    ensure(!store.has("a", "theme"), "entry in cleared group survived")?;
    Ok("only the target group was cleared".to_string())
}

fn check_hit_rate() -> CheckResult {
    let (mut store, _) = scratch_store();
    store.set("k", json!(1), None, "g").map_err(|e| e.to_string())?;
    for _ in 0..3 {
        store.get("k", "g");
    }
    store.get("missing", "g");

    let metrics = store.metrics();
    ensure(
        metrics.hits == 3 && metrics.misses == 1,
        format!("counted {} hits / {} misses", metrics.hits, metrics.misses),
    )?;
    ensure(
        metrics.hit_rate() == 0.75,
        format!("hit rate {} != 0.75", metrics.hit_rate()),
    )?;
    Ok("hit rate 0.75 after 3 hits and 1 miss".to_string())
}

fn check_long_keys_hashed() -> CheckResult {
    let (mut store, _) = scratch_store();
    let long_key = "k".repeat(MAX_KEY_LENGTH * 3);
    store.set(&long_key, json!("v"), None, "g").map_err(|e| e.to_string())?;
    ensure(store.get(&long_key, "g") == Some(json!("v")), "long key not retrievable")?;

    let canonical = store
        .key_builder()
        .build(&long_key, "g")
        .map_err(|e| e.to_string())?;
    ensure(
        canonical.len() <= MAX_KEY_LENGTH,
        format!("canonical key is {} bytes", canonical.len()),
    )?;
    Ok(format!("long key hashed to {} bytes", canonical.len()))
}

fn check_empty_key_rejected() -> CheckResult {
    let (mut store, _) = scratch_store();
    ensure(
        store.set("   ", json!(1), None, "g").is_err(),
        "blank key was accepted",
    )?;
    ensure(store.get("", "g").is_none(), "blank key lookup returned a value")?;
    Ok("blank keys rejected on write, missed on read".to_string())
}

fn check_warm_up_isolation() -> CheckResult {
    let (mut store, _) = scratch_store();
    type Generator = Box<dyn FnOnce() -> std::result::Result<Value, String>>;
    let items: Vec<(String, Generator)> = vec![
        ("primary".to_string(), Box::new(|| Ok(json!("#0073aa")))),
        ("broken".to_string(), Box::new(|| Err("source unavailable".to_string()))),
        ("accent".to_string(), Box::new(|| Ok(json!("#d54e21")))),
    ];

    let outcomes = store.warm_up(items, "theme", Some(60));
    let succeeded = outcomes.values().filter(|o| o.success).count();
    ensure(succeeded == 2, format!("{} of 3 keys warmed", succeeded))?;
    ensure(store.has("accent", "theme"), "key after a failure was not warmed")?;
    Ok("failing key did not stop the warm-up".to_string())
}
