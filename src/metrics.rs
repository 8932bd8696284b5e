//! Settlement counters and Prometheus exposition

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide settlement counters. Cheap to update from any task.
pub struct SettlementMetrics {
    start_time: Instant,
    spins_settled: AtomicU64,
    spins_rejected: AtomicU64,
    spins_failed: AtomicU64,
    wagers_evaluated: AtomicU64,
    malformed_wagers: AtomicU64,
    ledger_conflicts: AtomicU64,
    rollbacks: AtomicU64,
    rollback_failures: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub spins_settled: u64,
    pub spins_rejected: u64,
    pub spins_failed: u64,
    pub wagers_evaluated: u64,
    pub malformed_wagers: u64,
    pub ledger_conflicts: u64,
    pub rollbacks: u64,
    pub rollback_failures: u64,
}

impl SettlementMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            spins_settled: AtomicU64::new(0),
            spins_rejected: AtomicU64::new(0),
            spins_failed: AtomicU64::new(0),
            wagers_evaluated: AtomicU64::new(0),
            malformed_wagers: AtomicU64::new(0),
            ledger_conflicts: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
            rollback_failures: AtomicU64::new(0),
        }
    }

    pub fn record_settled(&self, wagers: u64) {
        self.spins_settled.fetch_add(1, Ordering::Relaxed);
        self.wagers_evaluated.fetch_add(wagers, Ordering::Relaxed);
    }

    /// Domain rejection (insufficient balance, too many wagers)
    pub fn record_rejected(&self) {
        self.spins_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Service failure; balance restored
    pub fn record_failed(&self) {
        self.spins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self, count: u64) {
        self.malformed_wagers.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.ledger_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rollback_failure(&self) {
        self.rollback_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_seconds: self.uptime().as_secs(),
            spins_settled: self.spins_settled.load(Ordering::Relaxed),
            spins_rejected: self.spins_rejected.load(Ordering::Relaxed),
            spins_failed: self.spins_failed.load(Ordering::Relaxed),
            wagers_evaluated: self.wagers_evaluated.load(Ordering::Relaxed),
            malformed_wagers: self.malformed_wagers.load(Ordering::Relaxed),
            ledger_conflicts: self.ledger_conflicts.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            rollback_failures: self.rollback_failures.load(Ordering::Relaxed),
        }
    }

    /// Render in the Prometheus text exposition format
    pub fn to_prometheus_format(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            ("roulette_spins_settled_total", "Spins committed to the ledger", snapshot.spins_settled),
            ("roulette_spins_rejected_total", "Spins rejected before any ledger write", snapshot.spins_rejected),
            ("roulette_spins_failed_total", "Spins failed by ledger errors", snapshot.spins_failed),
            ("roulette_wagers_evaluated_total", "Wagers evaluated in settled spins", snapshot.wagers_evaluated),
            ("roulette_malformed_wagers_total", "Malformed wagers skipped as zero stake", snapshot.malformed_wagers),
            ("roulette_ledger_conflicts_total", "Compare-and-set conflicts retried", snapshot.ledger_conflicts),
            ("roulette_rollbacks_total", "Debits returned after a failed credit", snapshot.rollbacks),
            ("roulette_rollback_failures_total", "Debits that could not be returned", snapshot.rollback_failures),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n\n"
            ));
        }
        output.push_str(&format!(
            "# HELP roulette_uptime_seconds Seconds since the engine started\n\
             # TYPE roulette_uptime_seconds gauge\n\
             roulette_uptime_seconds {}\n",
            snapshot.uptime_seconds
        ));
        output
    }
}

impl Default for SettlementMetrics {
    fn default() -> Self {
        Self::new()
    }
}
