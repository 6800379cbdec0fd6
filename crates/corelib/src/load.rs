//! In-flight load accounting.
//!
//! Per-host counters live on [`Host`]; the aggregate lives here. Mutators
//! take the snapshot gate shared and update both counters with atomic adds,
//! so increments against different hosts never wait on each other.
//! Snapshot readers take the gate exclusively, which drains in-flight
//! mutators and guarantees `total == Σ host loads` in what they observe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::host::Host;

/// Aggregate load counter plus the gate that makes snapshots consistent.
#[derive(Debug, Default)]
pub struct LoadTracker {
    total: AtomicI64,
    gate: RwLock<()>,
}

/// Consistent view of every host's load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSnapshot {
    pub loads: HashMap<String, i64>,
    pub total: i64,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, host: &Host) {
        let _shared = self.gate.read();
        host.add_load(1);
        self.total.fetch_add(1, Ordering::AcqRel);
    }

    pub fn dec(&self, host: &Host) {
        let _shared = self.gate.read();
        host.add_load(-1);
        self.total.fetch_sub(1, Ordering::AcqRel);
    }

    /// Drop a departing host's residual load from the aggregate.
    pub(crate) fn discard(&self, host: &Host) {
        let _exclusive = self.gate.write();
        self.total.fetch_sub(host.load(), Ordering::AcqRel);
    }

    /// Consistent aggregate load.
    pub fn total(&self) -> i64 {
        let _exclusive = self.gate.write();
        self.total.load(Ordering::Acquire)
    }

    /// Aggregate load without waiting for in-flight mutators. Used on the
    /// selection hot path, where a slightly stale value is acceptable.
    pub(crate) fn total_relaxed(&self) -> i64 {
        self.total.load(Ordering::Acquire)
    }

    pub fn snapshot<'a>(&self, hosts: impl IntoIterator<Item = &'a Arc<Host>>) -> LoadSnapshot {
        let _exclusive = self.gate.write();
        let loads = hosts
            .into_iter()
            .map(|h| (h.name().to_string(), h.load()))
            .collect();
        LoadSnapshot {
            loads,
            total: self.total.load(Ordering::Acquire),
        }
    }
}

/// Largest load a host may reach when accepting one more request.
///
/// `ceil(((total + 1) / hosts) * (1 + factor))`, never below 1. A negative
/// total (more releases than reservations) is treated as 0.
pub fn capacity(total: i64, host_count: usize, factor: f64) -> i64 {
    if host_count == 0 {
        return 0;
    }
    let total = total.max(0);
    let avg = (total + 1) as f64 / host_count as f64;
    ((avg * (1.0 + factor)).ceil() as i64).max(1)
}

/// Current per-host ceiling, for observability: like [`capacity`] but
/// without the pending request, with a zero total counted as 1.
pub fn max_load(total: i64, host_count: usize, factor: f64) -> i64 {
    if host_count == 0 {
        return 0;
    }
    let total = if total <= 0 { 1 } else { total };
    let avg = total as f64 / host_count as f64;
    ((avg * (1.0 + factor)).ceil() as i64).max(1)
}
