//! Backend hosts registered on the ring.
//!
//! A host is identified by its address string (`name:port`). The in-flight
//! counter lives on the host itself so that load updates only touch the
//! host they concern; see [`LoadTracker`](crate::load::LoadTracker) for the
//! aggregate.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// A registered backend host.
///
/// Shared as `Arc<Host>` between the registry and the virtual nodes that
/// point at it. Two `Arc`s are the same registration only if
/// `Arc::ptr_eq` holds; a host unregistered and registered again under the
/// same name is a new instance with a fresh counter.
#[derive(Debug)]
pub struct Host {
    name: String,
    load: AtomicI64,
}

impl Host {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            load: AtomicI64::new(0),
        }
    }

    /// Address the host was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current in-flight count. May be transiently negative after an
    /// unmatched release; capacity math clamps it.
    pub fn load(&self) -> i64 {
        self.load.load(Ordering::Acquire)
    }

    pub(crate) fn add_load(&self, delta: i64) {
        self.load.fetch_add(delta, Ordering::AcqRel);
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (load={})", self.name, self.load())
    }
}
