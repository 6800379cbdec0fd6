//! Hash ring with bounded-load host selection.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::load::{self, LoadSnapshot, LoadTracker};
use crate::partitioner::Partitioner;
use crate::ring::Reservation;
use crate::token::Token;
use crate::vnode::{vnode_tokens, VirtualNode};

/// Ring structure guarded as one unit.
///
/// `ring` is sorted ascending and holds exactly the keys of `virt2host`.
/// `shadowed` queues, per token, the later hosts whose vnode collided with
/// the current owner, in registration order.
#[derive(Default)]
struct RingState {
    hosts: HashMap<String, Arc<Host>>,
    virt2host: HashMap<Token, Arc<Host>>,
    ring: Vec<Token>,
    shadowed: HashMap<Token, Vec<Arc<Host>>>,
}

impl RingState {
    /// Index of the first token `>= token`, wrapping to 0 past the end.
    fn search(&self, token: Token) -> usize {
        let idx = self.ring.partition_point(|t| *t < token);
        if idx >= self.ring.len() {
            0
        } else {
            idx
        }
    }

    fn owner_at(&self, idx: usize) -> Option<&Arc<Host>> {
        self.ring.get(idx).and_then(|t| self.virt2host.get(t))
    }

    fn is_registered(&self, host: &Arc<Host>) -> bool {
        self.hosts
            .get(host.name())
            .is_some_and(|current| Arc::ptr_eq(current, host))
    }
}

/// Consistent hash ring mapping keys to hosts.
///
/// Structural changes (register/unregister) take the ring lock exclusively;
/// lookups and load updates take it shared. Load counters are atomics behind
/// a separate [`LoadTracker`], so reservations on different hosts proceed in
/// parallel.
///
/// # Example
///
/// ```rust
/// use corelib::{HashRing, RingConfig};
///
/// let ring = HashRing::new(RingConfig::default());
/// ring.register_host("10.0.0.1:8080").unwrap();
/// ring.register_host("10.0.0.2:8080").unwrap();
///
/// let host = ring.get_host("user:42").unwrap();
/// assert!(ring.hosts().contains(&host));
///
/// let reservation = ring.reserve("user:42").unwrap();
/// assert_eq!(ring.total_load(), 1);
/// drop(reservation);
/// assert_eq!(ring.total_load(), 0);
/// ```
pub struct HashRing {
    config: RingConfig,
    partitioner: Box<dyn Partitioner>,
    state: RwLock<RingState>,
    loads: LoadTracker,
}

impl HashRing {
    /// Empty ring using the partitioner named in `config`.
    pub fn new(config: RingConfig) -> Self {
        let partitioner = config.hash.partitioner();
        Self::from_boxed(config, partitioner)
    }

    /// Empty ring with a caller-supplied hash function. `config.hash` is
    /// ignored.
    pub fn with_partitioner(config: RingConfig, partitioner: impl Partitioner) -> Self {
        Self::from_boxed(config, Box::new(partitioner))
    }

    pub(crate) fn from_boxed(config: RingConfig, partitioner: Box<dyn Partitioner>) -> Self {
        Self {
            config: config.normalized(),
            partitioner,
            state: RwLock::new(RingState::default()),
            loads: LoadTracker::new(),
        }
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Add a host and its virtual nodes.
    ///
    /// A vnode whose token is already on the ring stays with the earlier
    /// owner; the new host takes it over if that owner leaves first.
    pub fn register_host(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.hosts.contains_key(name) {
            return Err(Error::HostAlreadyExists(name.to_string()));
        }

        let host = Arc::new(Host::new(name));
        let mut placed = 0usize;
        for token in vnode_tokens(self.partitioner.as_ref(), name, self.config.replicas) {
            match state.ring.binary_search(&token) {
                Ok(_) => {
                    warn!(host = name, %token, "virtual node collides with an existing token");
                    state
                        .shadowed
                        .entry(token)
                        .or_default()
                        .push(Arc::clone(&host));
                }
                Err(pos) => {
                    state.ring.insert(pos, token);
                    state.virt2host.insert(token, Arc::clone(&host));
                    placed += 1;
                }
            }
        }
        state.hosts.insert(name.to_string(), host);

        debug!(host = name, placed, tokens = state.ring.len(), "registered host");
        Ok(())
    }

    /// Remove a host, its virtual nodes, and its share of the total load.
    pub fn unregister_host(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        let host = state
            .hosts
            .remove(name)
            .ok_or_else(|| Error::HostNotFound(name.to_string()))?;

        let mut removed = 0usize;
        let mut handed_over = 0usize;
        for token in vnode_tokens(self.partitioner.as_ref(), name, self.config.replicas) {
            let owned = state
                .virt2host
                .get(&token)
                .is_some_and(|owner| Arc::ptr_eq(owner, &host));
            if !owned {
                if let Some(waiting) = state.shadowed.get_mut(&token) {
                    waiting.retain(|h| !Arc::ptr_eq(h, &host));
                    if waiting.is_empty() {
                        state.shadowed.remove(&token);
                    }
                }
                continue;
            }

            let heir = match state.shadowed.get_mut(&token) {
                Some(waiting) if !waiting.is_empty() => Some(waiting.remove(0)),
                _ => None,
            };
            if state.shadowed.get(&token).is_some_and(|w| w.is_empty()) {
                state.shadowed.remove(&token);
            }
            match heir {
                Some(heir) => {
                    state.virt2host.insert(token, heir);
                    handed_over += 1;
                }
                None => {
                    state.virt2host.remove(&token);
                    if let Ok(pos) = state.ring.binary_search(&token) {
                        state.ring.remove(pos);
                        removed += 1;
                    }
                }
            }
        }
        self.loads.discard(&host);

        debug!(
            host = name,
            removed,
            handed_over,
            residual_load = host.load(),
            tokens = state.ring.len(),
            "unregistered host"
        );
        Ok(())
    }

    /// Host owning `key`: the first virtual node clockwise from its hash.
    pub fn get_host<K: AsRef<[u8]>>(&self, key: K) -> Result<String> {
        let token = self.partitioner.partition(key.as_ref());
        let state = self.state.read();
        state
            .owner_at(state.search(token))
            .map(|h| h.name().to_string())
            .ok_or(Error::EmptyRing)
    }

    /// Host owning `key` subject to the load bound.
    ///
    /// Walks clockwise from the key's position and returns the first host
    /// whose load would stay within [`load::capacity`] after one more
    /// request. Does not reserve anything; see [`HashRing::reserve`].
    pub fn get_host_capacious<K: AsRef<[u8]>>(&self, key: K) -> Result<String> {
        let state = self.state.read();
        self.select_capacious(&state, key.as_ref())
            .map(|h| h.name().to_string())
    }

    /// Pick a host with headroom for `key` and count one request against it.
    ///
    /// Selection and increment happen under one shared lock, so the host
    /// cannot be unregistered in between. The load is released when the
    /// returned guard drops.
    pub fn reserve<K: AsRef<[u8]>>(&self, key: K) -> Result<Reservation<'_>> {
        let state = self.state.read();
        let host = self.select_capacious(&state, key.as_ref())?;
        self.loads.inc(&host);
        Ok(Reservation::new(self, host))
    }

    fn select_capacious(&self, state: &RingState, key: &[u8]) -> Result<Arc<Host>> {
        let len = state.ring.len();
        if len == 0 {
            return Err(Error::EmptyRing);
        }

        let cap = load::capacity(
            self.loads.total_relaxed(),
            state.hosts.len(),
            self.config.load_bound_factor,
        );
        let start = state.search(self.partitioner.partition(key));

        // One lap at most.
        for step in 0..len {
            let Some(host) = state.owner_at((start + step) % len) else {
                continue;
            };
            if host.load().max(0) + 1 <= cap {
                return Ok(Arc::clone(host));
            }
        }

        warn!(cap, hosts = state.hosts.len(), "bounded-load walk found no host with headroom");
        Err(Error::CapacityExhausted)
    }

    /// Count one in-flight request against `name`.
    pub fn inc(&self, name: &str) -> Result<()> {
        let state = self.state.read();
        let host = state
            .hosts
            .get(name)
            .ok_or_else(|| Error::HostNotFound(name.to_string()))?;
        self.loads.inc(host);
        Ok(())
    }

    /// Release one in-flight request from `name`. No-op if the host has
    /// been unregistered since.
    pub fn done(&self, name: &str) {
        let state = self.state.read();
        match state.hosts.get(name) {
            Some(host) => self.decrement(host),
            None => debug!(host = name, "release for unregistered host ignored"),
        }
    }

    /// Release against the exact registration `host` came from.
    pub(crate) fn release(&self, host: &Arc<Host>) {
        let state = self.state.read();
        if state.is_registered(host) {
            self.decrement(host);
        } else {
            debug!(host = host.name(), "reservation outlived its host");
        }
    }

    fn decrement(&self, host: &Host) {
        self.loads.dec(host);
        if host.load() < 0 {
            warn!(host = host.name(), load = host.load(), "load released more often than reserved");
        }
    }

    /// Per-host in-flight counts.
    pub fn get_loads(&self) -> HashMap<String, i64> {
        self.load_snapshot().loads
    }

    /// Per-host counts together with the aggregate, taken atomically.
    pub fn load_snapshot(&self) -> LoadSnapshot {
        let state = self.state.read();
        self.loads.snapshot(state.hosts.values())
    }

    pub fn total_load(&self) -> i64 {
        self.loads.total()
    }

    /// Current per-host ceiling; see [`load::max_load`].
    pub fn max_load(&self) -> i64 {
        let state = self.state.read();
        load::max_load(
            self.loads.total(),
            state.hosts.len(),
            self.config.load_bound_factor,
        )
    }

    /// Registered host names, sorted.
    pub fn hosts(&self) -> Vec<String> {
        let state = self.state.read();
        let mut hosts: Vec<String> = state.hosts.keys().cloned().collect();
        hosts.sort_unstable();
        hosts
    }

    pub fn contains_host(&self, name: &str) -> bool {
        self.state.read().hosts.contains_key(name)
    }

    pub fn host_count(&self) -> usize {
        self.state.read().hosts.len()
    }

    pub fn token_count(&self) -> usize {
        self.state.read().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().ring.is_empty()
    }

    /// All virtual nodes in ring order.
    pub fn tokens(&self) -> Vec<VirtualNode> {
        let state = self.state.read();
        state
            .ring
            .iter()
            .filter_map(|t| state.virt2host.get(t).map(|h| VirtualNode::new(*t, h.name())))
            .collect()
    }

    /// Fraction of the key space each host owns.
    ///
    /// A vnode owns the arc from its predecessor (exclusive) up to itself.
    pub fn ownership(&self) -> HashMap<String, f64> {
        let state = self.state.read();
        let mut shares: HashMap<String, f64> = HashMap::new();
        let len = state.ring.len();
        if len == 1 {
            if let Some(host) = state.owner_at(0) {
                shares.insert(host.name().to_string(), 1.0);
            }
            return shares;
        }

        const RING_SIZE: f64 = u64::MAX as f64 + 1.0;
        for idx in 0..len {
            let prev = state.ring[(idx + len - 1) % len];
            let arc = prev.distance_to(&state.ring[idx]) as f64 / RING_SIZE;
            if let Some(host) = state.owner_at(idx) {
                *shares.entry(host.name().to_string()).or_default() += arc;
            }
        }
        shares
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("HashRing")
            .field("config", &self.config)
            .field("partitioner", &self.partitioner.name())
            .field("hosts", &state.hosts.len())
            .field("tokens", &state.ring.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(hosts: &[&str]) -> HashRing {
        let ring = HashRing::new(RingConfig::default());
        for h in hosts {
            ring.register_host(h).unwrap();
        }
        ring
    }

    /// Partitioner that reads the key as a decimal number, so tests can
    /// place tokens exactly.
    fn numeric(key: &[u8]) -> u64 {
        std::str::from_utf8(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn test_search_wraps_past_last_token() {
        let state = RingState {
            ring: vec![Token(10), Token(20), Token(30)],
            ..Default::default()
        };
        assert_eq!(state.search(Token(5)), 0);
        assert_eq!(state.search(Token(10)), 0);
        assert_eq!(state.search(Token(11)), 1);
        assert_eq!(state.search(Token(30)), 2);
        assert_eq!(state.search(Token(31)), 0);
    }

    #[test]
    fn test_lookup_is_successor() {
        // Host "1" with 1 replica: token of "10" = 10. Host "2": token 20.
        let config = RingConfig::default().with_replicas(1);
        let ring = HashRing::with_partitioner(config, numeric);
        ring.register_host("1").unwrap();
        ring.register_host("2").unwrap();

        assert_eq!(ring.get_host("5").unwrap(), "1");
        assert_eq!(ring.get_host("10").unwrap(), "1");
        assert_eq!(ring.get_host("15").unwrap(), "2");
        assert_eq!(ring.get_host("25").unwrap(), "1");
    }

    #[test]
    fn test_colliding_token_keeps_first_owner() {
        // "a" + "10" == "a1" + "0" and "a" + "11" == "a1" + "1".
        let ring = HashRing::new(RingConfig::default().with_replicas(12));
        ring.register_host("a").unwrap();
        ring.register_host("a1").unwrap();
        assert_eq!(ring.token_count(), 22);

        ring.unregister_host("a1").unwrap();
        assert_eq!(ring.token_count(), 12);
        assert!(ring.tokens().iter().all(|v| v.host == "a"));
        assert!(ring.state.read().shadowed.is_empty());
    }

    #[test]
    fn test_colliding_token_passes_to_waiting_host() {
        let ring = HashRing::new(RingConfig::default().with_replicas(12));
        ring.register_host("a").unwrap();
        ring.register_host("a1").unwrap();

        ring.unregister_host("a").unwrap();
        assert_eq!(ring.token_count(), 12);
        assert!(ring.tokens().iter().all(|v| v.host == "a1"));
        assert!(ring.state.read().shadowed.is_empty());

        ring.unregister_host("a1").unwrap();
        assert!(ring.is_empty());
    }

    #[test]
    fn test_capacious_walk_stops_after_one_lap() {
        let ring = ring_with(&["a", "b"]);
        // Per-host counters far above the aggregate: cap stays at
        // ceil((1 / 2) * 1.25) = 1 and no host has headroom.
        for host in ring.state.read().hosts.values() {
            host.add_load(100);
        }

        assert_eq!(ring.get_host_capacious("k"), Err(Error::CapacityExhausted));
        assert!(matches!(ring.reserve("k"), Err(Error::CapacityExhausted)));
        assert_eq!(ring.total_load(), 0);
        assert_eq!(ring.get_loads()["a"], 100);
    }

    #[test]
    fn test_capacious_skips_full_host() {
        let config = RingConfig::default().with_replicas(1);
        let ring = HashRing::with_partitioner(config, numeric);
        ring.register_host("1").unwrap();
        ring.register_host("2").unwrap();

        // Key 5 lands on host "1".
        ring.inc("1").unwrap();
        // total 1 -> cap ceil((2 / 2) * 1.25) = 2; "1" at load 1 still fits.
        assert_eq!(ring.get_host_capacious("5").unwrap(), "1");
        ring.inc("1").unwrap();
        // total 2 -> cap ceil((3 / 2) * 1.25) = 2; "1" at load 2 is full.
        assert_eq!(ring.get_host_capacious("5").unwrap(), "2");
        assert_eq!(ring.get_host("5").unwrap(), "1");
    }

    #[test]
    fn test_capacious_ignores_negative_host_load() {
        let ring = ring_with(&["a"]);
        ring.done("a");
        ring.done("a");
        assert_eq!(ring.get_loads()["a"], -2);
        assert_eq!(ring.get_host_capacious("k").unwrap(), "a");
    }

    #[test]
    fn test_reservation_released_on_drop() {
        let ring = ring_with(&["a", "b"]);
        {
            let r = ring.reserve("key").unwrap();
            assert_eq!(ring.get_loads()[r.host()], 1);
            assert_eq!(ring.total_load(), 1);
        }
        assert_eq!(ring.total_load(), 0);
    }

    #[test]
    fn test_reservation_not_resurrected_by_reregistration() {
        let ring = ring_with(&["a"]);
        let r = ring.reserve("key").unwrap();
        ring.unregister_host("a").unwrap();
        ring.register_host("a").unwrap();
        drop(r);
        assert_eq!(ring.get_loads()["a"], 0);
        assert_eq!(ring.total_load(), 0);
    }

    #[test]
    fn test_ownership_sums_to_one() {
        let ring = ring_with(&["a", "b", "c"]);
        let shares = ring.ownership();
        assert_eq!(shares.len(), 3);
        let sum: f64 = shares.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum = {sum}");
    }
}
