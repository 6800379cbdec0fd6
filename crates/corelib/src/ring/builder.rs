//! Builder for pre-populated rings.

use crate::config::{HashAlgorithm, RingConfig};
use crate::error::Result;
use crate::partitioner::Partitioner;
use crate::ring::HashRing;

/// Builds a [`HashRing`] with an initial set of hosts.
///
/// ```rust
/// use corelib::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_replicas(8)
///     .add_host("a:80")
///     .add_host("b:80")
///     .build()
///     .unwrap();
/// assert_eq!(ring.token_count(), 16);
/// ```
#[derive(Default)]
pub struct RingBuilder {
    config: RingConfig,
    partitioner: Option<Box<dyn Partitioner>>,
    hosts: Vec<String>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.config.replicas = replicas;
        self
    }

    pub fn with_load_bound_factor(mut self, factor: f64) -> Self {
        self.config.load_bound_factor = factor;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.config.hash = hash;
        self
    }

    /// Use a custom hash function instead of `config.hash`.
    pub fn with_partitioner(mut self, partitioner: impl Partitioner) -> Self {
        self.partitioner = Some(Box::new(partitioner));
        self
    }

    pub fn add_host(mut self, name: impl Into<String>) -> Self {
        self.hosts.push(name.into());
        self
    }

    /// Fails with [`Error::HostAlreadyExists`](crate::Error::HostAlreadyExists)
    /// if the same host was added twice.
    pub fn build(self) -> Result<HashRing> {
        let ring = match self.partitioner {
            Some(p) => HashRing::from_boxed(self.config, p),
            None => HashRing::new(self.config),
        };
        for host in &self.hosts {
            ring.register_host(host)?;
        }
        Ok(ring)
    }
}
