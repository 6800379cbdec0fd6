//! Ring configuration.

use serde::{Deserialize, Serialize};

use crate::partitioner::{Blake3Partitioner, Partitioner, SipPartitioner, Xxh3Partitioner};

/// Virtual nodes per host when none is configured.
pub const DEFAULT_REPLICAS: usize = 10;

/// How far above the even-split average a host may run by default.
pub const DEFAULT_LOAD_BOUND_FACTOR: f64 = 0.25;

/// Hash function used to place keys and virtual nodes on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Xxh3,
    #[serde(alias = "sip")]
    SipHash,
    Blake3,
}

impl HashAlgorithm {
    pub fn partitioner(self) -> Box<dyn Partitioner> {
        match self {
            HashAlgorithm::Xxh3 => Box::new(Xxh3Partitioner),
            HashAlgorithm::SipHash => Box::new(SipPartitioner),
            HashAlgorithm::Blake3 => Box::new(Blake3Partitioner),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xxh3" => Ok(HashAlgorithm::Xxh3),
            "sip" | "siphash" => Ok(HashAlgorithm::SipHash),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

/// Tunables for a [`HashRing`](crate::ring::HashRing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual nodes per host.
    pub replicas: usize,
    /// Fraction above the average load a single host may carry before the
    /// bounded-load walk skips it.
    pub load_bound_factor: f64,
    /// Key and virtual-node hash function.
    pub hash: HashAlgorithm,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            load_bound_factor: DEFAULT_LOAD_BOUND_FACTOR,
            hash: HashAlgorithm::default(),
        }
    }
}

impl RingConfig {
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_load_bound_factor(mut self, factor: f64) -> Self {
        self.load_bound_factor = factor;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Replace out-of-range values with usable ones: zero replicas falls back
    /// to the default, a negative or non-finite factor becomes 0.
    pub fn normalized(mut self) -> Self {
        if self.replicas == 0 {
            self.replicas = DEFAULT_REPLICAS;
        }
        if !self.load_bound_factor.is_finite() || self.load_bound_factor < 0.0 {
            self.load_bound_factor = 0.0;
        }
        self
    }
}
