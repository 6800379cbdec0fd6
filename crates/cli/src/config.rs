//! Command line and TOML configuration.
//!
//! Values resolve in order: command line flag, config file, built-in
//! default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use corelib::RingConfig;
use serde::Deserialize;

use crate::commands::Command;
use crate::telemetry;

#[derive(Debug, Parser)]
#[command(name = "bhash", version, about = "Bounded-load consistent hashing proxy")]
pub struct CliConfig {
    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        let mut file = FileConfig::load(self.config.as_deref())?;
        self.command.apply(&mut file);
        telemetry::init(&file.log.level);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        runtime.block_on(self.command.execute(file))
    }
}

/// Top-level file configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub ring: RingConfig,
    pub proxy: ProxySection,
    pub backend: BackendSection,
    pub log: LogSection,
}

/// `[proxy]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProxySection {
    pub listen: String,
    /// Per-request downstream timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:18888".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl ProxySection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[backend]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub listen: String,
    /// Name registered with the proxy. Derived from `listen` when unset.
    pub advertise: Option<String>,
    /// Proxy control endpoint.
    pub proxy: String,
    pub ttl_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            advertise: None,
            proxy: "http://localhost:18888".to_string(),
            ttl_secs: 10,
        }
    }
}

impl BackendSection {
    /// Registered name: `advertise` if set, else `listen` with an
    /// unspecified address replaced by `localhost`.
    pub fn advertise(&self) -> String {
        if let Some(advertise) = &self.advertise {
            return advertise.clone();
        }
        match self.listen.rsplit_once(':') {
            Some(("0.0.0.0" | "[::]" | "", port)) => format!("localhost:{port}"),
            _ => self.listen.clone(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Filter directive, e.g. `"info"` or `"proxy=debug"`.
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FileConfig {
    /// Read `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config {}", p.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("failed to parse config {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use corelib::HashAlgorithm;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.ring, RingConfig::default());
        assert_eq!(config.proxy.listen, "0.0.0.0:18888");
        assert_eq!(config.proxy.timeout(), Duration::from_secs(5));
        assert_eq!(config.backend.proxy, "http://localhost:18888");
        assert_eq!(config.backend.ttl(), Duration::from_secs(10));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file() {
        let config = FileConfig::from_toml(
            r#"
            [ring]
            replicas = 40
            hash = "blake3"

            [backend]
            listen = "127.0.0.1:9001"

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.ring.replicas, 40);
        assert_eq!(config.ring.hash, HashAlgorithm::Blake3);
        assert_eq!(config.ring.load_bound_factor, corelib::config::DEFAULT_LOAD_BOUND_FACTOR);
        assert_eq!(config.proxy.listen, "0.0.0.0:18888");
        assert_eq!(config.backend.advertise(), "127.0.0.1:9001");
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_rejects_unknown_hash() {
        assert!(FileConfig::from_toml("[ring]\nhash = \"md5\"\n").is_err());
    }

    #[test]
    fn test_advertise_derivation() {
        let mut backend = BackendSection::default();
        assert_eq!(backend.advertise(), "localhost:8080");
        backend.listen = "[::]:9000".to_string();
        assert_eq!(backend.advertise(), "localhost:9000");
        backend.advertise = Some("cache-1:9000".to_string());
        assert_eq!(backend.advertise(), "cache-1:9000");
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Some(Path::new("/nonexistent/bhash.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
