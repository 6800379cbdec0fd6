//! Subcommands.

use std::sync::Arc;

use anyhow::Context;
use backend::{BackendConfig, BackendServer};
use clap::Subcommand;
use corelib::{HashAlgorithm, HashRing};
use proxy::{HttpForwarder, ProxyServer, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::FileConfig;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the proxy and its control endpoint.
    Proxy {
        /// Address to listen on.
        #[arg(short, long)]
        listen: Option<String>,

        /// Virtual nodes per host.
        #[arg(short, long)]
        replicas: Option<usize>,

        /// Headroom above the average load, e.g. 0.25.
        #[arg(long)]
        load_factor: Option<f64>,

        /// Hash function placing keys and virtual nodes (xxh3, sip, blake3).
        #[arg(long)]
        hash: Option<HashAlgorithm>,

        /// Downstream request timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Run an example backend host.
    Backend {
        /// Address to listen on.
        #[arg(short, long)]
        listen: Option<String>,

        /// Name to register with the proxy.
        #[arg(short, long)]
        advertise: Option<String>,

        /// Proxy control endpoint.
        #[arg(short, long)]
        proxy: Option<String>,

        /// Cache time-to-live in seconds.
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

impl Command {
    /// Overlay flags given on the command line onto `file`.
    pub fn apply(&self, file: &mut FileConfig) {
        match self {
            Command::Proxy {
                listen,
                replicas,
                load_factor,
                hash,
                timeout_ms,
            } => {
                if let Some(listen) = listen {
                    file.proxy.listen = listen.clone();
                }
                if let Some(replicas) = replicas {
                    file.ring.replicas = *replicas;
                }
                if let Some(factor) = load_factor {
                    file.ring.load_bound_factor = *factor;
                }
                if let Some(hash) = hash {
                    file.ring.hash = *hash;
                }
                if let Some(ms) = timeout_ms {
                    file.proxy.timeout_ms = *ms;
                }
            }
            Command::Backend {
                listen,
                advertise,
                proxy,
                ttl_secs,
            } => {
                if let Some(listen) = listen {
                    file.backend.listen = listen.clone();
                }
                if advertise.is_some() {
                    file.backend.advertise = advertise.clone();
                }
                if let Some(proxy) = proxy {
                    file.backend.proxy = proxy.clone();
                }
                if let Some(ttl) = ttl_secs {
                    file.backend.ttl_secs = *ttl;
                }
            }
        }
    }

    pub async fn execute(self, file: FileConfig) -> anyhow::Result<()> {
        match self {
            Command::Proxy { .. } => run_proxy(file).await,
            Command::Backend { .. } => run_backend(file).await,
        }
    }
}

async fn run_proxy(file: FileConfig) -> anyhow::Result<()> {
    let ring = Arc::new(HashRing::new(file.ring));
    info!(
        replicas = ring.config().replicas,
        load_bound_factor = ring.config().load_bound_factor,
        hash = ring.partitioner_name(),
        "ring ready"
    );
    let router = Arc::new(Router::new(ring, HttpForwarder::new(file.proxy.timeout())));

    let listener = TcpListener::bind(&file.proxy.listen)
        .await
        .with_context(|| format!("failed to bind {}", file.proxy.listen))?;
    ProxyServer::new(router)
        .serve(listener, shutdown_signal())
        .await
        .context("proxy server failed")
}

async fn run_backend(file: FileConfig) -> anyhow::Result<()> {
    let config = BackendConfig {
        advertise: file.backend.advertise(),
        proxy: Some(file.backend.proxy.clone()),
        ttl: file.backend.ttl(),
    };
    let listener = TcpListener::bind(&file.backend.listen)
        .await
        .with_context(|| format!("failed to bind {}", file.backend.listen))?;
    BackendServer::new(config)
        .serve(listener, shutdown_signal())
        .await
        .context("backend server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until killed.
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
