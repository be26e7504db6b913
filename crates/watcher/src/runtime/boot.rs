//! Boot — logging init, config load, signal watcher and supervisor startup.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::dial::Dialer;
use crate::client::live::SocketDialer;
use crate::conf::WatcherConfig;
use crate::runtime::stop::spawn_signal_watcher;
use crate::service::feed::Supervisor;
use crate::service::queue::EventQueue;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Everything a running watcher consists of.
pub struct Watcher {
    pub queue: EventQueue,
    pub shutdown: CancellationToken,
    pub supervisor: JoinHandle<()>,
    pub signals: JoinHandle<()>,
}

/// Load config and start the supervisor against the real daemon.
pub fn boot() -> Result<Watcher, Box<dyn std::error::Error>> {
    info!("Starting docker event watcher v{}", env!("CARGO_PKG_VERSION"));

    let config = WatcherConfig::load()?;
    Ok(start(config, Arc::new(SocketDialer::new())))
}

/// Spawn the signal watcher and the supervisor for `config`.
pub fn start(config: WatcherConfig, dialer: Arc<dyn Dialer>) -> Watcher {
    info!(
        "Docker endpoint: {}",
        if config.docker_host.is_empty() {
            "default socket"
        } else {
            config.docker_host.as_str()
        }
    );

    match config.validate() {
        Ok(endpoint) => info!("Resolved endpoint: {}", endpoint),
        Err(e) => warn!("{} - retrying every {:?} until it is fixed", e, crate::service::BACKOFF),
    }

    let shutdown = CancellationToken::new();
    let signals = spawn_signal_watcher(shutdown.clone());

    let (supervisor, queue) = Supervisor::new(config.docker_host, dialer, shutdown.clone());
    let supervisor = tokio::spawn(supervisor.run());

    Watcher {
        queue,
        shutdown,
        supervisor,
        signals,
    }
}
