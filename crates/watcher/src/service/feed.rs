//! Feed supervisor — keeps the `/events` subscription alive.
//!
//! The supervisor is an explicit state machine:
//!
//! ```text
//!              ┌──────── resolve/dial/request failed ────────┐
//!              ▼                                             │
//!   ┌──────────────┐  10s   ┌────────────┐    subscribed   ┌─┴──────────┐
//!   │  BackingOff  │───────▶│ Connecting │────────────────▶│ Streaming  │
//!   └──────────────┘        └────────────┘◀────────────────└────────────┘
//!                                           EOF, empty status,
//!                                           decode/read error
//! ```
//!
//! Every state also races the shutdown token; once it fires the machine
//! moves to `Terminated`, closes the open connection and the queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::dial::Dialer;
use crate::client::error::FeedError;
use crate::docker::client::{open_feed, EventFeed};
use crate::docker::endpoint::resolve;
use crate::service::queue::{event_queue, EventPublisher, EventQueue};

/// Wait before retrying after a failed connection attempt.
pub const BACKOFF: Duration = Duration::from_secs(10);

/// Observable summary of the supervisor's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Streaming,
    BackingOff,
    Terminated,
}

enum State {
    Connecting,
    Streaming(EventFeed),
    BackingOff,
    Terminated,
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::Connecting => Phase::Connecting,
            State::Streaming(_) => Phase::Streaming,
            State::BackingOff => Phase::BackingOff,
            State::Terminated => Phase::Terminated,
        }
    }
}

/// Where a failed attempt goes next: failures before the body starts
/// streaming back off, failures mid-stream reconnect straight away.
pub fn retry_phase(err: &FeedError) -> Phase {
    if err.is_pre_stream() {
        Phase::BackingOff
    } else {
        Phase::Connecting
    }
}

pub struct Supervisor {
    descriptor: String,
    dialer: Arc<dyn Dialer>,
    publisher: EventPublisher,
    shutdown: CancellationToken,
    phase_tx: watch::Sender<Phase>,
    consecutive_failures: u32,
}

impl Supervisor {
    /// Build a supervisor for `descriptor` and the queue it will feed.
    ///
    /// Cancelling `shutdown` is the only way to stop it.
    pub fn new(
        descriptor: impl Into<String>,
        dialer: Arc<dyn Dialer>,
        shutdown: CancellationToken,
    ) -> (Self, EventQueue) {
        let (publisher, queue) = event_queue();
        let (phase_tx, _) = watch::channel(Phase::Connecting);
        let supervisor = Self {
            descriptor: descriptor.into(),
            dialer,
            publisher,
            shutdown,
            phase_tx,
            consecutive_failures: 0,
        };
        (supervisor, queue)
    }

    /// Subscribe to state changes.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    /// Run until the shutdown token fires. Closes the queue on the way out.
    pub async fn run(mut self) {
        info!("Starting docker event supervisor (endpoint: {:?})", self.descriptor);

        let mut state = State::Connecting;
        loop {
            self.phase_tx.send_replace(state.phase());
            state = match state {
                State::Connecting => self.connect().await,
                State::Streaming(feed) => self.stream(feed).await,
                State::BackingOff => self.back_off().await,
                State::Terminated => break,
            };
        }

        self.publisher.close();
        info!("Docker event supervisor stopped");
    }

    async fn connect(&mut self) -> State {
        let opened = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return State::Terminated,
            opened = self.open() => opened,
        };

        match opened {
            Ok(feed) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Reconnected to docker after {} failed attempt(s)",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                State::Streaming(feed)
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                error!("Cannot connect to docker ({:?}): {}", self.descriptor, e);
                if self.consecutive_failures >= 3 {
                    warn!(
                        "Docker daemon unreachable for {} consecutive attempts - check the endpoint and daemon health",
                        self.consecutive_failures
                    );
                }
                self.after_failure(&e)
            }
        }
    }

    async fn open(&self) -> Result<EventFeed, FeedError> {
        let endpoint = resolve(&self.descriptor)?;
        let io = self.dialer.dial(&endpoint).await?;
        open_feed(io, &endpoint).await
    }

    /// Decode and publish until the stream ends, then close the connection
    /// before the next state is entered.
    async fn stream(&mut self, mut feed: EventFeed) -> State {
        let next = self.pump(&mut feed).await;
        feed.close().await;

        match next {
            Some(state) => state,
            None => {
                warn!("Event consumer went away; idling until shutdown");
                self.shutdown.cancelled().await;
                State::Terminated
            }
        }
    }

    /// `None` when the consumer dropped the queue.
    async fn pump(&mut self, feed: &mut EventFeed) -> Option<State> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Some(State::Terminated),
                next = feed.next_event() => next,
            };

            let event = match next {
                Ok(Some(event)) if event.is_end_of_stream() => {
                    info!("Docker event connection closed");
                    return Some(State::Connecting);
                }
                Ok(Some(event)) => event,
                Ok(None) => {
                    info!("Docker event connection closed");
                    return Some(State::Connecting);
                }
                Err(e) => {
                    error!("Docker event stream failed: {}", e);
                    return Some(self.after_failure(&e));
                }
            };

            debug!("Publishing event: status={}", event.status);
            let published = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Some(State::Terminated),
                published = self.publisher.publish(event) => published,
            };

            if published.is_err() {
                return None;
            }
        }
    }

    async fn back_off(&mut self) -> State {
        debug!("Retrying docker connection in {:?}", BACKOFF);
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => State::Terminated,
            _ = tokio::time::sleep(BACKOFF) => State::Connecting,
        }
    }

    fn after_failure(&self, err: &FeedError) -> State {
        match retry_phase(err) {
            Phase::BackingOff => State::BackingOff,
            _ => State::Connecting,
        }
    }
}
