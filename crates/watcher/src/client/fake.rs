//! Fake — scripted test double for dialing the daemon.
//!
//! [`FakeDaemon`] implements [`Dialer`] over in-memory duplex pipes. Each
//! dial consumes the next scripted [`Attempt`]; once the script runs out
//! every dial is refused, like a daemon that went away. The server half
//! speaks just enough HTTP/1.1 for the real client code to run unchanged.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::client::dial::{BoxedIo, Dialer};
use crate::client::error::FeedError;
use crate::docker::endpoint::Endpoint;

const PIPE_CAPACITY: usize = 64 * 1024;

/// What the fake daemon does with one connection attempt.
#[derive(Clone, Debug)]
pub enum Attempt {
    /// Fail the dial outright.
    Refuse,
    /// Answer `GET /events` with a non-success status.
    Status(u16),
    /// Answer 200 and stream `body`. With `hold_open` the response is never
    /// terminated, so the client blocks waiting for more.
    Stream { body: String, hold_open: bool },
}

impl Attempt {
    /// Stream the given JSON values, one per line, then end the response.
    pub fn events(lines: &[&str]) -> Self {
        Attempt::Stream {
            body: join_lines(lines),
            hold_open: false,
        }
    }

    /// Stream the given JSON values and keep the connection open.
    pub fn events_then_hang(lines: &[&str]) -> Self {
        Attempt::Stream {
            body: join_lines(lines),
            hold_open: true,
        }
    }
}

fn join_lines(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

#[derive(Default)]
struct Inner {
    script: VecDeque<Attempt>,
    dials: Vec<Instant>,
    requests: Vec<String>,
}

/// A scripted daemon for deterministic testing.
#[derive(Clone, Default)]
pub struct FakeDaemon {
    inner: Arc<Mutex<Inner>>,
    open: Arc<AtomicUsize>,
}

impl FakeDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: impl IntoIterator<Item = Attempt>) -> Self {
        let inner = Inner {
            script: script.into_iter().collect(),
            ..Inner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            open: Arc::default(),
        }
    }

    /// Times at which each dial happened, in order.
    pub async fn dials(&self) -> Vec<Instant> {
        self.inner.lock().await.dials.clone()
    }

    /// Request heads received so far.
    pub async fn requests(&self) -> Vec<String> {
        self.inner.lock().await.requests.clone()
    }

    /// Connections whose client side has not hung up yet.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedIo, FeedError> {
        let attempt = {
            let mut inner = self.inner.lock().await;
            inner.dials.push(Instant::now());
            inner.script.pop_front().unwrap_or(Attempt::Refuse)
        };

        if let Attempt::Refuse = attempt {
            return Err(FeedError::Dial {
                endpoint: endpoint.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }

        let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
        self.open.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(serve(
            server,
            attempt,
            Arc::clone(&self.inner),
            Arc::clone(&self.open),
        ));
        Ok(Box::new(client))
    }
}

impl Dialer for FakeDaemon {
    fn dial<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> Pin<Box<dyn Future<Output = Result<BoxedIo, FeedError>> + Send + 'a>> {
        Box::pin(self.connect(endpoint))
    }
}

async fn serve(
    mut pipe: DuplexStream,
    attempt: Attempt,
    inner: Arc<Mutex<Inner>>,
    open: Arc<AtomicUsize>,
) {
    if let Some(head) = read_head(&mut pipe).await {
        inner.lock().await.requests.push(head);
        let _ = respond(&mut pipe, attempt).await;
    }

    // Wait for the client to hang up.
    let mut sink = [0u8; 256];
    while matches!(pipe.read(&mut sink).await, Ok(n) if n > 0) {}
    open.fetch_sub(1, Ordering::SeqCst);
}

async fn read_head(pipe: &mut DuplexStream) -> Option<String> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match pipe.read(&mut byte).await {
            Ok(1) => head.push(byte[0]),
            _ => return None,
        }
    }
    String::from_utf8(head).ok()
}

async fn respond(pipe: &mut DuplexStream, attempt: Attempt) -> std::io::Result<()> {
    match attempt {
        Attempt::Refuse => Ok(()),
        Attempt::Status(code) => {
            let body = r#"{"message":"page not found"}"#;
            let response = format!(
                "HTTP/1.1 {code} Error\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            pipe.write_all(response.as_bytes()).await
        }
        Attempt::Stream { body, hold_open } => {
            pipe.write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await?;
            if !body.is_empty() {
                pipe.write_all(format!("{:x}\r\n{body}\r\n", body.len()).as_bytes())
                    .await?;
            }
            if !hold_open {
                pipe.write_all(b"0\r\n\r\n").await?;
            }
            pipe.flush().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::client::open_feed;
    use crate::docker::endpoint::resolve;

    #[tokio::test]
    async fn test_exhausted_script_refuses() {
        let fake = FakeDaemon::new();
        let endpoint = resolve("").unwrap();
        assert!(matches!(fake.dial(&endpoint).await, Err(FeedError::Dial { .. })));
        assert_eq!(fake.dials().await.len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_stream() {
        let fake = FakeDaemon::with_script([Attempt::events(&[
            r#"{"status":"create"}"#,
            r#"{"status":"start"}"#,
        ])]);
        let endpoint = resolve("").unwrap();

        let io = fake.dial(&endpoint).await.unwrap();
        let mut feed = open_feed(io, &endpoint).await.unwrap();
        assert_eq!(feed.next_event().await.unwrap().unwrap().status, "create");
        assert_eq!(feed.next_event().await.unwrap().unwrap().status, "start");
        assert!(feed.next_event().await.unwrap().is_none());

        let requests = fake.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /events "));
    }

    #[tokio::test]
    async fn test_scripted_status() {
        let fake = FakeDaemon::with_script([Attempt::Status(500)]);
        let endpoint = resolve("").unwrap();

        let io = fake.dial(&endpoint).await.unwrap();
        assert!(matches!(open_feed(io, &endpoint).await, Err(FeedError::Status(_))));
    }

    #[tokio::test]
    async fn test_dropping_feed_closes_connection() {
        let fake = FakeDaemon::with_script([Attempt::events_then_hang(&[r#"{"status":"start"}"#])]);
        let endpoint = resolve("").unwrap();

        let io = fake.dial(&endpoint).await.unwrap();
        let mut feed = open_feed(io, &endpoint).await.unwrap();
        assert_eq!(feed.next_event().await.unwrap().unwrap().status, "start");
        assert_eq!(fake.open_connections(), 1);

        drop(feed);
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while fake.open_connections() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("connection should close once the feed is dropped");
    }
}
