//! Docker client — one HTTP/1.1 connection carrying the `/events` stream.
//!
//! The transport is whatever [`Dialer`](crate::client::dial::Dialer) hands
//! back; this module only speaks HTTP over it and feeds the body through
//! the [`EventDecoder`].

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1::SendRequest;
use hyper::header::{ACCEPT, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::dial::BoxedIo;
use crate::client::error::FeedError;
use crate::docker::endpoint::{Endpoint, Transport};
use crate::docker::event::Event;
use crate::docker::stream::EventDecoder;

/// Streaming events path on the engine API.
pub const EVENTS_PATH: &str = "/events";

/// An open HTTP connection. The socket lives inside the driver task, so
/// it is closed once that task has stopped.
struct Connection {
    sender: SendRequest<Empty<Bytes>>,
    driver: JoinHandle<()>,
}

impl Connection {
    /// Abort the driver and wait until it has dropped the socket.
    async fn close(mut self) {
        self.driver.abort();
        let _ = (&mut self.driver).await;
    }
}

// Fallback for paths that cannot await: the abort is only scheduled here.
impl Drop for Connection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// A live `/events` response: the connection plus its body.
pub struct EventFeed {
    body: Incoming,
    decoder: EventDecoder,
    connection: Connection,
}

/// Perform the handshake over `io` and issue `GET /events`.
///
/// A failure after the handshake closes the partially opened connection
/// before returning.
pub async fn open_feed(io: BoxedIo, endpoint: &Endpoint) -> Result<EventFeed, FeedError> {
    let (sender, conn) = hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(TokioIo::new(io))
        .await
        .map_err(FeedError::Handshake)?;

    let driver = tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("Daemon connection ended with error: {}", e);
        }
    });
    let mut connection = Connection { sender, driver };

    let request = Request::builder()
        .method(Method::GET)
        .uri(EVENTS_PATH)
        .header(HOST, host_header(endpoint))
        .header(ACCEPT, "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| FeedError::Request(e.to_string()))?;

    let response = match connection.sender.send_request(request).await {
        Ok(response) => response,
        Err(e) => {
            connection.close().await;
            return Err(FeedError::Send(e));
        }
    };

    let status = response.status();
    if !status.is_success() {
        connection.close().await;
        return Err(FeedError::Status(status));
    }
    debug!("Subscribed to {}{}", endpoint, EVENTS_PATH);

    Ok(EventFeed {
        body: response.into_body(),
        decoder: EventDecoder::new(),
        connection,
    })
}

fn host_header(endpoint: &Endpoint) -> &str {
    match endpoint.transport {
        Transport::Tcp => &endpoint.address,
        Transport::Unix | Transport::Fd => "localhost",
    }
}

impl EventFeed {
    /// Next event from the body, reading more frames as needed.
    ///
    /// `Ok(None)` is a clean end of body. Events with an empty status are
    /// returned as-is; deciding what they mean is the caller's job.
    pub async fn next_event(&mut self) -> Result<Option<Event>, FeedError> {
        loop {
            if let Some(event) = self.decoder.next_event()? {
                return Ok(Some(event));
            }

            match self.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        self.decoder.push(&data);
                    }
                }
                Some(Err(e)) => return Err(FeedError::Body(e)),
                None => {
                    return match self.decoder.finish() {
                        Ok(()) => Ok(None),
                        Err(pending) => Err(FeedError::Truncated(pending)),
                    };
                }
            }
        }
    }

    /// Close the connection; the socket is released when this returns.
    pub async fn close(self) {
        drop(self.body);
        self.connection.close().await;
    }
}
