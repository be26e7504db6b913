//! Dial trait — abstract interface for opening a byte stream to the daemon.
//!
//! `live.rs` provides the real unix/tcp/fd implementation.
//! `fake.rs` provides a scripted test double.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::error::FeedError;
use crate::docker::endpoint::Endpoint;

/// Any duplex byte stream hyper can speak HTTP/1.1 over.
pub trait DaemonIo: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> DaemonIo for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

pub type BoxedIo = Box<dyn DaemonIo>;

/// Opens connections to a resolved endpoint.
///
/// Object-safe thanks to the `Pin<Box<…>>` return so the supervisor can
/// hold an `Arc<dyn Dialer>`.
pub trait Dialer: Send + Sync {
    fn dial<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> Pin<Box<dyn Future<Output = Result<BoxedIo, FeedError>> + Send + 'a>>;
}
