//! Live — implements `Dialer` over real unix sockets, tcp sockets and
//! inherited file descriptors.

use std::future::Future;
use std::pin::Pin;

use tokio::net::TcpStream;
use tracing::debug;

use crate::client::dial::{BoxedIo, Dialer};
use crate::client::error::FeedError;
use crate::docker::endpoint::{Endpoint, Transport};

/// Dials whatever transport the endpoint names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketDialer;

impl SocketDialer {
    pub fn new() -> Self {
        Self
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedIo, FeedError> {
        let dial_error = |source| FeedError::Dial {
            endpoint: endpoint.to_string(),
            source,
        };

        debug!("Dialing {}", endpoint);
        match endpoint.transport {
            Transport::Tcp => {
                let stream = TcpStream::connect(&endpoint.address).await.map_err(dial_error)?;
                stream.set_nodelay(true).map_err(dial_error)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Transport::Unix => {
                let stream = tokio::net::UnixStream::connect(&endpoint.address)
                    .await
                    .map_err(dial_error)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Transport::Fd => {
                let fd = parse_fd(&endpoint.address)?;
                let stream = adopt_fd(fd).map_err(dial_error)?;
                Ok(Box::new(stream))
            }
            #[cfg(not(unix))]
            Transport::Unix | Transport::Fd => Err(dial_error(std::io::Error::from(
                std::io::ErrorKind::Unsupported,
            ))),
        }
    }
}

impl Dialer for SocketDialer {
    fn dial<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> Pin<Box<dyn Future<Output = Result<BoxedIo, FeedError>> + Send + 'a>> {
        Box::pin(self.connect(endpoint))
    }
}

fn parse_fd(address: &str) -> Result<i32, FeedError> {
    match address.trim().parse::<i32>() {
        Ok(fd) if fd >= 0 => Ok(fd),
        _ => Err(FeedError::InvalidFd(address.to_string())),
    }
}

/// Wrap a duplicate of an inherited socket descriptor.
///
/// The inherited descriptor itself stays open, so every reconnect gets a
/// fresh handle and dropping a connection never closes the original.
#[cfg(unix)]
fn adopt_fd(fd: i32) -> std::io::Result<tokio::net::UnixStream> {
    use std::os::fd::{BorrowedFd, OwnedFd};
    use std::os::unix::fs::FileTypeExt;

    // SAFETY: an `fd://` endpoint names a descriptor inherited from the
    // parent process, which must stay open for the life of the process. It
    // is only borrowed for the dup(2) below and never closed here.
    let owned = unsafe { BorrowedFd::borrow_raw(fd) }.try_clone_to_owned()?;

    let file = std::fs::File::from(owned);
    if !file.metadata()?.file_type().is_socket() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("descriptor {fd} is not a socket"),
        ));
    }

    let stream = std::os::unix::net::UnixStream::from(OwnedFd::from(file));
    stream.set_nonblocking(true)?;
    tokio::net::UnixStream::from_std(stream)
}
