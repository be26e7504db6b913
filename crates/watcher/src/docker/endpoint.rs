//! Endpoint — resolves a `DOCKER_HOST`-style descriptor into a transport target.
//!
//! Pure string handling: nothing here touches the network or the filesystem.
//! Whether a unix socket actually exists is only discovered at dial time.

use std::fmt;
use thiserror::Error;

/// Socket path used when the descriptor is empty or `unix://`.
pub const DEFAULT_UNIX_SOCKET: &str = "/var/run/docker.sock";

/// Host substituted when a tcp descriptor omits it (`tcp://:2375`).
pub const DEFAULT_TCP_HOST: &str = "127.0.0.1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Invalid endpoint format: {0}")]
    InvalidFormat(String),
    #[error("Invalid endpoint protocol: {0}")]
    InvalidProtocol(String),
}

impl EndpointError {
    /// The descriptor that failed to resolve.
    pub fn descriptor(&self) -> &str {
        match self {
            EndpointError::InvalidFormat(d) | EndpointError::InvalidProtocol(d) => d,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Unix,
    Tcp,
    /// A descriptor already open in this process (`fd://3`).
    Fd,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Unix => "unix",
            Transport::Tcp => "tcp",
            Transport::Fd => "fd",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved (transport, address) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub transport: Transport,
    pub address: String,
}

impl Endpoint {
    fn new(transport: Transport, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.transport, self.address)
    }
}

/// Resolve an endpoint descriptor.
///
/// | descriptor            | result                              |
/// |-----------------------|-------------------------------------|
/// | `""`, `unix://`       | `unix`, `/var/run/docker.sock`      |
/// | `unix://<path>`       | `unix`, `<path>`                    |
/// | `tcp://<host>:<port>` | `tcp`, `<host or 127.0.0.1>:<port>` |
/// | `fd://<rest>`         | `fd`, `<rest>` verbatim             |
/// | `<host>:<port>`       | as `tcp://<host>:<port>`            |
///
/// Any other scheme, a bare `tcp://`, a tcp target without a port, or a
/// port that is zero or not a number yields an [`EndpointError`].
pub fn resolve(descriptor: &str) -> Result<Endpoint, EndpointError> {
    let descriptor = descriptor.trim();
    let format_error = || EndpointError::InvalidFormat(descriptor.to_string());

    // Order matters: a bare "tcp://" must not reach the generic tcp branch.
    let (transport, addr) = if descriptor == "tcp://" {
        return Err(format_error());
    } else if let Some(path) = descriptor.strip_prefix("unix://") {
        let path = if path.is_empty() { DEFAULT_UNIX_SOCKET } else { path };
        (Transport::Unix, path)
    } else if let Some(rest) = descriptor.strip_prefix("tcp://") {
        (Transport::Tcp, rest)
    } else if let Some(rest) = descriptor.strip_prefix("fd://") {
        return Ok(Endpoint::new(Transport::Fd, rest));
    } else if descriptor.is_empty() {
        (Transport::Unix, DEFAULT_UNIX_SOCKET)
    } else if descriptor.contains("://") {
        return Err(EndpointError::InvalidProtocol(descriptor.to_string()));
    } else {
        (Transport::Tcp, descriptor)
    };

    if transport == Transport::Unix {
        return Ok(Endpoint::new(transport, addr));
    }

    let Some((host, port)) = addr.split_once(':') else {
        return Err(format_error());
    };
    if port.contains(':') {
        return Err(format_error());
    }

    let host = if host.is_empty() { DEFAULT_TCP_HOST } else { host };
    let port = match port.parse::<u16>() {
        Ok(p) if p != 0 => p,
        _ => return Err(format_error()),
    };

    Ok(Endpoint::new(transport, format!("{host}:{port}")))
}
