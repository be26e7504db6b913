//! Error — everything that can end a single connection attempt.

use hyper::StatusCode;
use thiserror::Error;

use crate::docker::endpoint::EndpointError;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("cannot connect to {endpoint}: {source}")]
    Dial {
        endpoint: String,
        source: std::io::Error,
    },
    #[error("not an inherited file descriptor: {0:?}")]
    InvalidFd(String),
    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("bad request for events: {0}")]
    Request(String),
    #[error("cannot reach events endpoint: {0}")]
    Send(#[source] hyper::Error),
    #[error("events endpoint answered {0}")]
    Status(StatusCode),
    #[error("stream read failed: {0}")]
    Body(#[source] hyper::Error),
    #[error("cannot decode json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("stream ended inside a json value ({0} bytes pending)")]
    Truncated(usize),
}

impl FeedError {
    /// Errors raised before the body starts streaming. These are the ones
    /// that earn a backoff before the next attempt.
    pub fn is_pre_stream(&self) -> bool {
        !matches!(
            self,
            FeedError::Body(_) | FeedError::Decode(_) | FeedError::Truncated(_)
        )
    }
}
