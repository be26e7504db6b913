//! Model — WatcherConfig.

use serde::{Deserialize, Serialize};

use crate::docker::endpoint::{resolve, Endpoint, EndpointError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Endpoint descriptor, same grammar as `DOCKER_HOST`. Empty means the
    /// default unix socket.
    pub docker_host: String,
}

impl WatcherConfig {
    /// Check that the descriptor resolves. The supervisor keeps retrying a
    /// bad one anyway, so callers only use this to warn early.
    pub fn validate(&self) -> Result<Endpoint, EndpointError> {
        resolve(&self.docker_host)
    }
}
