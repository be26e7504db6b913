// Domain-driven module structure for the Docker event watcher.

// Core infrastructure
pub mod client;
pub mod conf;
pub mod docker;

// Domain modules
pub mod runtime;
pub mod service;
