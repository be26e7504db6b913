//! Client module — how connections to the daemon get opened.

pub mod dial;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod live;

pub use dial::{BoxedIo, DaemonIo, Dialer};
pub use error::FeedError;
pub use live::SocketDialer;
