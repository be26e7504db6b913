//! Docker module — endpoint grammar, the event model, and the HTTP feed.

pub mod client;
pub mod endpoint;
pub mod event;
pub mod stream;

pub use endpoint::{resolve, Endpoint, EndpointError, Transport};
pub use event::Event;
