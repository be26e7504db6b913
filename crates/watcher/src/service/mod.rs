//! Service module — the feed supervisor and its outbound queue.

pub mod feed;
pub mod queue;

pub use feed::{Phase, Supervisor, BACKOFF};
pub use queue::{event_queue, EventPublisher, EventQueue, QUEUE_CAPACITY};
