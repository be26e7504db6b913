//! Outbound queue — bounded, ordered hand-off of events to the consumer.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::docker::event::Event;

/// Events buffered before the publisher blocks.
pub const QUEUE_CAPACITY: usize = 100;

/// Create a connected publisher/queue pair.
pub fn event_queue() -> (EventPublisher, EventQueue) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (EventPublisher { tx: Some(tx) }, EventQueue { rx })
}

/// Producing half. Owned by the supervisor, which is the only writer and
/// the only one allowed to close it.
#[derive(Debug)]
pub struct EventPublisher {
    tx: Option<mpsc::Sender<Event>>,
}

impl EventPublisher {
    /// Publish one event, waiting for room when the queue is full.
    ///
    /// Gives the event back if the queue was closed or the consumer is gone.
    pub async fn publish(&self, event: Event) -> Result<(), Event> {
        match &self.tx {
            Some(tx) => tx.send(event).await.map_err(|e| e.0),
            None => Err(event),
        }
    }

    /// Close the queue. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        self.tx.take().is_some()
    }
}

/// Consuming half handed to the rest of the process.
///
/// `recv` yields `None` once the supervisor has shut down and every
/// buffered event has been taken.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::Receiver<Event>,
}

impl EventQueue {
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Adapt the queue into a `Stream` of events.
    pub fn into_stream(self) -> ReceiverStream<Event> {
        ReceiverStream::new(self.rx)
    }
}
