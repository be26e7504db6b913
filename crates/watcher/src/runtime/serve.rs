//! Serve — drain the event queue to an output until the feed ends.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use crate::runtime::boot::Watcher;

/// Write every event as one JSON line to stdout until shutdown.
pub async fn serve(watcher: Watcher) -> Result<(), Box<dyn std::error::Error>> {
    serve_to(watcher, tokio::io::stdout()).await
}

/// Write every event as one JSON line to `out` until shutdown.
///
/// Once the token fires nothing more is written: events still buffered in
/// the queue are dropped, even when the output is stalled mid-write. A
/// failing output cancels the watcher.
pub async fn serve_to<W>(watcher: Watcher, mut out: W) -> Result<(), Box<dyn std::error::Error>>
where
    W: AsyncWrite + Unpin,
{
    let Watcher {
        queue,
        shutdown,
        supervisor,
        signals,
    } = watcher;

    info!("Watching docker events. Press Ctrl+C to stop");

    let mut events = queue.into_stream();
    let mut delivered: u64 = 0;
    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = events.next() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        let written = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            written = write_line(&mut out, &line) => written,
        };
        if let Err(e) = written {
            error!("Cannot write event output: {}", e);
            shutdown.cancel();
            break;
        }
        delivered += 1;
        debug!("Delivered event #{}: status={}", delivered, event.status);
    }
    drop(events);

    supervisor.await?;
    signals.abort();
    info!("Event feed closed after {} event(s)", delivered);
    Ok(())
}

async fn write_line<W>(out: &mut W, line: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line).await?;
    out.flush().await
}
