//! Broadcast receiver to filtered event stream

use futures::stream::{self, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use vibe_core::{EventFilter, EventStream, MatchEvent};

/// Turn a broadcast receiver into a stream of the events `filter` accepts.
///
/// A lagging receiver skips what it missed and keeps going; the stream ends
/// when the sender side is dropped.
pub(crate) fn filtered(rx: broadcast::Receiver<MatchEvent>, filter: EventFilter) -> EventStream {
    stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) if filter.matches(&event) => return Some((event, rx)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, ?filter, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}
