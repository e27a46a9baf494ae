//! Adapts `watch` receivers into streams.

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

/// Stream over the values of a `watch` channel.
pub type WatchStream<T> = BoxStream<'static, T>;

/// Turns `rx` into a stream that yields the current value first, then every
/// later value the receiver observes.
///
/// A slow consumer only sees the latest value, never a backlog. The stream
/// ends once the sender is dropped.
pub fn watch_stream<T>(rx: watch::Receiver<T>) -> WatchStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first {
            rx.changed().await.ok()?;
        }
        let value = rx.borrow_and_update().clone();
        Some((value, (rx, false)))
    })
    .boxed()
}
