//! Reactive item queries.

use crate::{ItemQuery, ItemStore, StorageResult};
use futures::stream::{self, BoxStream, StreamExt};
use lockbox_types::ItemEncrypted;
use std::sync::Arc;
use tokio::sync::watch;

/// Stream of query results; a new element is produced whenever the result
/// set changes.
pub type ItemStream = BoxStream<'static, StorageResult<Vec<ItemEncrypted>>>;

struct ObserveState {
    store: Arc<dyn ItemStore>,
    query: ItemQuery,
    changes: watch::Receiver<u64>,
    last: Option<Vec<ItemEncrypted>>,
    started: bool,
}

/// Observes `query` on `store`.
///
/// The current result is delivered immediately, then again after every store
/// change that alters it. A failed query is delivered as an `Err` element and
/// observation continues. The stream keeps the store alive and never ends on
/// its own; drop it to stop observing.
pub fn observe_items(store: Arc<dyn ItemStore>, query: ItemQuery) -> ItemStream {
    let changes = store.subscribe_changes();
    let state = ObserveState {
        store,
        query,
        changes,
        last: None,
        started: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.started {
                state.changes.changed().await.ok()?;
            } else {
                state.changes.borrow_and_update();
                state.started = true;
            }

            match state.store.query_items(&state.query).await {
                Ok(items) if state.last.as_ref() == Some(&items) => continue,
                Ok(items) => {
                    state.last = Some(items.clone());
                    return Some((Ok(items), state));
                }
                Err(e) => {
                    state.last = None;
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}
