use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::infra::lock;
use crate::infra::store::{
    sort_created_desc, Document, DocumentStore, OrderBy, Query, SnapshotHandler, StoreError,
};
use crate::infra::subscription::Subscription;

/// Live query ordered by creation time descending, with the degraded-index
/// fallback: when the backend rejects the ordered query for lack of a
/// composite index, the same filters are re-subscribed without the ordering
/// clause and every snapshot is sorted client-side, yielding exactly the
/// result the ordered query would have produced.
pub fn watch_created_desc(
    store: Arc<dyn DocumentStore>,
    query: Query,
    handler: SnapshotHandler,
) -> Subscription {
    let ordered = query.clone().order(OrderBy::created_desc());
    let unordered = Query {
        order_by: None,
        ..query
    };

    let slots = Arc::new(WatchSlots::default());
    let wrapped: SnapshotHandler = Arc::new({
        let store = store.clone();
        let slots = slots.clone();
        let handler = handler.clone();
        move |snapshot| match snapshot {
            Err(StoreError::MissingIndex { ref collection }) => {
                warn!(
                    collection = %collection,
                    "ordered query missing composite index, sorting client-side"
                );
                // The ordered listener is done; drop it so only the
                // fallback stays registered.
                slots.take_primary();
                let sorted: SnapshotHandler = Arc::new({
                    let handler = handler.clone();
                    move |snapshot| {
                        handler(snapshot.map(|mut docs| {
                            sort_created_desc(&mut docs);
                            docs
                        }))
                    }
                });
                let fallback = store.subscribe(unordered.clone(), sorted);
                slots.set_fallback(fallback);
            }
            other => handler(other),
        }
    });

    let primary = store.subscribe(ordered, wrapped);
    slots.set_primary(primary);

    Subscription::new(move || slots.release())
}

/// Maps a snapshot of duck-typed documents into domain values, skipping any
/// document that fails ingestion.
pub(crate) fn ingest_all<T>(
    docs: &[Document],
    kind: &'static str,
    ingest: impl Fn(&Document) -> anyhow::Result<T>,
) -> Vec<T> {
    let mut items = Vec::with_capacity(docs.len());
    for doc in docs {
        match ingest(doc) {
            Ok(item) => items.push(item),
            Err(err) => {
                warn!(document_id = %doc.id, error = ?err, "skipping malformed {} document", kind);
            }
        }
    }
    items
}

/// Holds the primary and fallback subscriptions behind one guard, so
/// cancelling the watch releases whichever listener is live even when the
/// fallback was installed from inside the primary's error callback.
#[derive(Default)]
struct WatchSlots {
    released: AtomicBool,
    primary: Mutex<Option<Subscription>>,
    fallback: Mutex<Option<Subscription>>,
}

impl WatchSlots {
    fn set_primary(&self, subscription: Subscription) {
        if self.released.load(Ordering::SeqCst) {
            return;
        }
        *lock(&self.primary) = Some(subscription);
    }

    fn take_primary(&self) {
        lock(&self.primary).take();
    }

    fn set_fallback(&self, subscription: Subscription) {
        if self.released.load(Ordering::SeqCst) {
            return;
        }
        *lock(&self.fallback) = Some(subscription);
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        lock(&self.primary).take();
        lock(&self.fallback).take();
    }
}
