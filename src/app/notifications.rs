use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::session::{SessionListener, SessionTracker};
use crate::app::watch::{ingest_all, watch_created_desc};
use crate::domain::notification::{unread_count, Notification};
use crate::domain::session::Session;
use crate::infra::lock;
use crate::infra::store::{DocumentStore, Query, Snapshot, SnapshotHandler};
use crate::infra::subscription::Subscription;

pub type FeedObserver = Arc<dyn Fn(&[Notification], usize) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Shared fan-out cache over the signed-in resident's notifications.
///
/// One live backend subscription per process feeds every attached observer;
/// screens attach here instead of opening their own queries. The
/// subscription is scoped to the current session and torn down before a
/// different user's subscription is opened. Detaching the last observer
/// leaves the subscription up for the next one; only an identity change
/// tears it down.
pub struct NotificationFeed {
    shared: Arc<FeedShared>,
    _session_subscription: Subscription,
}

struct FeedShared {
    store: Arc<dyn DocumentStore>,
    collection: String,
    state: Mutex<FeedState>,
}

#[derive(Default)]
struct FeedState {
    user_id: Option<Uuid>,
    // Bumped on every resubscribe; snapshots from older epochs are stale
    // and must not leak into the new user's cache.
    epoch: u64,
    subscription: Option<Subscription>,
    notifications: Vec<Notification>,
    unread: usize,
    observers: Vec<(ObserverId, FeedObserver)>,
    next_observer_id: u64,
}

impl NotificationFeed {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: String,
        sessions: &SessionTracker,
    ) -> Self {
        let shared = Arc::new(FeedShared {
            store,
            collection,
            state: Mutex::new(FeedState::default()),
        });
        let listener: SessionListener = Arc::new({
            let shared = shared.clone();
            move |session: Option<&Session>| {
                resubscribe(&shared, session.map(|session| session.user_id));
            }
        });
        let session_subscription = sessions.on_change(listener);
        Self {
            shared,
            _session_subscription: session_subscription,
        }
    }

    /// Registers an observer and immediately replays the last known
    /// snapshot, so a late joiner is never left blank.
    pub fn attach(&self, observer: FeedObserver) -> ObserverId {
        let (id, notifications, unread) = {
            let mut state = lock(&self.shared.state);
            let id = ObserverId(state.next_observer_id);
            state.next_observer_id += 1;
            state.observers.push((id, observer.clone()));
            (id, state.notifications.clone(), state.unread)
        };
        observer(&notifications, unread);
        id
    }

    /// No-op when the observer was already detached.
    pub fn detach(&self, id: ObserverId) {
        lock(&self.shared.state)
            .observers
            .retain(|(observer_id, _)| *observer_id != id);
    }

    pub fn snapshot(&self) -> (Vec<Notification>, usize) {
        let state = lock(&self.shared.state);
        (state.notifications.clone(), state.unread)
    }

    pub fn unread(&self) -> usize {
        lock(&self.shared.state).unread
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<()> {
        self.shared
            .store
            .update(&self.shared.collection, id, json!({ "read": true }))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.shared.store.delete(&self.shared.collection, id).await?;
        Ok(())
    }

    /// Deletes every cached notification of the current user. Safe to call
    /// when the list is already empty.
    pub async fn delete_all(&self) -> Result<()> {
        let ids: Vec<Uuid> = {
            let state = lock(&self.shared.state);
            state.notifications.iter().map(|item| item.id).collect()
        };
        for id in ids {
            self.shared.store.delete(&self.shared.collection, id).await?;
        }
        Ok(())
    }
}

/// Invoked whenever the tracked identity changes. Tears the previous
/// subscription down before anything else, so at most one live subscription
/// exists at any time.
fn resubscribe(shared: &Arc<FeedShared>, user_id: Option<Uuid>) {
    let (epoch, observers) = {
        let mut state = lock(&shared.state);
        if state.user_id == user_id {
            return;
        }
        state.subscription = None;
        state.epoch += 1;
        state.user_id = user_id;
        state.notifications.clear();
        state.unread = 0;
        (state.epoch, observers_of(&state))
    };

    let Some(user_id) = user_id else {
        notify(&observers, &[], 0);
        return;
    };

    let handler: SnapshotHandler = Arc::new({
        let shared = shared.clone();
        move |snapshot| apply_snapshot(&shared, epoch, snapshot)
    });
    let query = Query::collection(shared.collection.clone()).filter("user_id", json!(user_id));
    let subscription = watch_created_desc(shared.store.clone(), query, handler);

    let mut state = lock(&shared.state);
    if state.epoch == epoch {
        state.subscription = Some(subscription);
    }
    // A stale epoch means the identity changed again while subscribing;
    // dropping the guard closes the superfluous subscription right here.
}

/// Recomputes the full cached list and unread count from a snapshot. O(n)
/// and deliberately not incremental; per-user notification volumes are
/// small.
fn apply_snapshot(shared: &Arc<FeedShared>, epoch: u64, snapshot: Snapshot) {
    let (observers, notifications, unread) = {
        let mut state = lock(&shared.state);
        if state.epoch != epoch {
            debug!("dropping snapshot from a torn-down subscription");
            return;
        }
        match snapshot {
            Ok(docs) => {
                // The watch helper delivers documents already ordered by
                // creation time descending.
                let items = ingest_all(&docs, "notification", Notification::from_document);
                state.unread = unread_count(&items);
                state.notifications = items;
            }
            Err(err) => {
                warn!(error = ?err, "notification query failed, clearing cache");
                state.notifications.clear();
                state.unread = 0;
            }
        }
        (
            observers_of(&state),
            state.notifications.clone(),
            state.unread,
        )
    };
    notify(&observers, &notifications, unread);
}

fn observers_of(state: &FeedState) -> Vec<FeedObserver> {
    state
        .observers
        .iter()
        .map(|(_, observer)| observer.clone())
        .collect()
}

/// Synchronous, in registration order.
fn notify(observers: &[FeedObserver], notifications: &[Notification], unread: usize) {
    for observer in observers {
        observer(notifications, unread);
    }
}
