use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::domain::session::Session;
use crate::infra::auth::{AuthHandler, IdentityProvider};
use crate::infra::lock;
use crate::infra::storage::BlobStorage;
use crate::infra::store::{
    sort_created_desc, Document, DocumentStore, Query, SnapshotHandler, StoreError,
};
use crate::infra::subscription::Subscription;

/// In-process backend for local development and the test suite.
///
/// Mimics the hosted service closely enough to exercise the client: live
/// queries receive a full snapshot on registration and after every mutation
/// of their collection, and a query combining filters with an ordering
/// clause is rejected with the missing-index error unless a matching
/// composite index was registered first.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<Uuid, Document>>,
    indexes: HashSet<String>,
    watchers: Vec<Watcher>,
    auth_handlers: Vec<(u64, AuthHandler)>,
    session: Option<Session>,
    blobs: HashMap<String, (String, Bytes)>,
    fail_next: Option<StoreError>,
    next_watcher_id: u64,
    next_auth_id: u64,
}

struct Watcher {
    id: u64,
    query: Query,
    handler: SnapshotHandler,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the composite index required by an ordered, filtered query
    /// on `collection`.
    pub fn register_index(&self, collection: &str, filter_fields: &[&str], order_field: &str) {
        let key = index_key(collection, filter_fields, order_field);
        lock(&self.inner).indexes.insert(key);
    }

    pub fn sign_in(&self, session: Session) {
        let handlers = {
            let mut inner = lock(&self.inner);
            inner.session = Some(session.clone());
            inner
                .auth_handlers
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect::<Vec<_>>()
        };
        for handler in handlers {
            handler(Some(session.clone()));
        }
    }

    pub fn sign_out(&self) {
        let handlers = {
            let mut inner = lock(&self.inner);
            inner.session = None;
            inner
                .auth_handlers
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect::<Vec<_>>()
        };
        for handler in handlers {
            handler(None);
        }
    }

    /// Inserts a document with an explicit creation timestamp, as the back
    /// office would, and notifies live watchers.
    pub fn seed(&self, collection: &str, data: Value, created_at: OffsetDateTime) -> Document {
        let document = Document {
            id: Uuid::new_v4(),
            data,
            created_at,
        };
        {
            let mut inner = lock(&self.inner);
            inner
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(document.id, document.clone());
        }
        self.notify_collection(collection);
        document
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        let inner = lock(&self.inner);
        inner
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Live query watcher count, for asserting subscription teardown.
    pub fn watcher_count(&self) -> usize {
        lock(&self.inner).watchers.len()
    }

    /// Makes the next mutation deliver `error` to every live watcher of the
    /// mutated collection instead of a snapshot, for exercising degraded
    /// paths.
    pub fn fail_next_snapshot(&self, error: StoreError) {
        lock(&self.inner).fail_next = Some(error);
    }

    pub fn blob(&self, key: &str) -> Option<Bytes> {
        lock(&self.inner)
            .blobs
            .get(key)
            .map(|(_, bytes)| bytes.clone())
    }

    fn notify_collection(&self, collection: &str) {
        let deliveries = {
            let mut inner = lock(&self.inner);
            let failure = inner.fail_next.take();
            inner
                .watchers
                .iter()
                .filter(|watcher| watcher.query.collection == collection)
                .map(|watcher| {
                    let snapshot = match &failure {
                        Some(err) => Err(err.clone()),
                        None => Ok(evaluate(&inner, &watcher.query)),
                    };
                    (watcher.handler.clone(), snapshot)
                })
                .collect::<Vec<_>>()
        };
        for (handler, snapshot) in deliveries {
            handler(snapshot);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    fn subscribe(&self, query: Query, handler: SnapshotHandler) -> Subscription {
        let (id, initial) = {
            let mut inner = lock(&self.inner);
            if let Err(err) = check_index(&inner, &query) {
                drop(inner);
                handler(Err(err));
                return Subscription::noop();
            }
            let id = inner.next_watcher_id;
            inner.next_watcher_id += 1;
            let initial = evaluate(&inner, &query);
            inner.watchers.push(Watcher {
                id,
                query,
                handler: handler.clone(),
            });
            (id, initial)
        };
        handler(Ok(initial));

        let inner = self.inner.clone();
        Subscription::new(move || {
            lock(&inner).watchers.retain(|watcher| watcher.id != id);
        })
    }

    async fn fetch(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        let inner = lock(&self.inner);
        check_index(&inner, &query)?;
        Ok(evaluate(&inner, &query))
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, StoreError> {
        if !data.is_object() {
            return Err(StoreError::InvalidPayload(
                "document data must be a JSON object".to_string(),
            ));
        }
        Ok(self.seed(collection, data, OffsetDateTime::now_utc()))
    }

    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<(), StoreError> {
        let fields = patch.as_object().ok_or_else(|| {
            StoreError::InvalidPayload("update patch must be a JSON object".to_string())
        })?;
        {
            let mut inner = lock(&self.inner);
            let document = inner
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(&id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id,
                })?;
            if let Some(data) = document.data.as_object_mut() {
                for (key, value) in fields {
                    data.insert(key.clone(), value.clone());
                }
            }
        }
        self.notify_collection(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let removed = {
            let mut inner = lock(&self.inner);
            inner
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(&id))
                .is_some()
        };
        if removed {
            self.notify_collection(collection);
        }
        Ok(())
    }
}

impl IdentityProvider for MemoryBackend {
    fn on_auth_state_change(&self, handler: AuthHandler) -> Subscription {
        let (id, current) = {
            let mut inner = lock(&self.inner);
            let id = inner.next_auth_id;
            inner.next_auth_id += 1;
            inner.auth_handlers.push((id, handler.clone()));
            (id, inner.session.clone())
        };
        handler(current);

        let inner = self.inner.clone();
        Subscription::new(move || {
            lock(&inner)
                .auth_handlers
                .retain(|(handler_id, _)| *handler_id != id);
        })
    }
}

#[async_trait]
impl BlobStorage for MemoryBackend {
    async fn put(&self, key: &str, content_type: &str, bytes: Bytes) -> Result<Url> {
        lock(&self.inner)
            .blobs
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Url::parse(&format!("memory://blobs/{}", key))
            .map_err(|err| anyhow!("invalid blob key {}: {}", key, err))
    }
}

fn index_key(collection: &str, filter_fields: &[&str], order_field: &str) -> String {
    let mut fields: Vec<&str> = filter_fields.to_vec();
    fields.sort_unstable();
    format!("{}:{}:{}", collection, fields.join("+"), order_field)
}

fn check_index(inner: &Inner, query: &Query) -> Result<(), StoreError> {
    let order_by = match &query.order_by {
        Some(order_by) if !query.filters.is_empty() => order_by,
        _ => return Ok(()),
    };
    let fields: Vec<&str> = query
        .filters
        .iter()
        .map(|filter| filter.field.as_str())
        .collect();
    let key = index_key(&query.collection, &fields, &order_by.field);
    if inner.indexes.contains(&key) {
        Ok(())
    } else {
        Err(StoreError::MissingIndex {
            collection: query.collection.clone(),
        })
    }
}

fn evaluate(inner: &Inner, query: &Query) -> Vec<Document> {
    let mut docs: Vec<Document> = inner
        .collections
        .get(&query.collection)
        .map(|docs| {
            docs.values()
                .filter(|doc| matches(doc, query))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if let Some(order_by) = &query.order_by {
        if order_by.field == "created_at" && order_by.descending {
            sort_created_desc(&mut docs);
        } else {
            docs.sort_by(|a, b| {
                let left = a.field(&order_by.field).map(Value::to_string);
                let right = b.field(&order_by.field).map(Value::to_string);
                let ordering = left.cmp(&right);
                if order_by.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
    }
    docs
}

fn matches(doc: &Document, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|filter| doc.field(&filter.field) == Some(&filter.value))
}
