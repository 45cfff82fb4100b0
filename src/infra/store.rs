use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::infra::subscription::Subscription;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("missing composite index for query on {collection}")]
    MissingIndex { collection: String },
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: Uuid },
    #[error("invalid document payload: {0}")]
    InvalidPayload(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// A duck-typed document as the backend stores it. Typed ingestion happens
/// in `domain`, never here.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
    pub created_at: OffsetDateTime,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn created_desc() -> Self {
        Self {
            field: "created_at".to_string(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value,
        });
        self
    }

    pub fn order(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }
}

pub type Snapshot = Result<Vec<Document>, StoreError>;
pub type SnapshotHandler = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// The document-store seam of the backend-as-a-service. Live queries hand
/// the full result set to the handler on every change; mutations are plain
/// async calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Registers a live query. The handler receives the current snapshot
    /// immediately, then again on every matching change, or a `StoreError`
    /// when the backend rejects the query.
    fn subscribe(&self, query: Query, handler: SnapshotHandler) -> Subscription;

    /// One-shot read of the same query shape.
    async fn fetch(&self, query: Query) -> Result<Vec<Document>, StoreError>;

    async fn create(&self, collection: &str, data: Value) -> Result<Document, StoreError>;

    /// Merges the given top-level fields into an existing document.
    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<(), StoreError>;

    /// Deleting an already-absent document succeeds.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError>;
}

/// Creation time descending, document id descending as tie-break. The same
/// ordering the backend applies server-side, so a client-side sort of an
/// unordered result is indistinguishable from the ordered query.
pub fn sort_created_desc(docs: &mut [Document]) {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
