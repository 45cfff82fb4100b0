use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::app::watch::{ingest_all, watch_created_desc};
use crate::domain::notification::{Notification, NotificationCategory};
use crate::domain::request::{RequestKind, ServiceRequest};
use crate::domain::validation::validate_required;
use crate::infra::store::{DocumentStore, Query, SnapshotHandler, StoreError};
use crate::infra::subscription::Subscription;

pub type RequestObserver = Arc<dyn Fn(Result<Vec<ServiceRequest>, StoreError>) + Send + Sync>;

/// Complaint and maintenance submissions, same shape as the registration
/// flows: validated input, a pending document, and a notification.
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn DocumentStore>,
    requests_collection: String,
    notifications_collection: String,
}

impl RequestService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        requests_collection: String,
        notifications_collection: String,
    ) -> Self {
        Self {
            store,
            requests_collection,
            notifications_collection,
        }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        kind: RequestKind,
        subject: &str,
        details: Option<String>,
    ) -> Result<ServiceRequest> {
        validate_required("subject", subject)?;
        let subject = subject.trim().to_string();

        let data = ServiceRequest::submission_data(user_id, kind, subject.clone(), details)?;
        let doc = self.store.create(&self.requests_collection, data).await?;
        let request = ServiceRequest::from_document(&doc)?;

        let category = match kind {
            RequestKind::Complaint => NotificationCategory::Complaint,
            RequestKind::Maintenance => NotificationCategory::Maintenance,
        };
        let notification = Notification::submission_data(
            user_id,
            category,
            subject.clone(),
            "Your request was received and is awaiting review",
        )?;
        self.store
            .create(&self.notifications_collection, notification)
            .await?;

        info!(user_id = %user_id, request_id = %request.id, kind = ?kind, "service request submitted");
        Ok(request)
    }

    pub fn watch_for_user(&self, user_id: Uuid, observer: RequestObserver) -> Subscription {
        let handler: SnapshotHandler = Arc::new(move |snapshot| {
            observer(snapshot.map(|docs| ingest_all(&docs, "request", ServiceRequest::from_document)));
        });
        let query =
            Query::collection(self.requests_collection.clone()).filter("user_id", json!(user_id));
        watch_created_desc(self.store.clone(), query, handler)
    }
}
