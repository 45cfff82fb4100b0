use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::app::watch::{ingest_all, watch_created_desc};
use crate::domain::notification::{Notification, NotificationCategory};
use crate::domain::validation::{validate_phone, validate_required};
use crate::domain::visitor::Visitor;
use crate::infra::store::{DocumentStore, Query, SnapshotHandler, StoreError};
use crate::infra::subscription::Subscription;

pub type VisitorObserver = Arc<dyn Fn(Result<Vec<Visitor>, StoreError>) + Send + Sync>;

#[derive(Clone)]
pub struct VisitorService {
    store: Arc<dyn DocumentStore>,
    visitors_collection: String,
    notifications_collection: String,
}

impl VisitorService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        visitors_collection: String,
        notifications_collection: String,
    ) -> Self {
        Self {
            store,
            visitors_collection,
            notifications_collection,
        }
    }

    pub async fn register(
        &self,
        user_id: Uuid,
        visitor_name: &str,
        phone: Option<&str>,
        expected_at: OffsetDateTime,
        purpose: Option<String>,
    ) -> Result<Visitor> {
        validate_required("visitor_name", visitor_name)?;
        if let Some(phone) = phone {
            validate_phone(phone)?;
        }
        let visitor_name = visitor_name.trim().to_string();

        let data = Visitor::registration_data(
            user_id,
            visitor_name.clone(),
            phone.map(|phone| phone.trim().to_string()),
            expected_at,
            purpose,
        )?;
        let doc = self.store.create(&self.visitors_collection, data).await?;
        let visitor = Visitor::from_document(&doc)?;

        let notification = Notification::submission_data(
            user_id,
            NotificationCategory::Visitor {
                visitor_name: Some(visitor_name.clone()),
            },
            "Visitor registration submitted",
            format!("Visit by {} is awaiting approval", visitor_name),
        )?;
        self.store
            .create(&self.notifications_collection, notification)
            .await?;

        info!(user_id = %user_id, visitor_id = %visitor.id, "visitor registration submitted");
        Ok(visitor)
    }

    /// Live list of the resident's visitor registrations, newest first,
    /// with the missing-index fallback applied.
    pub fn watch_for_user(&self, user_id: Uuid, observer: VisitorObserver) -> Subscription {
        let handler: SnapshotHandler = Arc::new(move |snapshot| {
            observer(snapshot.map(|docs| ingest_all(&docs, "visitor", Visitor::from_document)));
        });
        let query =
            Query::collection(self.visitors_collection.clone()).filter("user_id", json!(user_id));
        watch_created_desc(self.store.clone(), query, handler)
    }
}
