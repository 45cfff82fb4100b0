use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::app::watch::{ingest_all, watch_created_desc};
use crate::domain::notification::{Notification, NotificationCategory};
use crate::domain::validation::validate_plate;
use crate::domain::vehicle::Vehicle;
use crate::infra::store::{DocumentStore, Query, SnapshotHandler, StoreError};
use crate::infra::subscription::Subscription;

pub type VehicleObserver = Arc<dyn Fn(Result<Vec<Vehicle>, StoreError>) + Send + Sync>;

#[derive(Clone)]
pub struct VehicleService {
    store: Arc<dyn DocumentStore>,
    vehicles_collection: String,
    notifications_collection: String,
}

impl VehicleService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        vehicles_collection: String,
        notifications_collection: String,
    ) -> Self {
        Self {
            store,
            vehicles_collection,
            notifications_collection,
        }
    }

    /// Validates the plate locally, then files the registration with
    /// pending status and raises the matching notification.
    pub async fn register(
        &self,
        user_id: Uuid,
        plate: &str,
        make: Option<String>,
        model: Option<String>,
        color: Option<String>,
    ) -> Result<Vehicle> {
        validate_plate(plate)?;
        let plate = plate.trim().to_uppercase();

        let data = Vehicle::registration_data(user_id, plate.clone(), make, model, color)?;
        let doc = self.store.create(&self.vehicles_collection, data).await?;
        let vehicle = Vehicle::from_document(&doc)?;

        let notification = Notification::submission_data(
            user_id,
            NotificationCategory::Vehicle {
                plate: Some(plate.clone()),
            },
            "Vehicle registration submitted",
            format!("Registration for plate {} is awaiting approval", plate),
        )?;
        self.store
            .create(&self.notifications_collection, notification)
            .await?;

        info!(user_id = %user_id, vehicle_id = %vehicle.id, plate = %plate, "vehicle registration submitted");
        Ok(vehicle)
    }

    /// Live list of the resident's registrations, newest first, with the
    /// missing-index fallback applied.
    pub fn watch_for_user(&self, user_id: Uuid, observer: VehicleObserver) -> Subscription {
        let handler: SnapshotHandler = Arc::new(move |snapshot| {
            observer(snapshot.map(|docs| ingest_all(&docs, "vehicle", Vehicle::from_document)));
        });
        let query =
            Query::collection(self.vehicles_collection.clone()).filter("user_id", json!(user_id));
        watch_created_desc(self.store.clone(), query, handler)
    }
}
