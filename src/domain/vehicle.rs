use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::status::ApprovalStatus;
use crate::infra::store::Document;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub status: ApprovalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct VehicleData {
    user_id: Uuid,
    plate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default)]
    status: ApprovalStatus,
}

impl Vehicle {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let data: VehicleData = serde_json::from_value(doc.data.clone())
            .with_context(|| format!("malformed vehicle document {}", doc.id))?;
        Ok(Self {
            id: doc.id,
            user_id: data.user_id,
            plate: data.plate,
            make: data.make,
            model: data.model,
            color: data.color,
            status: data.status,
            created_at: doc.created_at,
        })
    }

    pub fn registration_data(
        user_id: Uuid,
        plate: impl Into<String>,
        make: Option<String>,
        model: Option<String>,
        color: Option<String>,
    ) -> Result<Value> {
        let data = VehicleData {
            user_id,
            plate: plate.into(),
            make,
            model,
            color,
            status: ApprovalStatus::Pending,
        };
        serde_json::to_value(data).context("failed to encode vehicle data")
    }
}
