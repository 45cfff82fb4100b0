use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::infra::store::Document;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub unit: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileData {
    user_id: Uuid,
    full_name: String,
    email: String,
    phone: String,
    unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
}

impl ResidentProfile {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let data: ProfileData = serde_json::from_value(doc.data.clone())
            .with_context(|| format!("malformed profile document {}", doc.id))?;
        Ok(Self {
            id: doc.id,
            user_id: data.user_id,
            full_name: data.full_name,
            email: data.email,
            phone: data.phone,
            unit: data.unit,
            avatar_url: data.avatar_url,
            created_at: doc.created_at,
        })
    }

    pub fn creation_data(
        user_id: Uuid,
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        unit: impl Into<String>,
    ) -> Result<Value> {
        let data = ProfileData {
            user_id,
            full_name: full_name.into(),
            email: email.into(),
            phone: phone.into(),
            unit: unit.into(),
            avatar_url: None,
        };
        serde_json::to_value(data).context("failed to encode profile data")
    }
}
