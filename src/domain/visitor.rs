use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::status::ApprovalStatus;
use crate::infra::store::Document;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visitor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub visitor_name: String,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub expected_at: OffsetDateTime,
    pub purpose: Option<String>,
    pub status: ApprovalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct VisitorData {
    user_id: Uuid,
    visitor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    expected_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(default)]
    status: ApprovalStatus,
}

impl Visitor {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let data: VisitorData = serde_json::from_value(doc.data.clone())
            .with_context(|| format!("malformed visitor document {}", doc.id))?;
        Ok(Self {
            id: doc.id,
            user_id: data.user_id,
            visitor_name: data.visitor_name,
            phone: data.phone,
            expected_at: data.expected_at,
            purpose: data.purpose,
            status: data.status,
            created_at: doc.created_at,
        })
    }

    pub fn registration_data(
        user_id: Uuid,
        visitor_name: impl Into<String>,
        phone: Option<String>,
        expected_at: OffsetDateTime,
        purpose: Option<String>,
    ) -> Result<Value> {
        let data = VisitorData {
            user_id,
            visitor_name: visitor_name.into(),
            phone,
            expected_at,
            purpose,
            status: ApprovalStatus::Pending,
        };
        serde_json::to_value(data).context("failed to encode visitor data")
    }
}
