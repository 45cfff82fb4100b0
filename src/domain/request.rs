use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::status::ApprovalStatus;
use crate::infra::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Complaint,
    Maintenance,
}

/// A complaint or maintenance request filed by the resident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: RequestKind,
    pub subject: String,
    pub details: Option<String>,
    pub status: ApprovalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct RequestData {
    user_id: Uuid,
    kind: RequestKind,
    subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(default)]
    status: ApprovalStatus,
}

impl ServiceRequest {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let data: RequestData = serde_json::from_value(doc.data.clone())
            .with_context(|| format!("malformed request document {}", doc.id))?;
        Ok(Self {
            id: doc.id,
            user_id: data.user_id,
            kind: data.kind,
            subject: data.subject,
            details: data.details,
            status: data.status,
            created_at: doc.created_at,
        })
    }

    pub fn submission_data(
        user_id: Uuid,
        kind: RequestKind,
        subject: impl Into<String>,
        details: Option<String>,
    ) -> Result<Value> {
        let data = RequestData {
            user_id,
            kind,
            subject: subject.into(),
            details,
            status: ApprovalStatus::Pending,
        };
        serde_json::to_value(data).context("failed to encode request data")
    }
}
