use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::status::ApprovalStatus;
use crate::infra::store::Document;

/// Tagged notification category with explicit per-variant detail fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum NotificationCategory {
    Vehicle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plate: Option<String>,
    },
    Visitor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visitor_name: Option<String>,
    },
    Complaint,
    Maintenance,
    Announcement,
    Billing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount_due: Option<String>,
    },
    ProfileEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub category: NotificationCategory,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: Option<ApprovalStatus>,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Wire shape of the document data, minus the id and creation timestamp the
/// store carries itself.
#[derive(Debug, Serialize, Deserialize)]
struct NotificationData {
    user_id: Uuid,
    #[serde(flatten)]
    category: NotificationCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<ApprovalStatus>,
    #[serde(default)]
    read: bool,
}

impl Notification {
    /// Validating ingestion boundary: backend documents are duck-typed and
    /// are never trusted implicitly.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let data: NotificationData = serde_json::from_value(doc.data.clone())
            .with_context(|| format!("malformed notification document {}", doc.id))?;
        Ok(Self {
            id: doc.id,
            user_id: data.user_id,
            category: data.category,
            subject: data.subject,
            message: data.message,
            status: data.status,
            read: data.read,
            created_at: doc.created_at,
        })
    }

    /// Document payload for the notification a resident submission raises,
    /// unread and pending back-office approval.
    pub fn submission_data(
        user_id: Uuid,
        category: NotificationCategory,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Value> {
        let data = NotificationData {
            user_id,
            category,
            subject: Some(subject.into()),
            message: Some(message.into()),
            status: Some(ApprovalStatus::Pending),
            read: false,
        };
        serde_json::to_value(data).context("failed to encode notification data")
    }
}

pub fn unread_count(items: &[Notification]) -> usize {
    items.iter().filter(|item| !item.read).count()
}
