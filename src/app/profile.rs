use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use serde_json::json;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::domain::notification::{Notification, NotificationCategory};
use crate::domain::profile::ResidentProfile;
use crate::domain::session::Session;
use crate::domain::validation::{validate_email, validate_phone, validate_required, ValidationError};
use crate::infra::storage::BlobStorage;
use crate::infra::store::{Document, DocumentStore, Query};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    residents_collection: String,
    notifications_collection: String,
    avatar_key_prefix: String,
    upload_max_bytes: i64,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStorage>,
        residents_collection: String,
        notifications_collection: String,
        avatar_key_prefix: String,
        upload_max_bytes: i64,
    ) -> Self {
        Self {
            store,
            blobs,
            residents_collection,
            notifications_collection,
            avatar_key_prefix,
            upload_max_bytes,
        }
    }

    pub async fn create(
        &self,
        session: &Session,
        full_name: &str,
        phone: &str,
        unit: &str,
    ) -> Result<ResidentProfile> {
        validate_required("full_name", full_name)?;
        validate_phone(phone)?;
        validate_required("unit", unit)?;
        validate_email(&session.email)?;

        let data = ResidentProfile::creation_data(
            session.user_id,
            full_name.trim(),
            session.email.clone(),
            phone.trim(),
            unit.trim(),
        )?;
        let doc = self.store.create(&self.residents_collection, data).await?;
        let profile = ResidentProfile::from_document(&doc)?;
        info!(user_id = %session.user_id, "resident profile created");
        Ok(profile)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<ResidentProfile>> {
        let doc = self.profile_doc(user_id).await?;
        doc.as_ref().map(ResidentProfile::from_document).transpose()
    }

    /// Updates contact details after local validation and raises a pending
    /// profile-edit notification for back-office review.
    pub async fn update_contact(
        &self,
        user_id: Uuid,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<ResidentProfile> {
        let mut patch = serde_json::Map::new();
        if let Some(phone) = phone {
            validate_phone(phone)?;
            patch.insert("phone".to_string(), json!(phone.trim()));
        }
        if let Some(email) = email {
            validate_email(email)?;
            patch.insert("email".to_string(), json!(email.trim()));
        }
        if patch.is_empty() {
            return Err(anyhow!("nothing to update"));
        }

        let doc = self
            .profile_doc(user_id)
            .await?
            .ok_or_else(|| anyhow!("no profile for user {}", user_id))?;
        self.store
            .update(&self.residents_collection, doc.id, json!(patch))
            .await?;

        let notification = Notification::submission_data(
            user_id,
            NotificationCategory::ProfileEdit,
            "Profile update submitted",
            "Your contact details are awaiting approval",
        )?;
        self.store
            .create(&self.notifications_collection, notification)
            .await?;

        let updated = self
            .profile_doc(user_id)
            .await?
            .ok_or_else(|| anyhow!("no profile for user {}", user_id))?;
        let profile = ResidentProfile::from_document(&updated)?;
        info!(user_id = %user_id, "resident profile updated");
        Ok(profile)
    }

    /// Stores the avatar bytes and writes the returned URL back onto the
    /// profile document. The size cap and content type are enforced before
    /// anything leaves the device.
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<Url> {
        if bytes.len() as i64 > self.upload_max_bytes {
            return Err(ValidationError {
                field: "avatar",
                reason: "exceeds the maximum upload size",
            }
            .into());
        }
        let ext = extension_from_content_type(content_type)?;

        let doc = self
            .profile_doc(user_id)
            .await?
            .ok_or_else(|| anyhow!("no profile for user {}", user_id))?;

        let key = format!("{}/{}/avatar.{}", self.avatar_key_prefix, user_id, ext);
        let url = self.blobs.put(&key, content_type, bytes).await?;
        self.store
            .update(
                &self.residents_collection,
                doc.id,
                json!({ "avatar_url": url.as_str() }),
            )
            .await?;

        info!(user_id = %user_id, key = %key, "avatar uploaded");
        Ok(url)
    }

    async fn profile_doc(&self, user_id: Uuid) -> Result<Option<Document>> {
        let query = Query::collection(self.residents_collection.clone())
            .filter("user_id", json!(user_id));
        let mut docs = self.store.fetch(query).await?;
        Ok(if docs.is_empty() {
            None
        } else {
            Some(docs.remove(0))
        })
    }
}

fn extension_from_content_type(content_type: &str) -> Result<&'static str> {
    match content_type {
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(anyhow!("unsupported content type")),
    }
}
