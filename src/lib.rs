pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

use std::sync::Arc;

use crate::app::notifications::NotificationFeed;
use crate::app::profile::ProfileService;
use crate::app::requests::RequestService;
use crate::app::session::SessionTracker;
use crate::app::vehicles::VehicleService;
use crate::app::visitors::VisitorService;
use crate::config::AppConfig;
use crate::infra::auth::IdentityProvider;
use crate::infra::storage::BlobStorage;
use crate::infra::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStorage>,
    pub config: AppConfig,
}

/// Every service, constructed once at process start and injected into
/// consumers. The process tracks a single resident session at a time; the
/// notification feed is always scoped to whoever that is.
pub struct App {
    pub state: AppState,
    pub sessions: SessionTracker,
    pub notifications: NotificationFeed,
    pub vehicles: VehicleService,
    pub visitors: VisitorService,
    pub requests: RequestService,
    pub profile: ProfileService,
}

impl App {
    pub fn new(state: AppState) -> Self {
        let sessions = SessionTracker::new(&state.auth);
        let notifications = NotificationFeed::new(
            state.store.clone(),
            state.config.notifications_collection.clone(),
            &sessions,
        );
        let vehicles = VehicleService::new(
            state.store.clone(),
            state.config.vehicles_collection.clone(),
            state.config.notifications_collection.clone(),
        );
        let visitors = VisitorService::new(
            state.store.clone(),
            state.config.visitors_collection.clone(),
            state.config.notifications_collection.clone(),
        );
        let requests = RequestService::new(
            state.store.clone(),
            state.config.requests_collection.clone(),
            state.config.notifications_collection.clone(),
        );
        let profile = ProfileService::new(
            state.store.clone(),
            state.blobs.clone(),
            state.config.residents_collection.clone(),
            state.config.notifications_collection.clone(),
            state.config.avatar_key_prefix.clone(),
            state.config.upload_max_bytes,
        );

        Self {
            state,
            sessions,
            notifications,
            vehicles,
            visitors,
            requests,
            profile,
        }
    }
}
