#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use palier::app::notifications::FeedObserver;
use palier::config::AppConfig;
use palier::domain::notification::Notification;
use palier::domain::session::Session;
use palier::infra::memory::MemoryBackend;
use palier::infra::store::StoreError;
use palier::{App, AppState};

/// App over a fresh in-memory backend with all composite indexes
/// provisioned, the way a deployed backend would be.
pub fn test_app() -> (App, MemoryBackend) {
    let (app, backend) = test_app_without_indexes();
    for collection in ["notifications", "vehicles", "visitors", "requests"] {
        backend.register_index(collection, &["user_id"], "created_at");
    }
    (app, backend)
}

/// App over a backend with no composite indexes, so every ordered per-user
/// query takes the degraded fallback path.
pub fn test_app_without_indexes() -> (App, MemoryBackend) {
    init_tracing();
    let backend = MemoryBackend::new();
    let state = AppState {
        auth: Arc::new(backend.clone()),
        store: Arc::new(backend.clone()),
        blobs: Arc::new(backend.clone()),
        config: AppConfig::from_env().expect("config"),
    };
    (App::new(state), backend)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn session(email: &str) -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: email.to_string(),
    }
}

/// Seeds a back-office announcement notification `age_minutes` in the past.
pub fn seed_notification(
    backend: &MemoryBackend,
    user_id: Uuid,
    read: bool,
    age_minutes: i64,
) -> Uuid {
    let created_at = OffsetDateTime::now_utc() - Duration::minutes(age_minutes);
    let doc = backend.seed(
        "notifications",
        json!({
            "user_id": user_id,
            "category": "announcement",
            "subject": "Community notice",
            "message": format!("notice from {} minutes ago", age_minutes),
            "read": read,
        }),
        created_at,
    );
    doc.id
}

/// Observer recording every `(list, unread)` delivery from the feed.
#[derive(Clone, Default)]
pub struct Recorder {
    deliveries: Arc<Mutex<Vec<(Vec<Notification>, usize)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer(&self) -> FeedObserver {
        let deliveries = self.deliveries.clone();
        Arc::new(move |items: &[Notification], unread: usize| {
            deliveries.lock().unwrap().push((items.to_vec(), unread));
        })
    }

    pub fn deliveries(&self) -> Vec<(Vec<Notification>, usize)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn last(&self) -> (Vec<Notification>, usize) {
        self.deliveries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no deliveries recorded")
    }

    pub fn len(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

/// Observer recording every delivery from a per-screen watch.
pub struct ResultRecorder<T> {
    results: Arc<Mutex<Vec<Result<Vec<T>, StoreError>>>>,
}

impl<T> Default for ResultRecorder<T> {
    fn default() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> ResultRecorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer(&self) -> Arc<dyn Fn(Result<Vec<T>, StoreError>) + Send + Sync> {
        let results = self.results.clone();
        Arc::new(move |result| {
            results.lock().unwrap().push(result);
        })
    }

    pub fn last(&self) -> Result<Vec<T>, StoreError> {
        self.results
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no deliveries recorded")
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}
