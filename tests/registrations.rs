mod common;

use common::{session, test_app, test_app_without_indexes, ResultRecorder};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use palier::domain::notification::{Notification, NotificationCategory};
use palier::domain::request::RequestKind;
use palier::domain::status::ApprovalStatus;
use palier::domain::vehicle::Vehicle;
use palier::domain::visitor::Visitor;
use palier::infra::memory::MemoryBackend;

fn seed_vehicle(backend: &MemoryBackend, user_id: Uuid, plate: &str, age_minutes: i64) {
    backend.seed(
        "vehicles",
        json!({
            "user_id": user_id,
            "plate": plate,
            "status": "pending",
        }),
        OffsetDateTime::now_utc() - Duration::minutes(age_minutes),
    );
}

#[tokio::test]
async fn vehicle_registration_rejects_a_bad_plate_before_any_backend_call() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");

    let result = app
        .vehicles
        .register(resident.user_id, "??!", None, None, None)
        .await;

    assert!(result.is_err());
    assert!(backend.documents("vehicles").is_empty());
    assert!(backend.documents("notifications").is_empty());
}

#[tokio::test]
async fn vehicle_registration_files_a_pending_document_and_notification() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");

    let vehicle = app
        .vehicles
        .register(
            resident.user_id,
            "ab-123x",
            Some("Toyota".to_string()),
            Some("Corolla".to_string()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(vehicle.plate, "AB-123X");
    assert_eq!(vehicle.status, ApprovalStatus::Pending);

    let notifications = backend.documents("notifications");
    assert_eq!(notifications.len(), 1);
    let notification = Notification::from_document(&notifications[0]).unwrap();
    assert_eq!(
        notification.category,
        NotificationCategory::Vehicle {
            plate: Some("AB-123X".to_string())
        }
    );
    assert_eq!(notification.status, Some(ApprovalStatus::Pending));
    assert!(!notification.read);
}

#[tokio::test]
async fn vehicle_watch_delivers_newest_first() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");
    seed_vehicle(&backend, resident.user_id, "OLD-1", 30);
    seed_vehicle(&backend, resident.user_id, "NEW-1", 5);
    seed_vehicle(&backend, resident.user_id, "MID-1", 15);

    let recorder: ResultRecorder<Vehicle> = ResultRecorder::new();
    let _watch = app
        .vehicles
        .watch_for_user(resident.user_id, recorder.observer());

    let vehicles = recorder.last().unwrap();
    let plates: Vec<&str> = vehicles.iter().map(|v| v.plate.as_str()).collect();
    assert_eq!(plates, ["NEW-1", "MID-1", "OLD-1"]);
}

#[tokio::test]
async fn vehicle_fallback_matches_the_ordered_query() {
    let (indexed_app, indexed_backend) = test_app();
    let (degraded_app, degraded_backend) = test_app_without_indexes();
    let resident = session("resident@example.com");

    for backend in [&indexed_backend, &degraded_backend] {
        seed_vehicle(backend, resident.user_id, "AAA-1", 45);
        seed_vehicle(backend, resident.user_id, "BBB-2", 10);
        seed_vehicle(backend, resident.user_id, "CCC-3", 25);
    }

    let ordered: ResultRecorder<Vehicle> = ResultRecorder::new();
    let _ordered_watch = indexed_app
        .vehicles
        .watch_for_user(resident.user_id, ordered.observer());

    let degraded: ResultRecorder<Vehicle> = ResultRecorder::new();
    let _degraded_watch = degraded_app
        .vehicles
        .watch_for_user(resident.user_id, degraded.observer());

    let ordered_plates: Vec<String> = ordered
        .last()
        .unwrap()
        .into_iter()
        .map(|v| v.plate)
        .collect();
    let degraded_plates: Vec<String> = degraded
        .last()
        .unwrap()
        .into_iter()
        .map(|v| v.plate)
        .collect();
    assert_eq!(ordered_plates, ["BBB-2", "CCC-3", "AAA-1"]);
    assert_eq!(degraded_plates, ordered_plates);
}

#[tokio::test]
async fn cancelling_a_watch_releases_the_listener() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");

    let recorder: ResultRecorder<Vehicle> = ResultRecorder::new();
    let watch = app
        .vehicles
        .watch_for_user(resident.user_id, recorder.observer());
    assert_eq!(backend.watcher_count(), 1);

    watch.cancel();
    assert_eq!(backend.watcher_count(), 0);

    let seen = recorder.len();
    seed_vehicle(&backend, resident.user_id, "XYZ-9", 1);
    assert_eq!(recorder.len(), seen);
}

#[tokio::test]
async fn visitor_registration_rejects_a_bad_phone() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");

    let result = app
        .visitors
        .register(
            resident.user_id,
            "Jane Doe",
            Some("not-a-phone"),
            OffsetDateTime::now_utc() + Duration::days(1),
            None,
        )
        .await;

    assert!(result.is_err());
    assert!(backend.documents("visitors").is_empty());
}

#[tokio::test]
async fn visitor_registration_files_a_pending_document_and_notification() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");
    let expected_at = OffsetDateTime::now_utc() + Duration::days(2);

    let visitor = app
        .visitors
        .register(
            resident.user_id,
            " Jane Doe ",
            Some("+33 6 12 34 56 78"),
            expected_at,
            Some("family visit".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(visitor.visitor_name, "Jane Doe");
    assert_eq!(visitor.status, ApprovalStatus::Pending);
    assert_eq!(visitor.expected_at, expected_at);

    let notifications = backend.documents("notifications");
    assert_eq!(notifications.len(), 1);
    let notification = Notification::from_document(&notifications[0]).unwrap();
    assert_eq!(
        notification.category,
        NotificationCategory::Visitor {
            visitor_name: Some("Jane Doe".to_string())
        }
    );
}

#[tokio::test]
async fn visitor_fallback_delivers_newest_first() {
    let (app, backend) = test_app_without_indexes();
    let resident = session("resident@example.com");
    for (name, age) in [("First", 40_i64), ("Third", 5), ("Second", 20)] {
        backend.seed(
            "visitors",
            json!({
                "user_id": resident.user_id,
                "visitor_name": name,
                "expected_at": "2026-09-01T10:00:00Z",
                "status": "pending",
            }),
            OffsetDateTime::now_utc() - Duration::minutes(age),
        );
    }

    let recorder: ResultRecorder<Visitor> = ResultRecorder::new();
    let _watch = app
        .visitors
        .watch_for_user(resident.user_id, recorder.observer());

    let names: Vec<String> = recorder
        .last()
        .unwrap()
        .into_iter()
        .map(|v| v.visitor_name)
        .collect();
    assert_eq!(names, ["Third", "Second", "First"]);
}

#[tokio::test]
async fn service_request_submission_raises_the_matching_notification() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");

    let request = app
        .requests
        .submit(
            resident.user_id,
            RequestKind::Maintenance,
            "Leaking faucet",
            Some("Kitchen sink, drips constantly".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(request.kind, RequestKind::Maintenance);
    assert_eq!(request.status, ApprovalStatus::Pending);

    let notifications = backend.documents("notifications");
    assert_eq!(notifications.len(), 1);
    let notification = Notification::from_document(&notifications[0]).unwrap();
    assert_eq!(notification.category, NotificationCategory::Maintenance);
}

#[tokio::test]
async fn service_request_rejects_an_empty_subject() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");

    let result = app
        .requests
        .submit(resident.user_id, RequestKind::Complaint, "   ", None)
        .await;

    assert!(result.is_err());
    assert!(backend.documents("requests").is_empty());
}
