mod common;

use std::sync::{Arc, Mutex};

use common::{session, test_app};
use palier::app::session::SessionListener;
use palier::domain::session::Session;

fn recording_listener() -> (SessionListener, Arc<Mutex<Vec<Option<Session>>>>) {
    let seen: Arc<Mutex<Vec<Option<Session>>>> = Arc::new(Mutex::new(Vec::new()));
    let listener: SessionListener = Arc::new({
        let seen = seen.clone();
        move |current: Option<&Session>| {
            seen.lock().unwrap().push(current.cloned());
        }
    });
    (listener, seen)
}

#[tokio::test]
async fn starts_unauthenticated() {
    let (app, _backend) = test_app();
    assert_eq!(app.sessions.current(), None);
}

#[tokio::test]
async fn listener_registration_replays_current_state() {
    let (app, backend) = test_app();
    let resident = session("resident@example.com");
    backend.sign_in(resident.clone());

    let (listener, seen) = recording_listener();
    let _guard = app.sessions.on_change(listener);

    assert_eq!(seen.lock().unwrap().as_slice(), &[Some(resident)]);
}

#[tokio::test]
async fn sign_in_and_out_transitions_reach_listeners() {
    let (app, backend) = test_app();
    let (listener, seen) = recording_listener();
    let _guard = app.sessions.on_change(listener);

    let resident = session("resident@example.com");
    backend.sign_in(resident.clone());
    assert_eq!(app.sessions.current(), Some(resident.clone()));

    backend.sign_out();
    assert_eq!(app.sessions.current(), None);

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[None, Some(resident), None]
    );
}

#[tokio::test]
async fn dropping_the_guard_detaches_the_listener() {
    let (app, backend) = test_app();
    let (listener, seen) = recording_listener();
    let guard = app.sessions.on_change(listener);
    drop(guard);

    backend.sign_in(session("resident@example.com"));
    // Only the registration replay was delivered.
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn repeated_identical_auth_events_are_deduplicated() {
    let (app, backend) = test_app();
    let (listener, seen) = recording_listener();
    let _guard = app.sessions.on_change(listener);

    let resident = session("resident@example.com");
    backend.sign_in(resident.clone());
    backend.sign_in(resident.clone());

    assert_eq!(seen.lock().unwrap().as_slice(), &[None, Some(resident)]);
    assert!(app.sessions.current().is_some());
}
