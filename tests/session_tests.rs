mod common;

use std::sync::Arc;
use std::time::Duration;

use animeshelf::db::Store;
use animeshelf::services::{AuthBackend, AuthError, SeaOrmAuthBackend, SessionFile};
use animeshelf::session::SessionStore;
use common::{Harness, PASSWORD, fast_security};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_sign_in_and_out_notify_once() {
    let app = Harness::new().await;
    let user = app.sign_up("ana@example.com", "Ana").await;
    app.session.sign_out().await.unwrap();

    let mut sub = app.session.subscribe();
    let mut other = app.session.subscribe();
    assert_eq!(sub.current(), None);

    let signed_in = app
        .session
        .sign_in_with_password("ana@example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(signed_in.id, user.id);
    for s in [&mut sub, &mut other] {
        assert_eq!(timeout(WAIT, s.changed()).await.unwrap(), Some(Some(user.clone())));
        assert!(!s.has_changed());
    }

    app.session.sign_out().await.unwrap();
    for s in [&mut sub, &mut other] {
        assert_eq!(timeout(WAIT, s.changed()).await.unwrap(), Some(None));
        assert!(!s.has_changed());
    }

    // Nothing to clear, nothing to announce.
    app.session.sign_out().await.unwrap();
    assert!(!sub.has_changed());
    assert!(!other.has_changed());
}

#[tokio::test]
async fn test_wrong_password_leaves_state_alone() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    app.session.sign_out().await.unwrap();
    let sub = app.session.subscribe();

    let err = app
        .session
        .sign_in_with_password("ana@example.com", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials), "got {err:?}");
    assert!(app.session.current_user().is_none());
    assert!(!sub.has_changed());
}

#[tokio::test]
async fn test_backend_revocation_clears_session() {
    let app = Harness::new().await;
    let user = app.sign_up("ana@example.com", "Ana").await;
    let mut sub = app.session.subscribe();

    let removed = app.auth.revoke_user_sessions(&user.id).await.unwrap();
    assert_eq!(removed, 1);

    assert_eq!(timeout(WAIT, sub.changed()).await.unwrap(), Some(None));
    assert!(app.session.current_user().is_none());
}

#[tokio::test]
async fn test_token_refresh_replaces_session() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let before = app.session.current_session().unwrap();
    let mut sub = app.session.subscribe();

    let refreshed = app.auth.refresh_session(&before.refresh_token).await.unwrap();
    assert_ne!(refreshed.access_token, before.access_token);

    let user = timeout(WAIT, sub.changed()).await.unwrap();
    assert_eq!(user, Some(Some(before.user.clone())));
    assert_eq!(app.session.current_session(), Some(refreshed));

    let err = app.auth.refresh_session(&before.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(_)), "got {err:?}");
}

#[tokio::test]
async fn test_profile_update_reaches_subscribers() {
    let app = Harness::new().await;
    let user = app.sign_up("ana@example.com", "Ana").await;
    let mut sub = app.session.subscribe();

    app.auth
        .update_profile(&user.id, Some("Ana B."), Some("https://img.example/ana.png"))
        .await
        .unwrap();

    let updated = timeout(WAIT, sub.changed()).await.unwrap().flatten().unwrap();
    assert_eq!(updated.display_name.as_deref(), Some("Ana B."));
    assert_eq!(updated.avatar_url.as_deref(), Some("https://img.example/ana.png"));
    assert_eq!(app.session.current_user().unwrap().label(), "Ana B.");
}

#[tokio::test]
async fn test_events_for_other_users_are_ignored() {
    let ana = Harness::new().await;
    ana.sign_up("ana@example.com", "Ana").await;

    // Ben's client shares Ana's backend, so it sees her events too.
    let ben_session = Arc::new(SessionStore::manual(
        ana.auth.clone() as Arc<dyn AuthBackend>,
        None,
    ));
    let sub = ben_session.subscribe();

    let ana_id = ana.session.current_user().unwrap().id;
    ana.auth.revoke_user_sessions(&ana_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!sub.has_changed());
    assert!(ben_session.current_user().is_none());
}

#[tokio::test]
async fn test_dropped_subscription_unsubscribes() {
    let app = Harness::new().await;
    let baseline = app.session.subscriber_count();

    let first = app.session.subscribe();
    let second = app.session.subscribe();
    assert_eq!(app.session.subscriber_count(), baseline + 2);

    drop(first);
    assert_eq!(app.session.subscriber_count(), baseline + 1);
    drop(second);
    assert_eq!(app.session.subscriber_count(), baseline);
}

#[tokio::test]
async fn test_shutdown_stops_listening() {
    let app = Harness::new().await;
    let user = app.sign_up("ana@example.com", "Ana").await;

    app.session.shutdown();
    app.session.shutdown();

    app.auth.revoke_user_sessions(&user.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The listener is gone, so the revocation is not applied locally.
    assert_eq!(app.session.current_user(), Some(user));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let path = std::env::temp_dir().join(format!("animeshelf-{}.json", uuid::Uuid::new_v4()));
    let store = Store::in_memory().await.unwrap();

    let backend = |store: Store| -> Arc<dyn AuthBackend> {
        Arc::new(SeaOrmAuthBackend::new(
            store,
            fast_security(),
            SessionFile::new(path.clone()),
        ))
    };

    let first = SessionStore::start(backend(store.clone())).await.unwrap();
    first
        .sign_up("ana@example.com", PASSWORD, Some("Ana"))
        .await
        .unwrap();
    let user = first.current_user().unwrap();
    drop(first);

    let second = SessionStore::start(backend(store.clone())).await.unwrap();
    assert_eq!(second.current_user(), Some(user));

    second.sign_out().await.unwrap();
    drop(second);

    let third = SessionStore::start(backend(store)).await.unwrap();
    assert!(third.current_user().is_none());
    assert!(!path.exists());
}
