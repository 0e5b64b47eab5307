//! Hosted backend against an in-process stand-in for GoTrue and PostgREST.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use url::Url;

use animeshelf::clients::SupabaseClient;
use animeshelf::domain::{CollectionId, MalId};
use animeshelf::models::{AnimeSnapshot, OAuthProvider, SignUpOutcome, Tracking};
use animeshelf::repository::{
    AuthorizationGuard, CollectionRepository, ListRepository, RepositoryError,
};
use animeshelf::services::{
    AuthBackend, AuthError, CollectionStore, EntryStore, SessionFile, SupabaseAuthBackend,
    SupabaseStore,
};
use animeshelf::session::SessionStore;

const ANON_KEY: &str = "anon-key";
const PASSWORD: &str = "secret-pass";
const ANA_ID: &str = "0b6f8c5e-1d2a-4c3b-9e8f-7a6b5c4d3e2f";
const STALE_ID: &str = "1c7a9d6f-2e3b-4d4c-8f9a-8b7c6d5e4f3a";
const COLLECTION_ID: &str = "5f0c3c1e-6a55-4bde-9d55-6a3a0c1b2d3e";

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn has_anon_key(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn gotrue_user(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "aud": "authenticated",
        "email": email,
        "user_metadata": { "full_name": "Ana Souza", "avatar_url": "https://img.example/ana.png" }
    })
}

fn tokens(access: &str, refresh: &str, expires_in: i64, user: Value) -> Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": expires_in,
        "refresh_token": refresh,
        "user": user
    })
}

async fn token(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if !has_anon_key(&headers) {
        return error(StatusCode::UNAUTHORIZED, json!({ "message": "No API key found in request" }));
    }

    match params.get("grant_type").map(String::as_str) {
        Some("password") => {
            if body["password"] != PASSWORD {
                return error(
                    StatusCode::BAD_REQUEST,
                    json!({ "code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials" }),
                );
            }
            let reply = match body["email"].as_str() {
                Some("ana@example.com") => tokens(
                    "access-ana",
                    "refresh-ana",
                    3600,
                    gotrue_user(ANA_ID, "ana@example.com"),
                ),
                Some("soon@example.com") => tokens(
                    "soon-1",
                    "refresh-soon",
                    61,
                    gotrue_user(ANA_ID, "soon@example.com"),
                ),
                _ => tokens(
                    "stale-token",
                    "refresh-stale",
                    3600,
                    gotrue_user(STALE_ID, "stale@example.com"),
                ),
            };
            Json(reply).into_response()
        }
        Some("refresh_token") => match body["refresh_token"].as_str() {
            Some("refresh-soon") => Json(tokens(
                "soon-2",
                "refresh-soon-2",
                3600,
                gotrue_user(ANA_ID, "soon@example.com"),
            ))
            .into_response(),
            _ => error(
                StatusCode::BAD_REQUEST,
                json!({ "code": 400, "error_code": "refresh_token_not_found", "msg": "Invalid Refresh Token: Refresh Token Not Found" }),
            ),
        },
        _ => error(StatusCode::BAD_REQUEST, json!({ "msg": "unsupported grant_type" })),
    }
}

async fn signup(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == "confirm@example.com" {
        return Json(gotrue_user(ANA_ID, email)).into_response();
    }
    Json(tokens("access-ana", "refresh-ana", 3600, gotrue_user(ANA_ID, email))).into_response()
}

async fn user(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some("access-ana" | "oauth-token") => Json(gotrue_user(ANA_ID, "ana@example.com")).into_response(),
        _ => error(StatusCode::UNAUTHORIZED, json!({ "msg": "invalid JWT" })),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn collections(headers: HeaderMap) -> Response {
    if !has_anon_key(&headers) {
        return error(StatusCode::UNAUTHORIZED, json!({ "message": "No API key found in request" }));
    }
    match bearer(&headers) {
        Some("access-ana") => Json(json!([{
            "id": COLLECTION_ID,
            "user_id": ANA_ID,
            "name": "Favourites",
            "description": null,
            "preview_images": ["https://img.example/1.jpg"],
            "animes_count": 3,
            "created_at": "2024-05-01T10:00:00+00:00"
        }]))
        .into_response(),
        _ => error(
            StatusCode::UNAUTHORIZED,
            json!({ "code": "PGRST301", "details": null, "hint": null, "message": "JWT expired" }),
        ),
    }
}

async fn insert_entry() -> Response {
    error(
        StatusCode::FORBIDDEN,
        json!({
            "code": "42501",
            "details": null,
            "hint": null,
            "message": "new row violates row-level security policy for table \"collection_animes\""
        }),
    )
}

async fn spawn_supabase() -> String {
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/collections", get(collections))
        .route("/rest/v1/collection_animes", post(insert_entry));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Hosted {
    session: Arc<SessionStore>,
    collections: CollectionRepository,
    lists: ListRepository,
}

async fn hosted() -> Hosted {
    let base = spawn_supabase().await;
    let client = SupabaseClient::new(&base, ANON_KEY, Duration::from_secs(2)).unwrap();

    let auth: Arc<dyn AuthBackend> = Arc::new(SupabaseAuthBackend::new(
        client.clone(),
        SessionFile::disabled(),
        Some("http://localhost:4321/callback".to_string()),
    ));
    let session = Arc::new(SessionStore::start(auth).await.unwrap());
    let tables = Arc::new(SupabaseStore::new(client));
    let guard = AuthorizationGuard::new(session.clone());

    Hosted {
        collections: CollectionRepository::new(guard.clone(), tables.clone() as Arc<dyn CollectionStore>),
        lists: ListRepository::new(guard, tables as Arc<dyn EntryStore>),
        session,
    }
}

#[tokio::test]
async fn test_password_sign_in_and_list() {
    let app = hosted().await;

    let user = app
        .session
        .sign_in_with_password("ana@example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.id.to_string(), ANA_ID);
    assert_eq!(user.display_name.as_deref(), Some("Ana Souza"));

    let listed = app.collections.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Favourites");
    assert_eq!(listed[0].description, "");
    assert_eq!(listed[0].animes_count, 3);
}

#[tokio::test]
async fn test_wrong_password() {
    let app = hosted().await;

    let err = app
        .session
        .sign_in_with_password("ana@example.com", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials), "got {err:?}");
    assert!(app.session.current_user().is_none());
}

#[tokio::test]
async fn test_rejected_token_is_not_authenticated() {
    let app = hosted().await;
    app.session
        .sign_in_with_password("stale@example.com", PASSWORD)
        .await
        .unwrap();

    assert_eq!(
        app.collections.list().await.unwrap_err(),
        RepositoryError::NotAuthenticated
    );
}

#[tokio::test]
async fn test_row_level_security_is_forbidden() {
    let app = hosted().await;
    app.session
        .sign_in_with_password("ana@example.com", PASSWORD)
        .await
        .unwrap();

    let anime = AnimeSnapshot {
        mal_id: MalId::new(1),
        title: "Cowboy Bebop".to_string(),
        url: String::new(),
        image_jpg: String::new(),
        image_webp: String::new(),
        anime_type: None,
        episodes: None,
        airing: false,
        synopsis: None,
        season: None,
        year: None,
        genres: vec![],
    };
    let err = app
        .lists
        .add(CollectionId::generate(), anime, Tracking::default())
        .await
        .unwrap_err();

    match err {
        RepositoryError::Forbidden(message) => assert!(message.contains("row-level security")),
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_up_outcomes() {
    let app = hosted().await;

    let outcome = app
        .session
        .sign_up("confirm@example.com", PASSWORD, Some("Ana"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(ref u) if u.email == "confirm@example.com"));
    assert!(app.session.current_user().is_none());

    let outcome = app
        .session
        .sign_up("ana@example.com", PASSWORD, Some("Ana"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
    assert!(app.session.current_user().is_some());
}

#[tokio::test]
async fn test_oauth_round_trip() {
    let app = hosted().await;

    let url = app.session.sign_in_with_oauth(OAuthProvider::Github).unwrap();
    assert!(url.path().ends_with("/auth/v1/authorize"));
    let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs.get("provider").map(String::as_str), Some("github"));
    assert_eq!(
        pairs.get("redirect_to").map(String::as_str),
        Some("http://localhost:4321/callback")
    );

    let denied =
        Url::parse("http://localhost:4321/callback#error=access_denied&error_description=User+cancelled")
            .unwrap();
    let err = app.session.complete_oauth(&denied).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "User cancelled"), "got {err:?}");

    let callback = Url::parse(
        "http://localhost:4321/callback#access_token=oauth-token&refresh_token=oauth-refresh&expires_in=3600&token_type=bearer",
    )
    .unwrap();
    let user = app.session.complete_oauth(&callback).await.unwrap();
    assert_eq!(user.id.to_string(), ANA_ID);
    assert_eq!(
        app.session.current_session().unwrap().access_token,
        "oauth-token"
    );
}

#[tokio::test]
async fn test_token_is_refreshed_before_expiry() {
    let app = hosted().await;
    let mut sub = app.session.subscribe();

    app.session
        .sign_in_with_password("soon@example.com", PASSWORD)
        .await
        .unwrap();
    sub.changed().await.unwrap();

    // One second outside the refresh margin.
    tokio::time::timeout(Duration::from_secs(5), sub.changed())
        .await
        .unwrap()
        .unwrap();
    let session = app.session.current_session().unwrap();
    assert_eq!(session.access_token, "soon-2");
    assert_eq!(session.refresh_token, "refresh-soon-2");
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let app = hosted().await;
    app.session
        .sign_in_with_password("ana@example.com", PASSWORD)
        .await
        .unwrap();
    let mut sub = app.session.subscribe();

    app.session.sign_out().await.unwrap();
    assert_eq!(sub.changed().await, Some(None));
    assert_eq!(
        app.collections.list().await.unwrap_err(),
        RepositoryError::NotAuthenticated
    );
}

async fn counted_logout(State(calls): State<Arc<AtomicUsize>>) -> StatusCode {
    calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn test_sign_out_revokes_remotely_when_file_cannot_be_removed() {
    let logouts = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(counted_logout))
        .with_state(logouts.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let path = std::env::temp_dir().join(format!("animeshelf-{}.json", uuid::Uuid::new_v4()));
    let client = SupabaseClient::new(&format!("http://{addr}"), ANON_KEY, Duration::from_secs(2)).unwrap();
    let auth = SupabaseAuthBackend::new(client, SessionFile::new(path.clone()), None);

    let session = auth
        .sign_in_with_password("ana@example.com", PASSWORD)
        .await
        .unwrap();
    assert!(path.is_file());

    // A directory in place of the session file makes removal fail.
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(auth.sign_out(&session).await.is_err());
    assert_eq!(logouts.load(Ordering::SeqCst), 1);

    std::fs::remove_dir(&path).unwrap();
}
