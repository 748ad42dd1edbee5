use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use configs::ApiConfig;
use jsonwebtoken::{encode, EncodingKey, Header};
use models::user::AdminUser;
use models::Credentials;
use serde_json::{json, Value};
use service::auth::repo::FileSessionRepository;
use service::auth::{SessionStatus, TeardownReason};
use service::collection::Resolution;
use service::transport::HttpTransport;
use service::{AdminError, AdminService, ApiClient, SessionManager};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Minimal stand-in for the admin API.
struct FakeApi {
    token: String,
    accepting: AtomicBool,
}

type Shared = Arc<FakeApi>;

fn authorized(api: &FakeApi, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", api.token);
    api.accepting.load(Ordering::SeqCst)
        && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
}

async fn login(State(api): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] != "S3curePass!" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "tokens": {"access_token": api.token, "refresh_token": "refresh-1"},
            "user": {"_id": "66aa01", "full_name": "Ada Admin", "email": body["email"], "role": "admin"}
        })),
    )
}

async fn list_users(
    State(api): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&api, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Not authorized"})));
    }
    let search = params.get("search").cloned().unwrap_or_default();
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let users: Vec<Value> = ["John Doe", "Johnny Rider", "Mary Jane"]
        .iter()
        .filter(|n| n.to_lowercase().contains(&search.to_lowercase()))
        .map(|n| json!({"_id": n.replace(' ', "-"), "full_name": n, "role": "passenger"}))
        .collect();
    (StatusCode::OK, Json(json!({"users": users, "pagination": {"page": page, "pages": 3}})))
}

async fn delete_user(State(api): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if !authorized(&api, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Not authorized"})));
    }
    (StatusCode::OK, Json(json!({"message": format!("deleted {id}")})))
}

fn token() -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        id: String,
        exp: i64,
    }
    let claims = Claims { id: "66aa01".into(), exp: chrono::Utc::now().timestamp() + 3600 };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-only")).expect("encode token")
}

struct TestApp {
    api: Shared,
    base_url: String,
    session_file: PathBuf,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let api = Arc::new(FakeApi { token: token(), accepting: AtomicBool::new(true) });
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:id", delete(delete_user))
        .with_state(api.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    let session_file = std::env::temp_dir().join(format!("imove_admin_{}/session.json", Uuid::new_v4()));
    Ok(TestApp { api, base_url: format!("http://{}/api", addr), session_file })
}

async fn connect(app: &TestApp) -> anyhow::Result<(Arc<SessionManager>, AdminService)> {
    let cfg = ApiConfig { base_url: app.base_url.clone(), ..ApiConfig::default() };
    let transport = Arc::new(HttpTransport::new(&cfg)?);
    let repo = Arc::new(FileSessionRepository::open(&app.session_file).await?);
    let session = Arc::new(SessionManager::new(repo, transport.clone()));
    session.restore().await;
    let admin = AdminService::new(Arc::new(ApiClient::new(transport, session.clone())));
    Ok((session, admin))
}

#[tokio::test]
async fn login_list_and_restore_after_restart() -> anyhow::Result<()> {
    let app = start_server().await?;
    let (session, admin) = connect(&app).await?;
    assert_eq!(session.status(), SessionStatus::Anonymous { after: None });

    let err = session.login(Credentials::new("ada@imove.rw", "wrong")).await.unwrap_err();
    assert_eq!(err, AdminError::Authentication("Invalid credentials (HTTP 401)".into()));

    let user = session.login(Credentials::new("ada@imove.rw", "S3curePass!")).await?;
    assert_eq!(user.full_name, "Ada Admin");

    let view = admin.users_view();
    view.set_search("john").await?;
    let Resolution::Fetched(page) = view.resolve().await? else {
        panic!("expected a fetched page");
    };
    let names: Vec<&str> = page.rows.iter().map(|u: &AdminUser| u.full_name.as_str()).collect();
    assert_eq!(names, vec!["John Doe", "Johnny Rider"]);
    assert_eq!(page.total_pages, 3);

    // a fresh process picks the session up from disk
    let (restored, _) = connect(&app).await?;
    assert_eq!(restored.status(), SessionStatus::Authenticated);
    assert_eq!(restored.current_user().map(|u| u.email), Some("ada@imove.rw".to_string()));

    let _ = tokio::fs::remove_file(&app.session_file).await;
    Ok(())
}

#[tokio::test]
async fn revoked_token_tears_down_and_clears_disk() -> anyhow::Result<()> {
    let app = start_server().await?;
    let (session, admin) = connect(&app).await?;
    session.login(Credentials::new("ada@imove.rw", "S3curePass!")).await?;
    admin.delete_user("John-Doe").await?;

    app.api.accepting.store(false, Ordering::SeqCst);
    let err = admin.delete_user("Mary-Jane").await.unwrap_err();
    assert_eq!(err, AdminError::AuthorizationExpired);
    assert_eq!(session.status(), SessionStatus::Anonymous { after: Some(TeardownReason::Unauthorized) });

    let (restored, admin) = connect(&app).await?;
    assert_eq!(restored.status(), SessionStatus::Anonymous { after: None });
    assert_eq!(admin.users_view().resolve().await.unwrap_err(), AdminError::NotAuthenticated);

    let _ = tokio::fs::remove_file(&app.session_file).await;
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_remote_failure() -> anyhow::Result<()> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let app = TestApp {
        api: Arc::new(FakeApi { token: token(), accepting: AtomicBool::new(true) }),
        base_url: format!("http://{}/api", addr),
        session_file: std::env::temp_dir().join(format!("imove_admin_{}.json", Uuid::new_v4())),
    };
    let (session, _) = connect(&app).await?;
    let err = session.login(Credentials::new("ada@imove.rw", "S3curePass!")).await.unwrap_err();
    assert!(matches!(err, AdminError::Remote(_)));
    assert_eq!(session.status(), SessionStatus::Anonymous { after: None });

    let _ = tokio::fs::remove_file(&app.session_file).await;
    Ok(())
}
