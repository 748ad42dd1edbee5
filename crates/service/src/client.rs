//! Shared request layer.
//!
//! Attaches the bearer token, turns a 401 into a session teardown and maps
//! every other failure to [`AdminError::Remote`]. Nothing is retried here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use models::{CollectionPage, CollectionQuery, PaginationMeta};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::auth::SessionManager;
use crate::collection::Resource;
use crate::errors::AdminError;
use crate::observability::{REQUESTS_TOTAL, REQUEST_DURATION, REQUEST_FAILURES_TOTAL};
use crate::transport::{ApiRequest, ApiTransport};

pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    session: Arc<SessionManager>,
    /// Bumped on every mutation of the matching resource.
    epochs: [AtomicU64; Resource::ALL.len()],
}

impl ApiClient {
    pub fn new(transport: Arc<dyn ApiTransport>, session: Arc<SessionManager>) -> Self {
        Self { transport, session, epochs: Default::default() }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Send an authenticated request and return the decoded body.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<Value, AdminError> {
        let token = self.session.bearer().await?;
        REQUESTS_TOTAL.inc();
        let timer = REQUEST_DURATION.start_timer();
        let result = self.transport.send(request.with_bearer(token.as_str())).await;
        timer.observe_duration();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                REQUEST_FAILURES_TOTAL.inc();
                warn!(error = %e, "request failed");
                return Err(AdminError::Remote(e.to_string()));
            }
        };
        if response.is_unauthorized() {
            REQUEST_FAILURES_TOTAL.inc();
            let torn_down = self.session.invalidate_token(&token).await;
            debug!(torn_down, "bearer rejected");
            return Err(AdminError::AuthorizationExpired);
        }
        if !response.is_success() {
            REQUEST_FAILURES_TOTAL.inc();
            let message = response.error_message();
            warn!(status = response.status, %message, "request rejected");
            return Err(AdminError::Remote(message));
        }
        Ok(response.body)
    }

    /// GET `path` and decode the field `key` of the response (or the whole
    /// body when the field is absent).
    pub async fn get_field<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<T, AdminError> {
        let body = self.send(ApiRequest::get(path)).await?;
        decode_field(body, key)
    }

    #[instrument(skip(self), fields(resource = resource.plural()))]
    pub async fn fetch_page<R: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &CollectionQuery,
    ) -> Result<CollectionPage<R>, AdminError> {
        let request = ApiRequest::get(resource.path()).with_query(query.to_params());
        let body = self.send(request).await?;
        parse_page(body, resource.plural(), query)
    }

    /// Mark everything fetched so far for `resource` as stale.
    pub fn invalidate(&self, resource: Resource) {
        self.epochs[resource.index()].fetch_add(1, Ordering::SeqCst);
    }

    pub fn epoch(&self, resource: Resource) -> u64 {
        self.epochs[resource.index()].load(Ordering::SeqCst)
    }
}

/// `body[key]` if present and non-null, otherwise the body itself.
pub(crate) fn decode_field<T: DeserializeOwned>(body: Value, key: &str) -> Result<T, AdminError> {
    let value = match body {
        Value::Object(mut map) if map.get(key).is_some_and(|v| !v.is_null()) => map.remove(key).unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| AdminError::Remote(format!("malformed {key}: {e}")))
}

/// `{ <plural>: [...], pagination: {page, pages} }`; missing rows read as an
/// empty page, missing pagination as a single page.
fn parse_page<R: DeserializeOwned>(
    body: Value,
    key: &str,
    query: &CollectionQuery,
) -> Result<CollectionPage<R>, AdminError> {
    let Value::Object(mut map) = body else {
        return Err(AdminError::Remote(format!("malformed {key} page: expected an object")));
    };
    let rows: Vec<R> = match map.remove(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => serde_json::from_value(v).map_err(|e| AdminError::Remote(format!("malformed {key}: {e}")))?,
    };
    let meta = match map.remove("pagination") {
        None | Some(Value::Null) => PaginationMeta { page: query.page(), pages: 1 },
        Some(v) => serde_json::from_value(v)
            .map_err(|e| AdminError::Remote(format!("malformed pagination: {e}")))?,
    };
    Ok(CollectionPage::new(rows, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{KEY_ACCESS_TOKEN, KEY_USER};
    use crate::auth::repository::mock::MemorySessionRepository;
    use crate::auth::token::tests::token_expiring_at;
    use crate::auth::{SessionStatus, TeardownReason};
    use crate::transport::mock::MockTransport;
    use crate::transport::{ApiResponse, Method, TransportError};
    use models::user::AdminUser;
    use serde_json::json;

    async fn signed_in(transport: &Arc<MockTransport>) -> (ApiClient, Arc<MemorySessionRepository>, String) {
        let token = token_expiring_at(chrono::Utc::now().timestamp() + 3600);
        let user = json!({"_id": "a1", "email": "ada@imove.rw", "role": "admin"}).to_string();
        let repo = Arc::new(MemorySessionRepository::with_entries(&[
            (KEY_ACCESS_TOKEN, token.as_str()),
            (KEY_USER, user.as_str()),
        ]));
        let session = Arc::new(SessionManager::new(repo.clone(), transport.clone()));
        session.restore().await;
        (ApiClient::new(transport.clone(), session), repo, token)
    }

    #[tokio::test]
    async fn attaches_bearer_and_returns_body() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, "/admin/dashboard", Ok(ApiResponse::ok(json!({"stats": {}}))));
        let (client, _, token) = signed_in(&transport).await;

        let body = client.send(ApiRequest::get("/admin/dashboard")).await.unwrap();
        assert_eq!(body, json!({"stats": {}}));
        assert_eq!(transport.requests()[0].bearer.as_deref(), Some(token.as_str()));
    }

    #[tokio::test]
    async fn no_session_fails_locally() {
        let transport = Arc::new(MockTransport::new());
        let repo = Arc::new(MemorySessionRepository::default());
        let session = Arc::new(SessionManager::new(repo, transport.clone()));
        session.restore().await;
        let client = ApiClient::new(transport.clone(), session);

        let err = client.send(ApiRequest::get("/admin/users")).await.unwrap_err();
        assert_eq!(err, AdminError::NotAuthenticated);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn unauthorized_tears_the_session_down() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, "/admin/users", Ok(ApiResponse::new(401, json!({"message": "jwt expired"}))));
        let (client, repo, _) = signed_in(&transport).await;

        let err = client.send(ApiRequest::get("/admin/users")).await.unwrap_err();
        assert_eq!(err, AdminError::AuthorizationExpired);
        assert!(repo.is_empty());
        assert_eq!(
            client.session().status(),
            SessionStatus::Anonymous { after: Some(TeardownReason::Unauthorized) }
        );
        let again = client.send(ApiRequest::get("/admin/users")).await.unwrap_err();
        assert_eq!(again, AdminError::NotAuthenticated);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn other_failures_are_remote_and_keep_the_session() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, "/admin/rides", Ok(ApiResponse::new(500, json!({"message": "boom"}))));
        transport.on(Method::Get, "/admin/payments", Err(TransportError::Network("refused".into())));
        let (client, _, _) = signed_in(&transport).await;

        let err = client.send(ApiRequest::get("/admin/rides")).await.unwrap_err();
        assert_eq!(err, AdminError::Remote("boom (HTTP 500)".into()));
        let err = client.send(ApiRequest::get("/admin/payments")).await.unwrap_err();
        assert!(matches!(err, AdminError::Remote(_)));
        assert_eq!(client.session().status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn fetch_page_sends_query_and_parses_rows() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Method::Get,
            "/admin/users",
            Ok(ApiResponse::ok(json!({
                "users": [{"_id": "u1", "full_name": "Jo", "email": "jo@x.rw", "role": "rider"}],
                "pagination": {"page": 1, "pages": 3}
            }))),
        );
        let (client, _, _) = signed_in(&transport).await;
        let query = CollectionQuery::new().with_filter("role", "rider");

        let page: CollectionPage<AdminUser> = client.fetch_page(Resource::Users, &query).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            transport.requests()[0].query,
            vec![("page".to_string(), "1".to_string()), ("role".to_string(), "rider".to_string())]
        );
    }

    #[test]
    fn lenient_page_parsing() {
        let q = CollectionQuery::new().with_page(2);
        let page: CollectionPage<Value> = parse_page(json!({}), "logs", &q).unwrap();
        assert!(page.rows.is_empty());
        assert_eq!((page.current_page, page.total_pages), (2, 1));
        assert!(parse_page::<Value>(json!([1, 2]), "logs", &q).is_err());
    }

    #[test]
    fn field_or_whole_body() {
        let v: u32 = decode_field(json!({"n": 4}), "n").unwrap();
        assert_eq!(v, 4);
        let v: Value = decode_field(json!({"other": 1}), "n").unwrap();
        assert_eq!(v, json!({"other": 1}));
    }

    #[test]
    fn epochs_are_per_resource() {
        let transport = Arc::new(MockTransport::new());
        let repo = Arc::new(MemorySessionRepository::default());
        let client = ApiClient::new(transport.clone(), Arc::new(SessionManager::new(repo, transport)));
        client.invalidate(Resource::Users);
        assert_eq!(client.epoch(Resource::Users), 1);
        assert_eq!(client.epoch(Resource::Rides), 0);
    }
}
