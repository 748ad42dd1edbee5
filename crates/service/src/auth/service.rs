use std::sync::Arc;

use arc_swap::ArcSwap;
use models::{Credentials, Identity, LoginResponse};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::domain::{
    Session, SessionState, SessionStatus, TeardownReason, KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER,
    SESSION_KEYS,
};
use super::repository::SessionRepository;
use super::token::decode_expiry;
use crate::errors::AdminError;
use crate::observability::SESSION_TEARDOWNS_TOTAL;
use crate::transport::{ApiRequest, ApiTransport};

pub const LOGIN_PATH: &str = "/auth/login";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Owns the session: the only component that writes it.
///
/// State lives in an `ArcSwap` and is always replaced whole through
/// [`SessionManager::replace`], so readers never observe a half-updated
/// session. Status changes are broadcast on a `watch` channel.
pub struct SessionManager {
    repo: Arc<dyn SessionRepository>,
    transport: Arc<dyn ApiTransport>,
    state: ArcSwap<SessionState>,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn SessionRepository>, transport: Arc<dyn ApiTransport>) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Unresolved);
        Self { repo, transport, state: ArcSwap::from_pointee(SessionState::Unresolved), status_tx }
    }

    fn replace(&self, state: SessionState, status: SessionStatus) {
        self.state.store(Arc::new(state));
        self.status_tx.send_replace(status);
    }

    /// Rebuild the session from persisted storage. Never fails: any problem
    /// with the stored data ends in an anonymous state.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::repository::mock::MemorySessionRepository;
    /// use service::auth::SessionStatus;
    /// use service::transport::mock::MockTransport;
    /// use service::SessionManager;
    ///
    /// let transport = Arc::new(MockTransport::new());
    /// let sm = SessionManager::new(Arc::new(MemorySessionRepository::default()), transport.clone());
    /// let status = tokio_test::block_on(sm.restore());
    /// assert_eq!(status, SessionStatus::Anonymous { after: None });
    /// assert_eq!(transport.request_count(), 0);
    /// ```
    #[instrument(skip(self))]
    pub async fn restore(&self) -> SessionStatus {
        let token = match self.repo.get(KEY_ACCESS_TOKEN).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "session store unreadable, starting anonymous");
                None
            }
        };
        let Some(token) = token else {
            debug!("no persisted session");
            self.replace(SessionState::Anonymous, SessionStatus::Anonymous { after: None });
            return self.status();
        };

        match self.load_session(token).await {
            Ok(session) => {
                info!(user = %session.user.email, expires_at = session.expires_at, "session restored");
                self.replace(SessionState::Authenticated(session), SessionStatus::Authenticated);
            }
            Err(reason) => self.teardown(reason).await,
        }
        self.status()
    }

    async fn load_session(&self, access_token: String) -> Result<Session, TeardownReason> {
        let expires_at = decode_expiry(&access_token).map_err(|e| {
            debug!(error = %e, "persisted token unreadable");
            TeardownReason::Corrupt
        })?;
        if expires_at < now() {
            return Err(TeardownReason::Expired);
        }
        let user = self
            .repo
            .get(KEY_USER)
            .await
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<Identity>(&raw).ok())
            .ok_or(TeardownReason::Corrupt)?;
        let refresh_token = self.repo.get(KEY_REFRESH_TOKEN).await.ok().flatten().filter(|t| !t.is_empty());
        Ok(Session { access_token, refresh_token, user, expires_at })
    }

    /// Exchange credentials for a session. Nothing is persisted unless the
    /// response carries both an access token and a user.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials) -> Result<Identity, AdminError> {
        credentials.validate()?;
        let request = ApiRequest::post(
            LOGIN_PATH,
            json!({ "email": credentials.email, "password": credentials.password }),
        );
        let response = self.transport.send(request).await.map_err(|e| {
            debug!(error = %e, "login request failed");
            AdminError::Remote(e.to_string())
        })?;
        if !response.is_success() {
            debug!(status = response.status, "login rejected");
            return Err(AdminError::Authentication(response.error_message()));
        }

        let parsed: LoginResponse = serde_json::from_value(response.body).map_err(|e| {
            debug!(error = %e, "login response undecodable");
            AdminError::Authentication("invalid login response".into())
        })?;
        let tokens = parsed.tokens.unwrap_or_default();
        let (Some(access_token), Some(user)) = (tokens.access_token.filter(|t| !t.is_empty()), parsed.user)
        else {
            debug!("login response missing access token or user");
            return Err(AdminError::Authentication("invalid login response".into()));
        };
        let expires_at = decode_expiry(&access_token).map_err(|e| {
            debug!(error = %e, "issued token unreadable");
            AdminError::Authentication("invalid login response".into())
        })?;

        let user_json = serde_json::to_string(&user).map_err(|e| AdminError::Storage(e.to_string()))?;
        let refresh_token = tokens.refresh_token.filter(|t| !t.is_empty());
        self.repo
            .put_all(vec![
                (KEY_ACCESS_TOKEN.to_string(), access_token.clone()),
                (KEY_REFRESH_TOKEN.to_string(), refresh_token.clone().unwrap_or_default()),
                (KEY_USER.to_string(), user_json),
            ])
            .await?;

        info!(user = %user.email, role = %user.role, "signed in");
        let session = Session { access_token, refresh_token, user: user.clone(), expires_at };
        self.replace(SessionState::Authenticated(session), SessionStatus::Authenticated);
        Ok(user)
    }

    /// Clear the persisted session and go anonymous. Safe to call repeatedly;
    /// the state is anonymous afterwards even if clearing storage failed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AdminError> {
        let cleared = self.repo.remove_all(&SESSION_KEYS).await;
        if matches!(**self.state.load(), SessionState::Authenticated(_)) {
            SESSION_TEARDOWNS_TOTAL.inc();
        }
        self.replace(SessionState::Anonymous, SessionStatus::Anonymous { after: Some(TeardownReason::Logout) });
        info!("signed out");
        cleared.map_err(|e| {
            warn!(error = %e, "failed to clear persisted session");
            e
        })
    }

    /// Same effect as logout, for expiry and authorization failures.
    #[instrument(skip(self))]
    pub async fn teardown(&self, reason: TeardownReason) {
        if let Err(e) = self.repo.remove_all(&SESSION_KEYS).await {
            warn!(error = %e, "failed to clear persisted session");
        }
        SESSION_TEARDOWNS_TOTAL.inc();
        info!(%reason, "session torn down");
        self.replace(SessionState::Anonymous, SessionStatus::Anonymous { after: Some(reason) });
    }

    /// Tear down after a 401, but only if `token` is still the active one.
    /// Returns whether a teardown happened.
    pub async fn invalidate_token(&self, token: &str) -> bool {
        let current =
            matches!(&**self.state.load(), SessionState::Authenticated(s) if s.access_token == token);
        if current {
            self.teardown(TeardownReason::Unauthorized).await;
        }
        current
    }

    /// Access token for an outgoing request. An expired token tears the
    /// session down instead of being sent.
    pub async fn bearer(&self) -> Result<String, AdminError> {
        let state = self.state.load_full();
        match &*state {
            SessionState::Authenticated(session) if session.is_expired_at(now()) => {
                let current =
                    matches!(&**self.state.load(), SessionState::Authenticated(s) if s.access_token == session.access_token);
                if current {
                    self.teardown(TeardownReason::Expired).await;
                }
                Err(AdminError::AuthorizationExpired)
            }
            SessionState::Authenticated(session) => Ok(session.access_token.clone()),
            SessionState::Unresolved | SessionState::Anonymous => Err(AdminError::NotAuthenticated),
        }
    }

    /// Route guard: the identity if a usable session exists.
    pub async fn require_authenticated(&self) -> Result<Identity, AdminError> {
        self.bearer().await?;
        self.current_user().ok_or(AdminError::NotAuthenticated)
    }

    /// The signed-in identity, or `None` once the token has expired even if
    /// no request has noticed yet.
    pub fn current_user(&self) -> Option<Identity> {
        match &**self.state.load() {
            SessionState::Authenticated(session) if !session.is_expired_at(now()) => Some(session.user.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> Arc<SessionState> {
        let state = self.state.load_full();
        match &*state {
            SessionState::Authenticated(session) if session.is_expired_at(now()) => Arc::new(SessionState::Anonymous),
            _ => state,
        }
    }

    /// Current status. An expired session reads as anonymous before the
    /// teardown that `bearer()` performs has run.
    pub fn status(&self) -> SessionStatus {
        match &**self.state.load() {
            SessionState::Authenticated(session) if session.is_expired_at(now()) => {
                SessionStatus::Anonymous { after: Some(TeardownReason::Expired) }
            }
            _ => *self.status_tx.borrow(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }
}
