use models::Identity;

/// Keys of the persisted session, one value each.
pub const KEY_ACCESS_TOKEN: &str = "token";
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
pub const KEY_USER: &str = "user";
pub const SESSION_KEYS: [&str; 3] = [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER];

/// An authenticated session. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    /// Stored for completeness; no rotation happens client-side.
    pub refresh_token: Option<String>,
    pub user: Identity,
    /// `exp` claim of the access token, unix seconds.
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// `restore()` has not run yet; protected views must not render.
    #[default]
    Unresolved,
    Anonymous,
    Authenticated(Session),
}

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    Logout,
    Expired,
    Corrupt,
    Unauthorized,
}

impl std::fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TeardownReason::Logout => "logout",
            TeardownReason::Expired => "expired",
            TeardownReason::Corrupt => "corrupt",
            TeardownReason::Unauthorized => "unauthorized",
        };
        f.write_str(s)
    }
}

/// What observers see. `Anonymous { after: Some(_) }` is the signal to send
/// the user back to the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unresolved,
    Anonymous { after: Option<TeardownReason> },
    Authenticated,
}

impl SessionStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionStatus::Unresolved)
    }

    pub fn redirect_to_login(&self) -> bool {
        matches!(self, SessionStatus::Anonymous { after: Some(_) })
    }
}
