use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const ROLES: [&str; 3] = ["passenger", "rider", "admin"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Suspension {
    pub is_suspended: bool,
    pub reason: Option<String>,
}

/// A managed account as listed by `GET /admin/users`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub approval_status: Option<String>,
    pub suspension: Option<Suspension>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AdminUser {
    pub fn is_suspended(&self) -> bool {
        self.suspension.as_ref().is_some_and(|s| s.is_suspended)
    }

    /// Approval only applies to riders.
    pub fn approval(&self) -> Option<&str> {
        if self.role == "rider" {
            Some(self.approval_status.as_deref().unwrap_or("pending"))
        } else {
            None
        }
    }
}

/// Body of `POST /admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: String,
}

impl Default for NewUser {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            password: String::new(),
            role: "passenger".to_string(),
        }
    }
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::required(name));
            }
        }
        if !self.email.contains('@') {
            return Err(ModelError::Validation("invalid email".into()));
        }
        validate_role(&self.role)
    }
}

pub fn validate_role(role: &str) -> Result<(), ModelError> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ModelError::Validation(format!("unknown role {role:?} (expected one of {})", ROLES.join(", "))))
    }
}

/// Moderation actions accepted by `PUT /admin/users/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Suspend,
    Unsuspend,
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatusUpdate {
    pub action: UserAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UserStatusUpdate {
    /// Suspensions and rejections must say why.
    pub fn validate(&self) -> Result<(), ModelError> {
        let needs_reason = matches!(self.action, UserAction::Suspend | UserAction::Reject);
        let has_reason = self.reason.as_deref().is_some_and(|r| !r.trim().is_empty());
        if needs_reason && !has_reason {
            return Err(ModelError::required("reason"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> NewUser {
        NewUser {
            full_name: "Jean Uwase".into(),
            email: "jean@example.rw".into(),
            phone: "+250788000000".into(),
            password: "secret".into(),
            ..NewUser::default()
        }
    }

    #[test]
    fn new_user_defaults_to_passenger() {
        assert_eq!(NewUser::default().role, "passenger");
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn new_user_missing_phone_is_rejected() {
        let u = NewUser { phone: "  ".into(), ..complete() };
        assert_eq!(u.validate(), Err(ModelError::required("phone")));
    }

    #[test]
    fn new_user_unknown_role_is_rejected() {
        let u = NewUser { role: "driver".into(), ..complete() };
        assert!(u.validate().is_err());
    }

    #[test]
    fn admin_user_parses_listing_row() {
        let u: AdminUser = serde_json::from_value(json!({
            "_id": "u1",
            "full_name": "Eric Rider",
            "email": "eric@example.rw",
            "role": "rider",
            "suspension": {"is_suspended": true},
            "createdAt": "2025-01-05T10:00:00.000Z"
        }))
        .unwrap();
        assert!(u.is_suspended());
        assert_eq!(u.approval(), Some("pending"));
        assert!(u.created_at.is_some());
    }

    #[test]
    fn suspend_requires_reason() {
        let upd = UserStatusUpdate { action: UserAction::Suspend, reason: None };
        assert!(upd.validate().is_err());
        let upd = UserStatusUpdate { action: UserAction::Unsuspend, reason: None };
        assert!(upd.validate().is_ok());
        assert_eq!(serde_json::to_value(&upd).unwrap(), json!({"action": "unsuspend"}));
    }
}
