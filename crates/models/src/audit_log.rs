use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::Ref;

pub const LOG_TYPES: [&str; 2] = ["system", "alert"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSubject {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLog {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub user_id: Option<Ref<LogSubject>>,
    pub data: Option<serde_json::Value>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuditLog {
    /// Name of the affected user, if the entry targets one.
    pub fn subject(&self) -> Option<&str> {
        match self.user_id.as_ref()? {
            Ref::Populated(s) => Some(s.full_name.as_deref().unwrap_or("Associated User")),
            Ref::Id(_) => Some("Associated User"),
        }
    }

    /// Extra payload, only when it carries something.
    pub fn details(&self) -> Option<&serde_json::Value> {
        self.data.as_ref().filter(|d| match d {
            serde_json::Value::Object(m) => !m.is_empty(),
            serde_json::Value::Null => false,
            _ => true,
        })
    }
}
