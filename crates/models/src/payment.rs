use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::Ref;

pub const PAYMENT_STATUSES: [&str; 3] = ["successful", "pending", "failed"];
pub const PAYMENT_PROVIDERS: [&str; 4] = ["mtn", "airtel", "stripe", "flutterwave"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub transaction_reference: Option<String>,
    pub ride_id: Option<Ref<RideSummary>>,
    pub provider: String,
    pub amount: Option<f64>,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn ride_id(&self) -> Option<&str> {
        match self.ride_id.as_ref()? {
            Ref::Populated(r) => Some(r.id.as_str()),
            Ref::Id(id) => Some(id.as_str()),
        }
    }
}
