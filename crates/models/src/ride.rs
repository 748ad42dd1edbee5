use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::Ref;

pub const RIDE_STATUSES: [&str; 5] = ["pending", "accepted", "in_progress", "completed", "cancelled"];

/// Passenger or rider as populated on a ride.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Party {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ride {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub passenger_id: Option<Ref<Party>>,
    pub rider_id: Option<Ref<Party>>,
    pub status: String,
    pub estimated_fare: Option<f64>,
    pub pickup_address: Option<String>,
    pub dropoff_address: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Ride {
    pub fn passenger(&self) -> Option<&Party> {
        self.passenger_id.as_ref().and_then(Ref::populated)
    }

    pub fn rider(&self) -> Option<&Party> {
        self.rider_id.as_ref().and_then(Ref::populated)
    }

    /// `in_progress` -> `in progress`
    pub fn status_label(&self) -> String {
        self.status.replacen('_', " ", 1)
    }
}
