use serde::{Deserialize, Serialize};

use crate::ride::{Party, Ride};

/// Rider currently online, with last reported coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapRider {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MapRider {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Body of `GET /admin/map/live`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveMap {
    pub riders: Vec<MapRider>,
    pub active_rides: Vec<Ride>,
}

/// A point to draw on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    AvailableRider { id: String, name: String, lat: f64, lng: f64 },
    ActiveRide { id: String, lat: f64, lng: f64 },
}

impl LiveMap {
    /// Markers for riders and rides that carry coordinates; rides are placed
    /// at their rider's position.
    pub fn markers(&self) -> Vec<Marker> {
        let riders = self.riders.iter().filter_map(|r| {
            let (lat, lng) = r.position()?;
            Some(Marker::AvailableRider { id: r.id.clone(), name: r.full_name.clone(), lat, lng })
        });
        let rides = self.active_rides.iter().filter_map(|ride| {
            let (lat, lng) = ride.rider().and_then(Party::position)?;
            Some(Marker::ActiveRide { id: ride.id.clone(), lat, lng })
        });
        riders.chain(rides).collect()
    }
}
