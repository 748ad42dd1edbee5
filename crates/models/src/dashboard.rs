use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStats {
    pub total_passengers: u64,
    pub total_riders: u64,
    pub active_riders: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideStats {
    pub today: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EarningStats {
    pub total: f64,
    pub admin_revenue: f64,
}

/// Aggregates returned by `GET /admin/dashboard` under `stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub users: UserStats,
    pub rides: RideStats,
    pub earnings: EarningStats,
}

impl DashboardStats {
    pub fn total_users(&self) -> u64 {
        self.users.total_passengers + self.users.total_riders
    }
}
