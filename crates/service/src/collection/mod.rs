//! Paginated, filterable remote collections (users, rides, payments, logs).

mod view;

pub use view::{CollectionView, Resolution, ViewState};

/// Remote collections the console lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Rides,
    Payments,
    Logs,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Users, Resource::Rides, Resource::Payments, Resource::Logs];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Response key holding the rows, also the last path segment.
    pub fn plural(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Rides => "rides",
            Resource::Payments => "payments",
            Resource::Logs => "logs",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Resource::Users => "/admin/users",
            Resource::Rides => "/admin/rides",
            Resource::Payments => "/admin/payments",
            Resource::Logs => "/admin/logs",
        }
    }

    /// Filter names the server understands for this collection.
    pub fn filters(self) -> &'static [&'static str] {
        match self {
            Resource::Users => &["role"],
            Resource::Rides => &["status"],
            Resource::Payments => &["provider", "status"],
            Resource::Logs => &["type"],
        }
    }

    pub fn supports_search(self) -> bool {
        !matches!(self, Resource::Logs)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.plural())
    }
}
