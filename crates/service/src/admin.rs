use std::sync::Arc;

use models::audit_log::AuditLog;
use models::dashboard::DashboardStats;
use models::live_map::LiveMap;
use models::payment::Payment;
use models::ride::Ride;
use models::settings::FareSettings;
use models::user::{AdminUser, NewUser, UserStatusUpdate};
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::{decode_field, ApiClient};
use crate::collection::{CollectionView, Resource};
use crate::errors::AdminError;
use crate::transport::ApiRequest;

pub const DASHBOARD_PATH: &str = "/admin/dashboard";
pub const SETTINGS_PATH: &str = "/admin/settings";
pub const LIVE_MAP_PATH: &str = "/admin/map/live";

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, AdminError> {
    serde_json::to_value(value).map_err(|e| AdminError::Validation(e.to_string()))
}

fn user_path(id: &str) -> Result<String, AdminError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AdminError::Validation("user id is required".into()));
    }
    Ok(format!("{}/{id}", Resource::Users.path()))
}

/// Admin operations over the shared request layer.
#[derive(Clone)]
pub struct AdminService {
    client: Arc<ApiClient>,
}

impl AdminService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, AdminError> {
        self.client.get_field(DASHBOARD_PATH, "stats").await
    }

    pub async fn settings(&self) -> Result<FareSettings, AdminError> {
        self.client.get_field(SETTINGS_PATH, "settings").await
    }

    /// Validate then replace the fare settings. Returns what the server
    /// stored, or the submitted values if it does not echo them.
    #[instrument(skip(self, settings))]
    pub async fn update_settings(&self, settings: FareSettings) -> Result<FareSettings, AdminError> {
        settings.validate()?;
        let body = self.client.send(ApiRequest::put(SETTINGS_PATH, to_body(&settings)?)).await?;
        info!(currency = %settings.currency, "fare settings updated");
        match body.get("settings") {
            Some(v) if !v.is_null() => decode_field(body, "settings"),
            _ => Ok(settings),
        }
    }

    #[instrument(skip(self, user), fields(email = %user.email, role = %user.role))]
    pub async fn create_user(&self, user: NewUser) -> Result<AdminUser, AdminError> {
        user.validate()?;
        let body = self.client.send(ApiRequest::post(Resource::Users.path(), to_body(&user)?)).await?;
        self.client.invalidate(Resource::Users);
        info!("user created");
        match body.get("user") {
            Some(v) if !v.is_null() => decode_field(body, "user"),
            _ => Ok(AdminUser {
                full_name: user.full_name,
                email: user.email,
                phone: user.phone,
                role: user.role,
                ..AdminUser::default()
            }),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<(), AdminError> {
        let path = user_path(id)?;
        self.client.send(ApiRequest::delete(path)).await?;
        self.client.invalidate(Resource::Users);
        info!("user deleted");
        Ok(())
    }

    pub async fn user_details(&self, id: &str) -> Result<AdminUser, AdminError> {
        let path = user_path(id)?;
        self.client.get_field(&path, "user").await
    }

    /// Suspend, unsuspend, approve or reject an account.
    #[instrument(skip(self, update), fields(action = ?update.action))]
    pub async fn update_user_status(&self, id: &str, update: UserStatusUpdate) -> Result<(), AdminError> {
        let path = user_path(id)?;
        update.validate()?;
        self.client.send(ApiRequest::put(path, to_body(&update)?)).await?;
        self.client.invalidate(Resource::Users);
        info!("user status updated");
        Ok(())
    }

    pub async fn live_map(&self) -> Result<LiveMap, AdminError> {
        let body = self.client.send(ApiRequest::get(LIVE_MAP_PATH)).await?;
        serde_json::from_value(body).map_err(|e| AdminError::Remote(format!("malformed live map: {e}")))
    }

    pub fn users_view(&self) -> CollectionView<AdminUser> {
        CollectionView::new(Resource::Users, self.client.clone())
    }

    pub fn rides_view(&self) -> CollectionView<Ride> {
        CollectionView::new(Resource::Rides, self.client.clone())
    }

    pub fn payments_view(&self) -> CollectionView<Payment> {
        CollectionView::new(Resource::Payments, self.client.clone())
    }

    pub fn logs_view(&self) -> CollectionView<AuditLog> {
        CollectionView::new(Resource::Logs, self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{KEY_ACCESS_TOKEN, KEY_USER};
    use crate::auth::repository::mock::MemorySessionRepository;
    use crate::auth::token::tests::token_expiring_at;
    use crate::auth::SessionManager;
    use crate::collection::Resolution;
    use crate::transport::mock::MockTransport;
    use crate::transport::{ApiResponse, Method};
    use models::user::UserAction;
    use serde_json::json;

    async fn service(transport: &Arc<MockTransport>) -> AdminService {
        let token = token_expiring_at(chrono::Utc::now().timestamp() + 3600);
        let user = json!({"_id": "a1", "email": "ada@imove.rw", "role": "admin"}).to_string();
        let repo = Arc::new(MemorySessionRepository::with_entries(&[
            (KEY_ACCESS_TOKEN, token.as_str()),
            (KEY_USER, user.as_str()),
        ]));
        let session = Arc::new(SessionManager::new(repo, transport.clone()));
        session.restore().await;
        AdminService::new(Arc::new(ApiClient::new(transport.clone(), session)))
    }

    fn settings() -> FareSettings {
        FareSettings {
            base_fare: 1000.0,
            per_km_rate: 300.0,
            service_fee_percent: 10.0,
            cancellation_fee: 500.0,
            currency: "RWF".into(),
        }
    }

    #[tokio::test]
    async fn dashboard_reads_stats() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Method::Get,
            DASHBOARD_PATH,
            Ok(ApiResponse::ok(json!({"stats": {
                "users": {"totalPassengers": 40, "totalRiders": 12, "activeRiders": 5},
                "rides": {"today": 7, "total": 311},
                "earnings": {"total": 125000.0, "adminRevenue": 12500.0}
            }}))),
        );
        let stats = service(&transport).await.dashboard().await.unwrap();
        assert_eq!(stats.total_users(), 52);
        assert_eq!(stats.rides.total, 311);
    }

    #[tokio::test]
    async fn invalid_settings_never_leave_the_client() {
        let transport = Arc::new(MockTransport::new());
        let svc = service(&transport).await;
        let bad = FareSettings { service_fee_percent: 120.0, ..settings() };
        assert!(matches!(svc.update_settings(bad).await, Err(AdminError::Validation(_))));
        assert_eq!(transport.request_count(), 0);

        transport.on(Method::Put, SETTINGS_PATH, Ok(ApiResponse::ok(json!({"message": "saved"}))));
        assert_eq!(svc.update_settings(settings()).await.unwrap(), settings());
        assert_eq!(transport.requests()[0].body, Some(serde_json::to_value(settings()).unwrap()));
    }

    #[tokio::test]
    async fn create_user_validates_then_invalidates_the_users_view() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Method::Get,
            "/admin/users",
            Ok(ApiResponse::ok(json!({"users": [], "pagination": {"page": 1, "pages": 1}}))),
        );
        transport.on(
            Method::Post,
            "/admin/users",
            Ok(ApiResponse::new(201, json!({"user": {"_id": "n1", "full_name": "New Rider", "role": "rider"}}))),
        );
        let svc = service(&transport).await;
        let view = svc.users_view();
        view.resolve().await.unwrap();

        let missing_phone = NewUser {
            full_name: "New Rider".into(),
            email: "rider@imove.rw".into(),
            password: "pw".into(),
            role: "rider".into(),
            ..NewUser::default()
        };
        assert!(matches!(svc.create_user(missing_phone.clone()).await, Err(AdminError::Validation(_))));
        assert_eq!(transport.requests_to("/admin/users").len(), 1);

        let created = svc
            .create_user(NewUser { phone: "0788000000".into(), ..missing_phone })
            .await
            .unwrap();
        assert_eq!(created.id, "n1");
        assert!(matches!(view.resolve().await.unwrap(), Resolution::Fetched(_)));
    }

    #[tokio::test]
    async fn delete_requires_an_id() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Delete, "/admin/users/u9", Ok(ApiResponse::ok(json!({"message": "deleted"}))));
        let svc = service(&transport).await;
        assert!(matches!(svc.delete_user("  ").await, Err(AdminError::Validation(_))));
        svc.delete_user("u9").await.unwrap();
        assert_eq!(svc.client().epoch(Resource::Users), 1);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn status_update_sends_action_and_reason() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Put, "/admin/users/u2", Ok(ApiResponse::ok(json!({"message": "ok"}))));
        let svc = service(&transport).await;

        let no_reason = UserStatusUpdate { action: UserAction::Suspend, reason: None };
        assert!(matches!(svc.update_user_status("u2", no_reason).await, Err(AdminError::Validation(_))));

        let update = UserStatusUpdate { action: UserAction::Suspend, reason: Some("fraud".into()) };
        svc.update_user_status("u2", update).await.unwrap();
        assert_eq!(transport.requests()[0].body, Some(json!({"action": "suspend", "reason": "fraud"})));
    }

    #[tokio::test]
    async fn user_details_reads_the_user_field() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Method::Get,
            "/admin/users/u3",
            Ok(ApiResponse::ok(json!({"user": {"_id": "u3", "email": "u3@imove.rw", "role": "passenger"}}))),
        );
        let user = service(&transport).await.user_details("u3").await.unwrap();
        assert_eq!(user.email, "u3@imove.rw");
    }
}
