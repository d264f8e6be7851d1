// Application state for HTTP handlers
use crate::application::auth_service::AuthService;
use crate::application::maintenance_service::MaintenanceService;
use crate::application::monitor_service::MonitorService;
use crate::application::scheduler::RefreshTrigger;
use crate::infrastructure::client_store::ClientStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<MonitorService>,
    pub refresh: RefreshTrigger,
    pub auth: AuthService,
    pub maintenance: MaintenanceService,
    pub store: Arc<ClientStore>,
}
