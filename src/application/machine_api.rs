// Backend API traits for machine telemetry and authentication
use crate::domain::auth::{Credentials, Registration, Session, User};
use crate::domain::component::{ComponentName, ComponentRecord};
use crate::domain::downtime::{DowntimeEvent, DowntimeFilter, DowntimeStatistics};
use crate::domain::duration::format_duration;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Result of `POST /predict/maintenance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePrediction {
    /// Minutes.
    pub prediction: f64,
    #[serde(default)]
    pub prediction_formatted: Option<String>,
    #[serde(default)]
    pub input: serde_json::Value,
}

impl MaintenancePrediction {
    pub fn formatted(&self) -> String {
        self.prediction_formatted
            .clone()
            .unwrap_or_else(|| format_duration(self.prediction))
    }
}

#[async_trait]
pub trait MachineApi: Send + Sync {
    /// Latest health record for one component
    async fn component_health(&self, name: ComponentName) -> Result<ComponentRecord, ApiError>;

    /// Ask the backend model for a maintenance duration estimate
    async fn predict_maintenance(
        &self,
        input_data: &serde_json::Value,
    ) -> Result<MaintenancePrediction, ApiError>;

    async fn downtime_history(&self, filter: &DowntimeFilter) -> Result<Vec<DowntimeEvent>, ApiError>;

    async fn downtime_statistics(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<DowntimeStatistics, ApiError>;

    /// Liveness check
    async fn ping(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError>;

    /// Returns the backend's confirmation message
    async fn register(&self, registration: &Registration) -> Result<String, ApiError>;

    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    async fn me(&self, token: &str) -> Result<User, ApiError>;
}
