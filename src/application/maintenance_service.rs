// Maintenance service - Downtime log, prediction requests and backend liveness
use crate::application::machine_api::{ApiError, MachineApi, MaintenancePrediction};
use crate::domain::downtime::{DateRange, DowntimeEntry, DowntimeFilter, DowntimeStatistics};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct MaintenanceService {
    api: Arc<dyn MachineApi>,
}

impl MaintenanceService {
    pub fn new(api: Arc<dyn MachineApi>) -> Self {
        Self { api }
    }

    pub async fn downtime_history(&self, filter: &DowntimeFilter) -> Result<Vec<DowntimeEntry>, ApiError> {
        let events = self.api.downtime_history(filter).await?;
        tracing::debug!("Transforming {} downtime records", events.len());
        Ok(events
            .iter()
            .enumerate()
            .map(|(i, event)| DowntimeEntry::from_event(event, i))
            .collect())
    }

    /// Downtime listing for a preset range ending `today`.
    pub async fn downtime_for_range(
        &self,
        range: DateRange,
        component: Option<String>,
        limit: u32,
        today: NaiveDate,
    ) -> Result<Vec<DowntimeEntry>, ApiError> {
        let (start_date, end_date) = range.resolve(today);
        let filter = DowntimeFilter {
            limit,
            component,
            start_date,
            end_date: Some(end_date),
        };
        self.downtime_history(&filter).await
    }

    pub async fn downtime_statistics(
        &self,
        range: DateRange,
        today: NaiveDate,
    ) -> Result<DowntimeStatistics, ApiError> {
        let (start_date, end_date) = range.resolve(today);
        self.api.downtime_statistics(start_date, Some(end_date)).await
    }

    pub async fn predict(&self, input_data: &serde_json::Value) -> Result<MaintenancePrediction, ApiError> {
        self.api.predict_maintenance(input_data).await
    }

    pub async fn is_backend_reachable(&self) -> bool {
        match self.api.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Backend liveness check failed: {}", e);
                false
            }
        }
    }
}
