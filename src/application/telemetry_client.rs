// Telemetry client - Fetches every component's health record concurrently
use crate::application::machine_api::{ApiError, MachineApi};
use crate::domain::component::{ComponentName, ComponentReading, Readings};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TelemetryClient {
    api: Arc<dyn MachineApi>,
    components: Vec<ComponentName>,
    timeout: Duration,
}

impl TelemetryClient {
    pub fn new(api: Arc<dyn MachineApi>, components: Vec<ComponentName>, timeout: Duration) -> Self {
        Self {
            api,
            components,
            timeout,
        }
    }

    pub fn components(&self) -> &[ComponentName] {
        &self.components
    }

    /// Fetch all components at once. Settles only when every request has
    /// finished; a failed request becomes an error reading for that component.
    pub async fn fetch_all(&self) -> Readings {
        let requests = self.components.iter().map(|&name| async move {
            (name, self.fetch_one(name).await)
        });

        join_all(requests).await.into_iter().collect()
    }

    async fn fetch_one(&self, name: ComponentName) -> ComponentReading {
        let result = match tokio::time::timeout(self.timeout, self.api.component_health(name)).await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout),
        };

        match result {
            Ok(record) => {
                tracing::debug!("Fetched {}: health={:?}", name, record.health_index);
                ComponentReading::Record(record)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", name, e);
                ComponentReading::failed(format!("Failed to fetch {}: {}", name, e))
            }
        }
    }
}
