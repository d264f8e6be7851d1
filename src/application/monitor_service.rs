// Monitor service - Applies poll cycles to the dashboard state
use crate::application::telemetry_client::TelemetryClient;
use crate::domain::aggregate::{AggregateSnapshot, aggregate};
use crate::domain::component::{ComponentName, HealthBand, Readings};
use crate::domain::history::{GapPolicy, HistoryBook};
use crate::domain::prediction::{AutoPredictionState, PredictionAlert};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{RwLock, watch};

/// Everything the dashboard shows, owned by the poll cycle that last wrote it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    applied_cycle: u64,
    readings: Readings,
    snapshot: AggregateSnapshot,
    history: HistoryBook,
    alert: PredictionAlert,
    connection_error: Option<String>,
    last_update: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new(history: HistoryBook) -> Self {
        Self {
            applied_cycle: 0,
            readings: Readings::new(),
            snapshot: AggregateSnapshot::default(),
            history,
            alert: PredictionAlert::default(),
            connection_error: None,
            last_update: None,
        }
    }

    /// Apply one cycle's readings. Returns `false` and leaves the state
    /// untouched when a newer cycle has already been applied.
    pub fn apply(
        &mut self,
        cycle: u64,
        readings: Readings,
        at: DateTime<Utc>,
        backend: &str,
    ) -> bool {
        if cycle <= self.applied_cycle {
            tracing::warn!(
                "Discarding stale poll cycle {} (cycle {} already applied)",
                cycle,
                self.applied_cycle
            );
            return false;
        }

        let snapshot = aggregate(&readings);
        let label = at.with_timezone(&Local).format("%H:%M:%S").to_string();
        self.history.record_cycle(&readings, &snapshot, label);
        self.alert.update(&readings);

        let all_failed = !readings.is_empty() && readings.values().all(|r| r.error().is_some());
        self.connection_error = if all_failed {
            Some(format!("Failed to connect to backend at {}", backend))
        } else {
            None
        };

        self.applied_cycle = cycle;
        self.readings = readings;
        self.snapshot = snapshot;
        self.last_update = Some(at);
        true
    }

    pub fn view(&self, notifications_enabled: bool) -> DashboardView {
        DashboardView {
            cycle: self.applied_cycle,
            last_update: self.last_update,
            refreshing: false,
            connection_error: self.connection_error.clone(),
            overall_band: self.snapshot.overall_band(),
            components: self
                .readings
                .iter()
                .map(|(&name, reading)| {
                    let record = reading.record();
                    ComponentView {
                        name,
                        band: reading.band(),
                        health_index: record.and_then(|r| r.health()),
                        status: record.map(|r| r.status.clone()).unwrap_or_default(),
                        oee_score: record.map(|r| r.metrics.oee_score).unwrap_or_default(),
                        oee_from_factors: record
                            .map(|r| r.metrics.oee_from_factors())
                            .unwrap_or_default(),
                        error: reading.error().map(str::to_string),
                    }
                })
                .collect(),
            summary: self.snapshot,
            history: self.history.clone(),
            alert: self.alert.visible(notifications_enabled).cloned(),
        }
    }
}

#[cfg(test)]
impl DashboardState {
    pub fn applied_cycle(&self) -> u64 {
        self.applied_cycle
    }

    pub fn snapshot(&self) -> &AggregateSnapshot {
        &self.snapshot
    }

    pub fn history(&self) -> &HistoryBook {
        &self.history
    }

    pub fn alert(&self) -> &PredictionAlert {
        &self.alert
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    pub name: ComponentName,
    pub band: HealthBand,
    pub health_index: Option<f64>,
    pub status: String,
    pub oee_score: f64,
    pub oee_from_factors: f64,
    pub error: Option<String>,
}

/// Read model handed to the rendering side.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub cycle: u64,
    pub last_update: Option<DateTime<Utc>>,
    pub refreshing: bool,
    pub connection_error: Option<String>,
    pub overall_band: HealthBand,
    pub components: Vec<ComponentView>,
    pub summary: AggregateSnapshot,
    pub history: HistoryBook,
    pub alert: Option<AutoPredictionState>,
}

pub struct MonitorService {
    client: TelemetryClient,
    backend: String,
    state: RwLock<DashboardState>,
    next_cycle: AtomicU64,
    refreshing: AtomicBool,
    applied: watch::Sender<u64>,
}

/// Clears the refreshing flag when the cycle ends, including when it is dropped mid-fetch.
struct RefreshingGuard<'a>(&'a AtomicBool);

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl MonitorService {
    pub fn new(
        client: TelemetryClient,
        backend: String,
        history_capacity: usize,
        gap_policy: GapPolicy,
    ) -> Self {
        let history = HistoryBook::new(client.components(), history_capacity, gap_policy);
        let (applied, _) = watch::channel(0);
        Self {
            client,
            backend,
            state: RwLock::new(DashboardState::new(history)),
            next_cycle: AtomicU64::new(0),
            refreshing: AtomicBool::new(false),
            applied,
        }
    }

    /// Fetch, aggregate and store one cycle. Returns the cycle number when the
    /// result was applied.
    pub async fn run_cycle(&self) -> Option<u64> {
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        self.refreshing.store(true, Ordering::SeqCst);
        let guard = RefreshingGuard(&self.refreshing);
        tracing::debug!("Poll cycle {} started", cycle);

        let readings = self.client.fetch_all().await;

        let applied = self
            .state
            .write()
            .await
            .apply(cycle, readings, Utc::now(), &self.backend);
        drop(guard);

        if applied {
            self.applied.send_replace(cycle);
            tracing::debug!("Poll cycle {} applied", cycle);
            Some(cycle)
        } else {
            None
        }
    }

    pub async fn dismiss_alert(&self) -> bool {
        let mut state = self.state.write().await;
        let had_alert = state.alert.state().is_some();
        state.alert.dismiss();
        had_alert
    }

    pub async fn view(&self, notifications_enabled: bool) -> DashboardView {
        let mut view = self.state.read().await.view(notifications_enabled);
        view.refreshing = self.refreshing.load(Ordering::SeqCst);
        view
    }

    #[cfg(test)]
    pub async fn with_state<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&*self.state.read().await)
    }

    /// Wakes whenever a cycle is applied.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.applied.subscribe()
    }
}
