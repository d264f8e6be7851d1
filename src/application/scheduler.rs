// Poll scheduler - Fixed-interval fetch cycles with manual refresh
use crate::application::monitor_service::MonitorService;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Requests an out-of-band poll cycle. Requests made while a cycle is in
/// flight collapse into a single follow-up cycle.
#[derive(Clone, Default)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn request(&self) {
        self.notify.notify_one();
    }
}

/// Owns the polling task. Dropping the handle stops polling.
pub struct SchedulerHandle {
    refresh: RefreshTrigger,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn refresh_trigger(&self) -> RefreshTrigger {
        self.refresh.clone()
    }

    /// Stop polling and wait for the task to exit. A cycle still in flight is
    /// abandoned and its result never applied.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Poll scheduler task failed: {}", e);
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Start polling: one cycle immediately, then one per `period`.
pub fn spawn_poll_scheduler(service: Arc<MonitorService>, period: Duration) -> SchedulerHandle {
    let refresh = RefreshTrigger::default();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let notify = refresh.notify.clone();

    let task = tokio::spawn(run(service, period, notify, shutdown_rx));

    SchedulerHandle {
        refresh,
        shutdown,
        task: Some(task),
    }
}

async fn run(
    service: Arc<MonitorService>,
    period: Duration,
    notify: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!("Polling every {:?}", period);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                // A refresh requested before this cycle starts is served by it.
                let _ = notify.notified().now_or_never();
            }
            _ = notify.notified() => tracing::debug!("Manual refresh requested"),
        }

        // Cycles never overlap: the next trigger is only observed once this one settles.
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                tracing::debug!("Abandoning in-flight poll cycle on shutdown");
                break;
            }
            _ = service.run_cycle() => {}
        }
    }

    tracing::info!("Poll scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::telemetry_client::{DEFAULT_REQUEST_TIMEOUT, TelemetryClient};
    use crate::application::testing::FakeMachineApi;
    use crate::domain::component::ComponentName;
    use crate::domain::history::GapPolicy;
    use tokio::time::sleep;

    fn service(api: Arc<FakeMachineApi>) -> Arc<MonitorService> {
        let client = TelemetryClient::new(
            api,
            vec![ComponentName::Feeder, ComponentName::Printing],
            DEFAULT_REQUEST_TIMEOUT,
        );
        Arc::new(MonitorService::new(
            client,
            "http://backend".to_string(),
            50,
            GapPolicy::CarryForward,
        ))
    }

    fn fake_api() -> Arc<FakeMachineApi> {
        Arc::new(FakeMachineApi::with_healths(&[
            (ComponentName::Feeder, 82.0),
            (ComponentName::Printing, 64.0),
        ]))
    }

    async fn applied(service: &MonitorService) -> u64 {
        service.with_state(|s| s.applied_cycle()).await
    }

    #[tokio::test]
    async fn test_polls_immediately_on_start() {
        let api = fake_api();
        let service = service(api.clone());
        let handle = spawn_poll_scheduler(service.clone(), Duration::from_secs(60));

        sleep(Duration::from_millis(100)).await;
        assert_eq!(api.calls(), 2);
        assert_eq!(applied(&service).await, 1);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_polls_on_interval() {
        let service = service(fake_api());
        let handle = spawn_poll_scheduler(service.clone(), Duration::from_millis(50));

        sleep(Duration::from_millis(280)).await;
        assert!(applied(&service).await >= 4);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_manual_refresh_runs_out_of_band() {
        let service = service(fake_api());
        let handle = spawn_poll_scheduler(service.clone(), Duration::from_secs(60));
        sleep(Duration::from_millis(100)).await;

        handle.refresh_trigger().request();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(applied(&service).await, 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_refreshes_during_cycle_coalesce() {
        let api = fake_api();
        api.set_delay(Duration::from_millis(150));
        let service = service(api);
        let handle = spawn_poll_scheduler(service.clone(), Duration::from_secs(60));
        sleep(Duration::from_millis(30)).await;

        let trigger = handle.refresh_trigger();
        trigger.request();
        trigger.request();
        trigger.request();

        sleep(Duration::from_millis(600)).await;
        assert_eq!(applied(&service).await, 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_cycle() {
        let api = fake_api();
        api.set_delay(Duration::from_millis(200));
        let service = service(api);
        let handle = spawn_poll_scheduler(service.clone(), Duration::from_secs(60));
        sleep(Duration::from_millis(50)).await;

        handle.shutdown().await;
        sleep(Duration::from_millis(300)).await;
        assert_eq!(applied(&service).await, 0);
        assert!(!service.view(true).await.refreshing);
    }

    #[tokio::test]
    async fn test_refresh_pending_at_tick_runs_one_cycle() {
        let api = fake_api();
        let service = service(api.clone());
        let handle = spawn_poll_scheduler(service.clone(), Duration::from_secs(60));
        // Requested before the task first runs, so the first tick and the
        // refresh are ready together.
        handle.refresh_trigger().request();

        sleep(Duration::from_millis(200)).await;
        assert_eq!(applied(&service).await, 1);
        assert_eq!(api.calls(), 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_polling() {
        let api = fake_api();
        let service = service(api.clone());
        let handle = spawn_poll_scheduler(service, Duration::from_millis(40));
        sleep(Duration::from_millis(100)).await;

        drop(handle);
        sleep(Duration::from_millis(20)).await;
        let calls = api.calls();
        sleep(Duration::from_millis(200)).await;
        assert_eq!(api.calls(), calls);
    }
}
