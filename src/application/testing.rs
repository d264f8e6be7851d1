// In-memory backend fakes shared by the application tests
use crate::application::machine_api::{ApiError, AuthApi, MachineApi, MaintenancePrediction};
use crate::domain::auth::{Credentials, Registration, Session, User};
use crate::domain::component::{ComponentName, ComponentRecord};
use crate::domain::downtime::{DowntimeEvent, DowntimeFilter, DowntimeStatistics};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum FakeHealth {
    Health(f64),
    Record(ComponentRecord),
    Fail,
    Hang,
}

#[derive(Default)]
pub struct FakeMachineApi {
    health: Mutex<HashMap<ComponentName, FakeHealth>>,
    delay: Mutex<Duration>,
    pub health_calls: AtomicUsize,
    pub downtime: Mutex<Vec<DowntimeEvent>>,
    pub last_filter: Mutex<Option<DowntimeFilter>>,
    pub offline: Mutex<bool>,
}

impl FakeMachineApi {
    pub fn with_healths(healths: &[(ComponentName, f64)]) -> Self {
        let api = Self::default();
        for &(name, h) in healths {
            api.set(name, FakeHealth::Health(h));
        }
        api
    }

    pub fn set(&self, name: ComponentName, response: FakeHealth) {
        self.health.lock().unwrap().insert(name, response);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MachineApi for FakeMachineApi {
    async fn component_health(&self, name: ComponentName) -> Result<ComponentRecord, ApiError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.health.lock().unwrap().get(&name).cloned();
        match response {
            Some(FakeHealth::Health(h)) => Ok(ComponentRecord::with_health(h)),
            Some(FakeHealth::Record(record)) => Ok(record),
            Some(FakeHealth::Fail) => Err(ApiError::Status {
                status: 500,
                body: "internal error".to_string(),
            }),
            Some(FakeHealth::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ApiError::Timeout)
            }
            None => Err(ApiError::Status {
                status: 404,
                body: format!("unknown component {}", name),
            }),
        }
    }

    async fn predict_maintenance(
        &self,
        input_data: &serde_json::Value,
    ) -> Result<MaintenancePrediction, ApiError> {
        Ok(MaintenancePrediction {
            prediction: 150.0,
            prediction_formatted: None,
            input: input_data.clone(),
        })
    }

    async fn downtime_history(&self, filter: &DowntimeFilter) -> Result<Vec<DowntimeEvent>, ApiError> {
        *self.last_filter.lock().unwrap() = Some(filter.clone());
        Ok(self.downtime.lock().unwrap().clone())
    }

    async fn downtime_statistics(
        &self,
        _start_date: Option<NaiveDate>,
        _end_date: Option<NaiveDate>,
    ) -> Result<DowntimeStatistics, ApiError> {
        Ok(DowntimeStatistics::default())
    }

    async fn ping(&self) -> Result<(), ApiError> {
        if *self.offline.lock().unwrap() {
            Err(ApiError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

pub struct FakeAuthApi {
    pub password: String,
    pub token: String,
    pub expired: Mutex<bool>,
    pub logout_fails: bool,
    pub logouts: AtomicUsize,
}

impl FakeAuthApi {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            token: "token-abc".to_string(),
            expired: Mutex::new(false),
            logout_fails: false,
            logouts: AtomicUsize::new(0),
        }
    }

    pub fn user(username: &str) -> User {
        User {
            id: Some(7),
            username: username.to_string(),
            email: None,
            full_name: None,
            role: "operator".to_string(),
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        if credentials.password == self.password {
            Ok(Session {
                token: self.token.clone(),
                user: Self::user(&credentials.username),
            })
        } else {
            Err(ApiError::Unauthorized("Username atau password salah".to_string()))
        }
    }

    async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        if registration.username.len() < 3 {
            return Err(ApiError::Rejected {
                status: 400,
                message: "Username terlalu pendek".to_string(),
            });
        }
        Ok("User berhasil didaftarkan".to_string())
    }

    async fn logout(&self, _token: &str) -> Result<(), ApiError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails {
            Err(ApiError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        if *self.expired.lock().unwrap() || token != self.token {
            return Err(ApiError::Unauthorized("Invalid token".to_string()));
        }
        Ok(Self::user("operator1"))
    }
}
