// HTTP client for the machine backend REST API
use crate::application::machine_api::{ApiError, AuthApi, MachineApi, MaintenancePrediction};
use crate::domain::auth::{Credentials, Registration, Session, User};
use crate::domain::component::{ComponentName, ComponentRecord};
use crate::domain::downtime::{DowntimeEvent, DowntimeFilter, DowntimeStatistics, date_pairs};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const MACHINE_ID: &str = "C_FL104";

#[derive(Debug, Clone)]
pub struct HttpMachineApi {
    base_url: String,
    client: reqwest::Client,
}

/// `{ success, message, data }` wrapper used by the auth and downtime endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn reason(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "request failed".to_string())
    }
}

impl HttpMachineApi {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_with_query(&self, path: &str, pairs: &[(&str, String)]) -> String {
        if pairs.is_empty() {
            return self.url(path);
        }
        let query: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        format!("{}{}?{}", self.base_url, path, query.join("&"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)
    }

    /// Plain JSON endpoint: any non-2xx status is an error.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(response.text().await.unwrap_or_default()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Enveloped endpoint: the body is decoded whatever the status, so the
    /// backend's message reaches the caller.
    async fn enveloped<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = self.send(request).await?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        let envelope: Envelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
            Err(_) if status == StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized(text)),
            Err(_) => {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(envelope.reason()));
        }
        if !status.is_success() || !envelope.success {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: envelope.reason(),
            });
        }

        Ok(envelope.data)
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[async_trait]
impl MachineApi for HttpMachineApi {
    async fn component_health(&self, name: ComponentName) -> Result<ComponentRecord, ApiError> {
        let path = format!("/health/{}", urlencoding::encode(name.as_str()));
        self.get_json(&self.url(&path)).await
    }

    async fn predict_maintenance(
        &self,
        input_data: &serde_json::Value,
    ) -> Result<MaintenancePrediction, ApiError> {
        let body = serde_json::json!({
            "machine_id": MACHINE_ID,
            "input_data": input_data,
        });
        let response = self
            .send(self.client.post(self.url("/predict/maintenance")).json(&body))
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<MaintenancePrediction>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn downtime_history(&self, filter: &DowntimeFilter) -> Result<Vec<DowntimeEvent>, ApiError> {
        let url = self.url_with_query("/downtime/history", &filter.query_pairs());
        tracing::debug!("GET {}", url);
        let events = self.enveloped(self.client.get(&url)).await?;
        Ok(events.unwrap_or_default())
    }

    async fn downtime_statistics(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<DowntimeStatistics, ApiError> {
        let url = self.url_with_query("/downtime/statistics", &date_pairs(start_date, end_date));
        tracing::debug!("GET {}", url);
        let stats = self.enveloped(self.client.get(&url)).await?;
        Ok(stats.unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), ApiError> {
        self.get_json::<serde_json::Value>(&self.url("/health"))
            .await
            .map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    user: User,
}

#[async_trait]
impl AuthApi for HttpMachineApi {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let body = serde_json::json!({
            "username": credentials.username,
            "password": credentials.password,
        });
        let data: Option<LoginData> = self
            .enveloped(self.client.post(self.url("/auth/login")).json(&body))
            .await?;

        let data = data.ok_or_else(|| ApiError::Decode("login response without data".to_string()))?;
        Ok(Session {
            token: data.token,
            user: data.user,
        })
    }

    async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        let response = self
            .send(self.client.post(self.url("/auth/register")).json(registration))
            .await?;
        let status = response.status();
        let envelope: Envelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if status.is_success() && envelope.success {
            Ok(envelope.message.unwrap_or_default())
        } else {
            Err(ApiError::Rejected {
                status: status.as_u16(),
                message: envelope.reason(),
            })
        }
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .send(self.client.post(self.url("/auth/logout")).bearer_auth(token))
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        let user: Option<User> = self
            .enveloped(self.client.get(self.url("/auth/me")).bearer_auth(token))
            .await?;
        user.ok_or_else(|| ApiError::Decode("user response without data".to_string()))
    }
}
