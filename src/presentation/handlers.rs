// HTTP request handlers
use crate::application::auth_service::AuthError;
use crate::application::machine_api::ApiError;
use crate::domain::auth::{Credentials, Registration, User};
use crate::domain::component::ComponentName;
use crate::domain::downtime::{DEFAULT_DOWNTIME_LIMIT, DateRange};
use crate::domain::fmea::fmea_for;
use crate::infrastructure::chunked_json::stream_response;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_stream::{StreamExt, wrappers::WatchStream};

#[derive(Deserialize)]
pub struct DowntimeQuery {
    pub range: Option<DateRange>,
    pub component: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct StatisticsQuery {
    pub range: Option<DateRange>,
}

#[derive(Deserialize)]
pub struct NotificationsUpdate {
    pub enabled: bool,
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

fn api_error_status(e: &ApiError) -> StatusCode {
    match e {
        ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ApiError::Rejected { .. } => StatusCode::BAD_REQUEST,
        ApiError::Transport(_) | ApiError::Status { .. } | ApiError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn auth_error_status(e: &AuthError) -> StatusCode {
    match e {
        AuthError::InvalidCredentials(_) | AuthError::NotAuthenticated | AuthError::SessionExpired => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::Rejected(_) => StatusCode::BAD_REQUEST,
        AuthError::Api(api) => api_error_status(api),
        AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_error_response(e: AuthError) -> Response {
    error_response(auth_error_status(&e), e)
}

fn api_error_response(context: &str, e: ApiError) -> Response {
    tracing::error!("{}: {}", context, e);
    error_response(api_error_status(&e), e)
}

/// Dashboard routes are only served to a logged-in operator.
fn require_session(state: &AppState) -> Result<User, Response> {
    state.auth.require_session().map_err(auth_error_response)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match state.auth.login(&credentials).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => {
            tracing::warn!("Login failed for {}: {}", credentials.username, e);
            auth_error_response(e)
        }
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<Registration>,
) -> Response {
    match state.auth.register(&registration).await {
        Ok(message) => (StatusCode::CREATED, Json(json!({ "message": message }))).into_response(),
        Err(e) => auth_error_response(e),
    }
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    match state.auth.logout().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => auth_error_response(e),
    }
}

pub async fn current_user(State(state): State<Arc<AppState>>) -> Response {
    match state.auth.current_user().await {
        Ok(user) => Json(user).into_response(),
        Err(e) => auth_error_response(e),
    }
}

/// Current dashboard state
pub async fn get_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }

    let view = state.monitor.view(state.store.notifications_enabled()).await;
    match json_response(&view, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream one dashboard frame per applied poll cycle
pub async fn stream_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }

    let compress = accepts_brotli(&headers);
    let monitor = state.monitor.clone();
    let store = state.store.clone();
    // Yields the current cycle first, then once per applied cycle.
    let mut updates = WatchStream::new(monitor.subscribe());

    let stream = async_stream::stream! {
        while updates.next().await.is_some() {
            yield monitor.view(store.notifications_enabled()).await;
        }
    };

    stream_response(stream, compress).into_response()
}

pub async fn refresh_dashboard(State(state): State<Arc<AppState>>) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }
    state.refresh.request();
    StatusCode::ACCEPTED.into_response()
}

pub async fn dismiss_alert(State(state): State<Arc<AppState>>) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }
    let dismissed = state.monitor.dismiss_alert().await;
    Json(json!({ "dismissed": dismissed })).into_response()
}

pub async fn get_preferences(State(state): State<Arc<AppState>>) -> Response {
    Json(json!({
        "notifications_enabled": state.store.notifications_enabled(),
        "authenticated": state.store.is_authenticated(),
    }))
    .into_response()
}

pub async fn set_notifications(
    State(state): State<Arc<AppState>>,
    Json(update): Json<NotificationsUpdate>,
) -> Response {
    match state.store.set_notifications_enabled(update.enabled) {
        Ok(()) => Json(json!({ "notifications_enabled": update.enabled })).into_response(),
        Err(e) => {
            tracing::error!("Failed to persist notification preference: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub async fn toggle_notifications(State(state): State<Arc<AppState>>) -> Response {
    match state.store.toggle_notifications() {
        Ok(enabled) => Json(json!({ "notifications_enabled": enabled })).into_response(),
        Err(e) => {
            tracing::error!("Failed to persist notification preference: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// FMEA risk table for one component
pub async fn get_fmea(Path(component): Path<String>) -> Response {
    match component.parse::<ComponentName>() {
        Ok(name) => Json(fmea_for(name)).into_response(),
        Err(e) => error_response(StatusCode::NOT_FOUND, e),
    }
}

pub async fn downtime_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DowntimeQuery>,
) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }

    let today = chrono::Local::now().date_naive();
    match state
        .maintenance
        .downtime_for_range(
            query.range.unwrap_or_default(),
            query.component,
            query.limit.unwrap_or(DEFAULT_DOWNTIME_LIMIT),
            today,
        )
        .await
    {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => api_error_response("Error fetching downtime history", e),
    }
}

pub async fn downtime_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }

    let today = chrono::Local::now().date_naive();
    match state
        .maintenance
        .downtime_statistics(query.range.unwrap_or_default(), today)
        .await
    {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => api_error_response("Error fetching downtime statistics", e),
    }
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(input_data): Json<serde_json::Value>,
) -> Response {
    if let Err(response) = require_session(&state) {
        return response;
    }

    match state.maintenance.predict(&input_data).await {
        Ok(prediction) => Json(json!({
            "prediction": prediction.prediction,
            "prediction_formatted": prediction.formatted(),
            "input": prediction.input,
        }))
        .into_response(),
        Err(e) => api_error_response("Error predicting maintenance", e),
    }
}

/// Backend liveness, for the connection indicator
pub async fn connection(State(state): State<Arc<AppState>>) -> Response {
    let connected = state.maintenance.is_backend_reachable().await;
    Json(json!({ "connected": connected })).into_response()
}
