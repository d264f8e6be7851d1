// Auth service - Login, registration and session lifecycle
use crate::application::machine_api::{ApiError, AuthApi};
use crate::domain::auth::{Credentials, Registration, User};
use crate::infrastructure::client_store::{ClientStore, StoreError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login failed: {0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    Rejected(String),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("session expired, please log in again")]
    SessionExpired,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AuthService {
    api: Arc<dyn AuthApi>,
    store: Arc<ClientStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<ClientStore>) -> Self {
        Self { api, store }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let session = self.api.login(credentials).await.map_err(|e| match e {
            ApiError::Unauthorized(message) | ApiError::Rejected { message, .. } => {
                AuthError::InvalidCredentials(message)
            }
            other => AuthError::Api(other),
        })?;

        self.store.set_session(session.token, session.user.clone())?;
        tracing::info!("User {} logged in", session.user.username);
        Ok(session.user)
    }

    pub async fn register(&self, registration: &Registration) -> Result<String, AuthError> {
        self.api.register(registration).await.map_err(|e| match e {
            ApiError::Rejected { message, .. } => AuthError::Rejected(message),
            other => AuthError::Api(other),
        })
    }

    /// The local session is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Some(token) = self.store.token() {
            if let Err(e) = self.api.logout(&token).await {
                tracing::warn!("Backend logout failed: {}", e);
            }
        }
        self.store.clear_session()?;
        Ok(())
    }

    /// Refresh the current user from the backend. An unauthorized answer ends
    /// the local session.
    pub async fn current_user(&self) -> Result<User, AuthError> {
        let token = self.store.token().ok_or(AuthError::NotAuthenticated)?;

        match self.api.me(&token).await {
            Ok(user) => {
                self.store.set_user(user.clone())?;
                Ok(user)
            }
            Err(ApiError::Unauthorized(reason)) => {
                tracing::warn!("Session rejected by backend ({}), logging out", reason);
                self.store.clear_session()?;
                Err(AuthError::SessionExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The locally stored user, when both token and user are present.
    pub fn require_session(&self) -> Result<User, AuthError> {
        self.store.user().ok_or(AuthError::NotAuthenticated)
    }
}
