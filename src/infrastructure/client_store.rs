// Client-side persisted state: notification preference and login session
use crate::domain::auth::User;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode client state: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPreferences {
    #[serde(default = "default_notifications")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub auth_token: Option<String>,
    // Tables must come after plain values in TOML output
    #[serde(default)]
    pub auth_user: Option<User>,
}

fn default_notifications() -> bool {
    true
}

impl Default for ClientPreferences {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            auth_token: None,
            auth_user: None,
        }
    }
}

/// Read once at startup, written through on every change.
#[derive(Debug)]
pub struct ClientStore {
    path: PathBuf,
    state: RwLock<ClientPreferences>,
}

impl ClientStore {
    /// Load the store from `path`. A missing or unreadable file starts from defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable client state {}: {}", path.display(), e);
                ClientPreferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ClientPreferences::default(),
            Err(e) => {
                tracing::warn!("Could not read client state {}: {}", path.display(), e);
                ClientPreferences::default()
            }
        };

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub fn snapshot(&self) -> ClientPreferences {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.snapshot().notifications_enabled
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot().auth_token
    }

    /// The stored user, only while a token is stored alongside it.
    pub fn user(&self) -> Option<User> {
        let state = self.snapshot();
        state.auth_token.and(state.auth_user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.update(|s| s.notifications_enabled = enabled)
    }

    pub fn toggle_notifications(&self) -> Result<bool, StoreError> {
        let mut enabled = true;
        self.update(|s| {
            s.notifications_enabled = !s.notifications_enabled;
            enabled = s.notifications_enabled;
        })?;
        Ok(enabled)
    }

    pub fn set_session(&self, token: String, user: User) -> Result<(), StoreError> {
        self.update(|s| {
            s.auth_token = Some(token);
            s.auth_user = Some(user);
        })
    }

    pub fn set_user(&self, user: User) -> Result<(), StoreError> {
        self.update(|s| s.auth_user = Some(user))
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.update(|s| {
            s.auth_token = None;
            s.auth_user = None;
        })
    }

    /// Memory only takes the change once it is on disk.
    fn update(&self, change: impl FnOnce(&mut ClientPreferences)) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.clone();
        change(&mut next);

        let encoded = toml::to_string(&next)?;
        std::fs::write(&self.path, encoded).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        *state = next;
        Ok(())
    }
}
