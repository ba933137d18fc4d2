use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{session::Role, Session},
    storage::KeyValueStore,
};
use std::sync::Arc;

pub const SESSION_KEY: &str = "adminUser";

/// Hard-coded credential check backed by a persisted session object.
///
/// Whoever can reach the store holding the session is "logged in"; this
/// only keeps casual visitors out of the dashboard.
#[derive(Clone)]
pub struct AuthService {
    kv: Arc<dyn KeyValueStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: AuthConfig) -> Self {
        Self { kv, config }
    }

    pub fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        if username != self.config.username || password != self.config.password {
            tracing::warn!("Rejected dashboard login for '{}'", username);
            return Err(AppError::Unauthorized);
        }

        let session = Session {
            username: self.config.username.clone(),
            role: Role::Admin,
        };
        self.kv.set(SESSION_KEY, &serde_json::to_vec(&session)?)?;
        tracing::info!("Dashboard session opened for '{}'", session.username);
        Ok(session)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.kv.remove(SESSION_KEY)?;
        Ok(())
    }

    /// The stored session, if any. Unreadable session data counts as
    /// logged out.
    pub fn current(&self) -> AppResult<Option<Session>> {
        let Some(bytes) = self.kv.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session data: {}", e);
                Ok(None)
            }
        }
    }
}
