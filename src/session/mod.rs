// Session management module
mod monitor;

pub use monitor::{MonitorEvent, SessionMonitor};

use crate::auth::{
    jwt, AuthApi, SessionStore, OPERARIO_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, TOKEN_KEY,
    USER_KEY,
};
use crate::error::Result;
use crate::expiry::ExpiryPolicy;
use crate::models::{Operario, SessionStatus, TokenPair, User};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const EVENT_CAPACITY: usize = 16;

/// Session transitions the UI layer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Refreshed,
    /// Renewal failed or was impossible; the user must log in again
    LoginRequired,
    LoggedOut,
}

/// Owns the token lifecycle over a [`SessionStore`] and an [`AuthApi`]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    api: Arc<dyn AuthApi>,
    /// Serializes renewals so concurrent callers share one network refresh
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, api: Arc<dyn AuthApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            api,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Read a key, treating storage failures as absence
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read '{}' from session store: {}", key, e);
                None
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.read(REFRESH_TOKEN_KEY).is_some()
    }

    pub fn user(&self) -> Option<User> {
        serde_json::from_str(&self.read(USER_KEY)?)
            .map_err(|e| tracing::warn!("Stored user is not valid JSON: {}", e))
            .ok()
    }

    pub fn operario(&self) -> Option<Operario> {
        serde_json::from_str(&self.read(OPERARIO_KEY)?)
            .map_err(|e| tracing::warn!("Stored operario is not valid JSON: {}", e))
            .ok()
    }

    /// Optimistic: a refresh token counts as renewable
    pub fn is_authenticated(&self) -> bool {
        if self.has_refresh_token() {
            return true;
        }

        self.access_token()
            .map(|token| !jwt::is_expired(&token))
            .unwrap_or(false)
    }

    pub fn time_remaining_minutes(&self) -> i64 {
        self.access_token()
            .map(|token| jwt::time_remaining_minutes(&token))
            .unwrap_or(0)
    }

    pub fn status(&self, policy: &ExpiryPolicy) -> SessionStatus {
        match self.access_token() {
            None => SessionStatus::NoSession,
            Some(token) if jwt::is_expired(&token) => SessionStatus::Expired,
            Some(token) if policy.is_expiring(jwt::time_remaining_minutes(&token)) => {
                SessionStatus::Expiring
            }
            Some(_) => SessionStatus::Active,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let response = self.api.login(email, password).await?;
        let user_json = serde_json::to_string(&response.user)?;

        // A user session replaces any operario session
        self.store.replace(
            &[
                (TOKEN_KEY, &response.tokens.token),
                (REFRESH_TOKEN_KEY, &response.tokens.refresh_token),
                (USER_KEY, &user_json),
            ],
            &[OPERARIO_KEY],
        )?;

        tracing::debug!("Logged in as {}", response.user.email);
        Ok(response.user)
    }

    pub async fn validate_cedula(&self, cedula: &str) -> Result<Operario> {
        let response = self.api.validate_cedula(cedula).await?;
        let operario_json = serde_json::to_string(&response.operario)?;

        self.store.set_many(&[
            (TOKEN_KEY, &response.tokens.token),
            (REFRESH_TOKEN_KEY, &response.tokens.refresh_token),
            (OPERARIO_KEY, &operario_json),
        ])?;

        tracing::debug!("Validated operario {}", response.operario.nombre);
        Ok(response.operario)
    }

    /// Renew the access token only if it has expired.
    ///
    /// Returns `false` when there is no refresh token or renewal failed; in
    /// the latter case the session is cleared and `LoginRequired` published.
    pub async fn refresh_if_needed(&self) -> bool {
        self.renew_when(jwt::is_expired).await
    }

    /// Renew the access token once `threshold_minutes` or fewer remain
    pub async fn renew_if_expiring(&self, threshold_minutes: i64) -> bool {
        self.renew_when(|token| {
            jwt::is_expired(token) || jwt::time_remaining_minutes(token) <= threshold_minutes
        })
        .await
    }

    async fn renew_when<F>(&self, needs_renewal: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        if !self.has_refresh_token() {
            return false;
        }

        let _guard = self.refresh_lock.lock().await;

        // Re-read under the lock: an earlier holder may have renewed already
        let Some(refresh_token) = self.read(REFRESH_TOKEN_KEY) else {
            return false;
        };
        if let Some(token) = self.access_token() {
            if !needs_renewal(&token) {
                return true;
            }
        }

        tracing::debug!("Renewing access token");
        match self.api.refresh_token(&refresh_token).await {
            Ok(pair) => match self.replace_tokens(&pair) {
                Ok(()) => {
                    let _ = self.events.send(SessionEvent::Refreshed);
                    true
                }
                Err(e) => {
                    tracing::warn!("Failed to store renewed tokens: {}", e);
                    self.end_session(SessionEvent::LoginRequired);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("Token renewal failed: {}", e);
                self.end_session(SessionEvent::LoginRequired);
                false
            }
        }
    }

    fn replace_tokens(&self, pair: &TokenPair) -> Result<()> {
        self.store.set_many(&[
            (TOKEN_KEY, &pair.token),
            (REFRESH_TOKEN_KEY, &pair.refresh_token),
        ])
    }

    /// Notify the server (best effort), then always clear local state
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.read(REFRESH_TOKEN_KEY) {
            if let Err(e) = self.api.logout(&refresh_token).await {
                tracing::warn!("Logout notification failed, clearing locally: {}", e);
            }
        }

        self.end_session(SessionEvent::LoggedOut);
    }

    fn end_session(&self, event: SessionEvent) {
        self.clear();
        let _ = self.events.send(event);
    }

    /// Remove every session key from storage
    pub fn clear(&self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("Failed to remove '{}' from session store: {}", key, e);
            }
        }
    }
}
