//! Process-wide sign-in state.
//!
//! An [`AuthSession`] is established by a successful login (or restored from
//! the cache at startup) and torn down on logout or when the backend rejects
//! the token. [`AuthService`] pairs the backend with the local cache so the
//! two never drift: every establish/teardown writes through.
//!
//! Each sign-in has a generation number owned by the caller. Logging out
//! tears down that generation, and any request still in flight for it may
//! finish on the network but can no longer write the cache.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Credentials, LoginResponse, PasswordChange, ProfileUpdate};
use crate::db;
use crate::error::ApiError;
use crate::types::UserProfile;

/// The signed-in user's credentials plus the last profile seen.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
    /// Last known snapshot. Display only; refresh before trusting it.
    pub profile: Option<UserProfile>,
}

impl AuthSession {
    fn from_login(login: LoginResponse) -> Self {
        let profile = UserProfile {
            username: login.user.username.clone(),
            role: login.user.role.clone(),
            ..UserProfile::default()
        };
        Self {
            token: login.token,
            username: login.user.username,
            profile: Some(profile),
        }
    }
}

/// Login, logout, and profile refresh with write-through caching.
///
/// Cache failures are logged and never fail the operation: the server is the
/// source of truth and the cache only saves a round-trip at startup.
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn Backend>,
    cache: Connection,
    /// Lowest generation still allowed to write the cache. Held across each
    /// write so a teardown cannot interleave with one.
    floor: Arc<Mutex<u64>>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn Backend>, cache: Connection) -> Self {
        Self {
            backend,
            cache,
            floor: Arc::new(Mutex::new(0)),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Restores a previous login from the cache, if any.
    pub async fn restore(&self) -> Option<AuthSession> {
        let stored = match db::load_auth(&self.cache).await {
            Ok(s) => s?,
            Err(e) => {
                warn!(error = %e, "could not read cached credentials");
                return None;
            }
        };
        let profile = match db::load_profile(&self.cache, &stored.username).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "discarding cached profile");
                None
            }
        };
        info!(username = %stored.username, "restored cached login");
        Some(AuthSession {
            token: stored.token,
            username: stored.username,
            profile,
        })
    }

    /// Logs in and establishes the session as `generation`.
    pub async fn login(
        &self,
        generation: u64,
        credentials: &Credentials,
    ) -> Result<AuthSession, ApiError> {
        let mut login = self.backend.login(credentials).await?;
        if login.token.is_empty() {
            return Err(ApiError::Decode("login response carried no token".into()));
        }
        if login.user.username.is_empty() {
            login.user.username = credentials.username.trim().to_lowercase();
        }
        let session = AuthSession::from_login(login);
        self.write_through(generation, Some(&session.token), session.profile.as_ref())
            .await;
        info!(username = %session.username, generation, "logged in");
        Ok(session)
    }

    /// Drops the session `generation` locally and clears the cache. The
    /// backend has no logout endpoint.
    pub async fn teardown(&self, generation: u64) {
        let mut floor = self.floor.lock().await;
        *floor = (*floor).max(generation + 1);
        if let Err(e) = db::clear_auth(&self.cache).await {
            warn!(error = %e, "could not clear cached credentials");
        }
        info!(generation, "auth session torn down");
    }

    /// Fetches the profile from the backend and caches it.
    pub async fn refresh_profile(
        &self,
        generation: u64,
        token: &str,
    ) -> Result<UserProfile, ApiError> {
        let profile = self.backend.profile(token).await?;
        self.write_through(generation, None, Some(&profile)).await;
        Ok(profile)
    }

    /// Applies a username/role change and returns the updated snapshot.
    ///
    /// The cached token is re-keyed to the new username.
    pub async fn update_profile(
        &self,
        generation: u64,
        token: &str,
        current: Option<UserProfile>,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        self.backend.update_profile(token, update).await?;
        let mut profile = current.unwrap_or_default();
        profile.username = update.username.clone();
        profile.role = Some(update.role.clone());
        self.write_through(generation, Some(token), Some(&profile)).await;
        Ok(profile)
    }

    pub async fn change_password(&self, token: &str, change: &PasswordChange) -> Result<(), ApiError> {
        self.backend.change_password(token, change).await
    }

    /// Writes the token and/or profile unless `generation` was torn down.
    /// A token is stored under the profile's username.
    async fn write_through(
        &self,
        generation: u64,
        token: Option<&str>,
        profile: Option<&UserProfile>,
    ) {
        let floor = self.floor.lock().await;
        if generation < *floor {
            debug!(generation, floor = *floor, "session ended, skipping cache write");
            return;
        }
        if let (Some(token), Some(profile)) = (token, profile) {
            if let Err(e) = db::save_auth(&self.cache, token, &profile.username).await {
                warn!(error = %e, "could not cache credentials");
            }
        }
        if let Some(profile) = profile {
            if let Err(e) = db::save_profile(&self.cache, profile).await {
                warn!(error = %e, "could not cache profile");
            }
        }
    }
}
