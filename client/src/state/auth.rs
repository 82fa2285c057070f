//! Auth-session state for the console operator.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and every page consult the session before calling the API.
//! The session bootstraps from persistent storage, and login/logout/register
//! are the only operations that write the session keys.
//!
//! The lifecycle is `Loading -> Authenticated` or `Loading -> Anonymous`;
//! login moves `Anonymous -> Authenticated` and logout moves it back.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::config::ConsoleConfig;
use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::state::storage::{
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, StorageError, USER_DATA_KEY, clear_session, load_json, save_json,
};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Authenticated,
    Anonymous,
}

impl AuthState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Loading
        } else if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// True once auth has loaded and no user is present.
#[must_use]
pub fn should_redirect_unauth(state: &AuthState) -> bool {
    !state.loading && state.user.is_none()
}

/// Where the console should navigate next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
}

#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    config: ConsoleConfig,
    state: AuthState,
}

impl Session {
    /// A session in the `Loading` phase; call [`Session::bootstrap`] next.
    #[must_use]
    pub fn new(api: ApiClient, config: &ConsoleConfig) -> Self {
        Self { api, config: config.clone(), state: AuthState { user: None, loading: true } }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Restore the session from storage.
    ///
    /// Unreadable session data is cleared so the next start is clean.
    pub fn bootstrap(&mut self) -> SessionPhase {
        self.state.loading = true;
        let storage = self.api.storage().as_ref();

        let restored = storage
            .get(ACCESS_TOKEN_KEY)
            .and_then(|token| Ok((token, load_json::<User>(storage, USER_DATA_KEY)?)));

        self.state.user = match restored {
            Ok((Some(_), Some(user))) => Some(user),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(error = %error, "stored session unreadable; clearing");
                if let Err(error) = clear_session(storage) {
                    tracing::warn!(error = %error, "failed to clear stored session");
                }
                None
            }
        };
        self.state.loading = false;

        let phase = self.phase();
        tracing::debug!(?phase, "session bootstrapped");
        phase
    }

    /// Redirect for guarded routes: `Some` when the operator must log in.
    #[must_use]
    pub fn guard(&self, current_route: &str) -> Option<Redirect> {
        if !should_redirect_unauth(&self.state) {
            return None;
        }
        let mut to = self.config.route("login");
        if let Some(target) = safe_return_path(current_route) {
            to = format!("{to}?returnUrl={target}");
        }
        Some(Redirect { to })
    }

    /// Log in with email and password.
    ///
    /// On success the tokens and profile are stored and the redirect points
    /// at `return_to` (when it is a local path) or the dashboard.
    ///
    /// # Errors
    ///
    /// The backend or storage error; the session stays anonymous.
    pub async fn login(&mut self, email: &str, password: &str, return_to: Option<&str>) -> Result<Redirect, ApiError> {
        let request = LoginRequest { email: email.trim().to_owned(), password: password.to_owned() };
        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::info!(error = %error, "login rejected");
                self.state = AuthState { user: None, loading: false };
                return Err(error);
            }
        };
        self.establish(response).await?;
        let to = return_to.and_then(safe_return_path).unwrap_or_else(|| self.config.route("dashboard"));
        Ok(Redirect { to })
    }

    /// Register a new account. Logs straight in when the backend answers
    /// with a token, otherwise sends the operator to the login page.
    ///
    /// # Errors
    ///
    /// The backend or storage error.
    pub async fn register(&mut self, request: &RegisterRequest) -> Result<Redirect, ApiError> {
        let body = self.api.register(request).await?;
        if body.get("accessToken").is_some_and(serde_json::Value::is_string) {
            let response: LoginResponse = serde_json::from_value(body)?;
            self.establish(response).await?;
            return Ok(Redirect { to: self.config.route("dashboard") });
        }
        Ok(Redirect { to: self.config.route("login") })
    }

    /// Drop the stored session and return to the login page.
    ///
    /// # Errors
    ///
    /// Fails only if storage cannot be written; the in-memory state is
    /// anonymous either way.
    pub fn logout(&mut self) -> Result<Redirect, StorageError> {
        if let Some(user) = &self.state.user {
            tracing::info!(user = %user.id, "logging out");
        }
        self.state = AuthState { user: None, loading: false };
        clear_session(self.api.storage().as_ref())?;
        Ok(Redirect { to: self.config.route("login") })
    }

    async fn establish(&mut self, response: LoginResponse) -> Result<(), ApiError> {
        let storage = self.api.storage().clone();
        storage.set(ACCESS_TOKEN_KEY, &response.access_token)?;
        match &response.refresh_token {
            Some(refresh) => storage.set(REFRESH_TOKEN_KEY, refresh)?,
            None => storage.remove(REFRESH_TOKEN_KEY)?,
        }

        let user = match response.user_data {
            Some(user) => user,
            None => match self.api.current_user().await {
                Ok(user) => user,
                Err(error) => {
                    if let Err(clear_error) = clear_session(storage.as_ref()) {
                        tracing::warn!(error = %clear_error, "failed to clear half-established session");
                    }
                    self.state = AuthState { user: None, loading: false };
                    return Err(error);
                }
            },
        };
        save_json(storage.as_ref(), USER_DATA_KEY, &user)?;
        tracing::info!(user = %user.id, "session authenticated");
        self.state = AuthState { user: Some(user), loading: false };
        Ok(())
    }
}

/// Accept only local absolute paths so a crafted return URL cannot send the
/// operator off-site.
fn safe_return_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') || trimmed.starts_with("//") || trimmed.contains("://") {
        return None;
    }
    Some(trimmed.to_owned())
}
