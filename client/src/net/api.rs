//! Token-authenticated REST client for the marketplace backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page talks to the backend through [`ApiClient`]. A request passes
//! through one interceptor on the way out (attach `Authorization` from
//! storage) and one on the way back (map non-2xx to [`ApiError`], optionally
//! refresh the token and replay once on 401).
//!
//! ERROR HANDLING
//! ==============
//! Nothing is retried except the single opt-in refresh replay. Callers
//! reduce errors with [`ApiError::display_message`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::endpoints::{Auth, Endpoint, EndpointRegistry};
use super::error::ApiError;
use super::types::{
    Doctor, Document, KycKind, KycRecord, LoginRequest, LoginResponse, RefreshResponse, RegisterRequest,
    StatusUpdate, User,
};
use crate::config::ConsoleConfig;
use crate::state::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Storage, load_refresh_token};

/// What to do when an authenticated call comes back 401.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Surface [`ApiError::Unauthorized`] straight away.
    #[default]
    Disabled,
    /// Exchange the stored refresh token, then replay the call once.
    RefreshAndReplay,
}

/// Envelope keys that may sit next to `data` in a wrapped response.
const ENVELOPE_KEYS: [&str; 6] = ["data", "message", "status", "success", "code", "timestamp"];

/// Keys under which paged list responses carry their rows.
const LIST_KEYS: [&str; 3] = ["content", "items", "results"];

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    registry: EndpointRegistry,
    storage: Arc<dyn Storage>,
    refresh: RefreshPolicy,
}

impl ApiClient {
    /// Build a client from console config.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ConsoleConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(config.request_timeout_secs)).build()?;
        let refresh =
            if config.refresh_on_unauthorized { RefreshPolicy::RefreshAndReplay } else { RefreshPolicy::Disabled };
        let registry = EndpointRegistry::new(&config.api_base_url, &config.token_type);
        Ok(Self { http, registry, storage, refresh })
    }

    #[must_use]
    pub fn with_refresh_policy(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; bad credentials surface as `Unauthorized`.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.call_json(Endpoint::Login, &[], Some(&serde_json::to_value(request)?)).await
    }

    /// `POST /api/auth/register`. The body shape varies by backend build, so
    /// it is returned untyped.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError> {
        self.call_json(Endpoint::Register, &[], Some(&serde_json::to_value(request)?)).await
    }

    /// `POST /api/auth/refresh-token`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        // Bypasses `send` so the 401 path never recurses into itself.
        let body = json!({ "refreshToken": refresh_token });
        let response = self.send_once(Endpoint::RefreshToken, &[], Some(&body)).await?;
        let response = check_status(Endpoint::RefreshToken, response).await?;
        let value = unwrap_envelope(read_body(response).await?);
        Ok(serde_json::from_value(value)?)
    }

    /// `GET /api/auth/me`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.call_json(Endpoint::CurrentUser, &[], None).await
    }

    // =========================================================================
    // Doctors
    // =========================================================================

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, ApiError> {
        self.call_list(Endpoint::ListDoctors, &[]).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, ApiError> {
        self.call_json(Endpoint::GetDoctor, &[("doctorId", doctor_id)], None).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn create_doctor(&self, body: &Value) -> Result<Value, ApiError> {
        self.call_json(Endpoint::CreateDoctor, &[], Some(body)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn update_doctor(&self, doctor_id: &str, body: &Value) -> Result<Value, ApiError> {
        self.call_json(Endpoint::UpdateDoctor, &[("doctorId", doctor_id)], Some(body)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn update_doctor_status(&self, doctor_id: &str, update: &StatusUpdate) -> Result<Value, ApiError> {
        let body = serde_json::to_value(update)?;
        self.call_json(Endpoint::UpdateDoctorStatus, &[("doctorId", doctor_id)], Some(&body)).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.call_list(Endpoint::ListUsers, &[]).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.call_json(Endpoint::GetUser, &[("userId", user_id)], None).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn create_user(&self, body: &Value) -> Result<Value, ApiError> {
        self.call_json(Endpoint::CreateUser, &[], Some(body)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn update_user(&self, user_id: &str, body: &Value) -> Result<Value, ApiError> {
        self.call_json(Endpoint::UpdateUser, &[("userId", user_id)], Some(body)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn set_user_enabled(&self, user_id: &str, enabled: bool) -> Result<Value, ApiError> {
        let body = json!({ "enabled": enabled });
        self.call_json(Endpoint::SetUserEnabled, &[("userId", user_id)], Some(&body)).await
    }

    // =========================================================================
    // KYC
    // =========================================================================

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list_kyc(&self, kind: KycKind) -> Result<Vec<KycRecord>, ApiError> {
        self.call_list(Endpoint::ListKyc, &kyc_params(kind, None)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn get_kyc(&self, kind: KycKind, kyc_id: &str) -> Result<KycRecord, ApiError> {
        self.call_json(Endpoint::GetKyc, &kyc_params(kind, Some(kyc_id)), None).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn update_kyc_status(
        &self,
        kind: KycKind,
        kyc_id: &str,
        update: &StatusUpdate,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(update)?;
        self.call_json(Endpoint::UpdateKycStatus, &kyc_params(kind, Some(kyc_id)), Some(&body)).await
    }

    /// Download an uploaded KYC document as raw bytes.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn fetch_document(&self, uid: &str, doc_type: &str) -> Result<Document, ApiError> {
        let response = self.send(Endpoint::FetchDocument, &[("uid", uid), ("docType", doc_type)], None).await?;
        let content_type =
            response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(ToOwned::to_owned);
        let bytes = response.bytes().await?.to_vec();
        Ok(Document { content_type, bytes })
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    async fn call_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, params, body).await?;
        let value = unwrap_envelope(read_body(response).await?);
        Ok(serde_json::from_value(value)?)
    }

    async fn call_list<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let response = self.send(endpoint, params, None).await?;
        let value = unwrap_list(unwrap_envelope(read_body(response).await?));
        Ok(serde_json::from_value(value)?)
    }

    /// Issue a call through both interceptors and return a 2xx response.
    async fn send(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self.send_once(endpoint, params, body).await?;
        let authenticated = endpoint.spec().auth == Auth::Token;
        if response.status() != StatusCode::UNAUTHORIZED || !authenticated {
            return check_status(endpoint, response).await;
        }

        let rejected = read_body(response).await.unwrap_or(Value::Null);
        if self.refresh == RefreshPolicy::RefreshAndReplay && self.refresh_access_token().await? {
            tracing::debug!(endpoint = endpoint.spec().name, "replaying request after token refresh");
            let replay = self.send_once(endpoint, params, body).await?;
            return check_status(endpoint, replay).await;
        }
        Err(ApiError::Unauthorized { body: rejected })
    }

    async fn send_once(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let spec = endpoint.spec();
        let url = self.registry.url(endpoint, params)?;
        let mut request = self.http.request(spec.method.clone(), &url);

        if spec.auth == Auth::Token {
            if let Some(token) = self.storage.get(ACCESS_TOKEN_KEY)? {
                request = request.header(AUTHORIZATION, self.registry.authorization(&token));
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(endpoint = spec.name, method = %spec.method, %url, "api request");
        Ok(request.send().await?)
    }

    /// Returns `true` when a new access token was stored.
    async fn refresh_access_token(&self) -> Result<bool, ApiError> {
        let Some(refresh_token) = load_refresh_token(self.storage.as_ref())? else {
            return Ok(false);
        };
        match self.refresh_token(&refresh_token).await {
            Ok(refreshed) => {
                self.storage.set(ACCESS_TOKEN_KEY, &refreshed.access_token)?;
                if let Some(next) = refreshed.refresh_token {
                    self.storage.set(REFRESH_TOKEN_KEY, &next)?;
                }
                tracing::info!("access token refreshed");
                Ok(true)
            }
            Err(error) => {
                tracing::warn!(error = %error, "token refresh failed");
                Ok(false)
            }
        }
    }
}

fn kyc_params<'a>(kind: KycKind, kyc_id: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("reviewer", kind.reviewer()), ("subject", kind.subject())];
    if let Some(kyc_id) = kyc_id {
        params.push(("kycId", kyc_id));
    }
    params
}

async fn check_status(endpoint: Endpoint, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_body(response).await.unwrap_or(Value::Null);
    tracing::warn!(endpoint = endpoint.spec().name, status = status.as_u16(), "api call failed");
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized { body });
    }
    Err(ApiError::Status { status: status.as_u16(), body })
}

/// Body as JSON; empty bodies become `null`, non-JSON text becomes a string.
async fn read_body(response: reqwest::Response) -> Result<Value, ApiError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Strip a `{ "data": ... }` wrapper when that is all the object is.
pub(crate) fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.contains_key("data") && map.keys().all(|key| ENVELOPE_KEYS.contains(&key.as_str())) =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Pull the row array out of paged list shapes.
pub(crate) fn unwrap_list(value: Value) -> Value {
    match value {
        Value::Array(rows) => Value::Array(rows),
        Value::Null => Value::Array(Vec::new()),
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if map.get(key).is_some_and(Value::is_array) {
                    return map.remove(key).unwrap_or(Value::Null);
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}
