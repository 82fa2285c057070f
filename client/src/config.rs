//! Console configuration parsed from environment variables.
//!
//! Every setting has a default so the console starts against a local backend
//! with no environment at all. The CLI layers its flags on top of this.

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_BASE_PATH: &str = "/admin";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_STORAGE_FILE: &str = ".petadmin/session.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend origin without a trailing slash.
    pub api_base_url: String,
    /// Scheme label placed before the token in `Authorization`.
    pub token_type: String,
    /// Where the session keys are persisted between invocations.
    pub storage_path: PathBuf,
    /// Mount point of the console; redirect targets are built under it.
    pub base_path: String,
    pub request_timeout_secs: u64,
    /// Replays a request once after refreshing the token on 401.
    pub refresh_on_unauthorized: bool,
    pub page_size: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            token_type: DEFAULT_TOKEN_TYPE.to_owned(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            base_path: DEFAULT_BASE_PATH.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            refresh_on_unauthorized: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ConsoleConfig {
    /// Build typed console config from environment variables.
    ///
    /// Optional:
    /// - `PETADMIN_API_BASE_URL`: default `http://127.0.0.1:8080`
    /// - `PETADMIN_TOKEN_TYPE`: default `Bearer`
    /// - `PETADMIN_STORAGE_PATH`: default `$HOME/.petadmin/session.json`
    /// - `PETADMIN_BASE_PATH`: default `/admin`
    /// - `PETADMIN_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PETADMIN_REFRESH_ON_401`: default off
    /// - `PETADMIN_PAGE_SIZE`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric or boolean
    /// variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConsoleConfig::from_env`] over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ConsoleConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let api_base_url = non_empty("PETADMIN_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let token_type = non_empty("PETADMIN_TOKEN_TYPE").unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned());
        let storage_path = match non_empty("PETADMIN_STORAGE_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_storage_path(non_empty("HOME").as_deref()),
        };
        let base_path = normalize_base_path(&non_empty("PETADMIN_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_owned()));

        let request_timeout_secs = parse_or(
            "PETADMIN_REQUEST_TIMEOUT_SECS",
            non_empty("PETADMIN_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let page_size = parse_or("PETADMIN_PAGE_SIZE", non_empty("PETADMIN_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue { var: "PETADMIN_PAGE_SIZE", value: "0".to_owned() });
        }
        let refresh_on_unauthorized = match non_empty("PETADMIN_REFRESH_ON_401") {
            None => false,
            Some(raw) => parse_bool(&raw)
                .ok_or(ConfigError::InvalidValue { var: "PETADMIN_REFRESH_ON_401", value: raw })?,
        };

        Ok(Self {
            api_base_url,
            token_type,
            storage_path,
            base_path,
            request_timeout_secs,
            refresh_on_unauthorized,
            page_size,
        })
    }

    /// Absolute console path for `route`, e.g. `/admin/dashboard`.
    #[must_use]
    pub fn route(&self, route: &str) -> String {
        let route = route.trim_start_matches('/');
        if self.base_path == "/" {
            format!("/{route}")
        } else {
            format!("{}/{route}", self.base_path)
        }
    }
}

fn parse_or<T: std::str::FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_storage_path(home: Option<&str>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(DEFAULT_STORAGE_FILE),
        None => PathBuf::from(DEFAULT_STORAGE_FILE),
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() { "/".to_owned() } else { format!("/{trimmed}") }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
