//! Page view models for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns the state of one visit (fetched records, query, in-flight
//! flags, last error) and exposes async operations that call `ApiClient`.
//! Rendering is left to the front end, which reads [`Rendered`] values.

pub mod detail;
pub mod doctor_add;
pub mod doctors;
pub mod kyc;
pub mod login;
pub mod reports;
pub mod user_add;
pub mod users;
pub mod wizard;

use crate::state::list::ListError;
use crate::util::validation::FieldErrors;

/// What a page shows right now.
#[derive(Debug, PartialEq)]
pub enum Rendered<T> {
    /// Placeholder while route params or data are not available yet.
    Loading,
    Error(String),
    Ready(T),
}

impl<T> Rendered<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    #[error("please wait: {running} is still in progress")]
    Busy { running: &'static str },
    #[error("nothing is loaded yet")]
    NotLoaded,
    #[error("{0}")]
    Failed(String),
    #[error("please fix: {0}")]
    Invalid(FieldErrors),
    #[error(transparent)]
    List(#[from] ListError),
}

/// A route parameter that is actually present.
#[must_use]
pub fn route_param(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|value| !value.is_empty()).map(ToOwned::to_owned)
}
