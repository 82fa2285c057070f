//! Shared helpers used by page view models.

pub mod validation;
