//! Networking modules for the marketplace REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `endpoints` names every backend call, `api` issues them with the stored
//! token, `error` reduces failures to display strings, and `types` defines
//! the DTOs the backend sends.

pub mod api;
pub mod endpoints;
pub mod error;
pub mod types;
