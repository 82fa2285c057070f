//! Headless admin console for the pet-services marketplace.
//!
//! SYSTEM CONTEXT
//! ==============
//! `net` talks to the remote REST backend, `state` holds the session and
//! per-view state, `pages` turns both into renderable view models, and
//! `util` carries client-side validation. The `cli` crate is the terminal
//! front end that drives these pages.

pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ConsoleConfig;
pub use net::api::ApiClient;
pub use net::error::ApiError;
pub use state::auth::Session;
pub use state::storage::{FileStorage, MemoryStorage, Storage};
