//! Session and per-view state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` persists the session keys, `auth` owns the session lifecycle,
//! `list` filters/sorts/pages fetched collections, and `approval` gates
//! approve/reject actions.

pub mod approval;
pub mod auth;
pub mod list;
pub mod storage;
