//! User directory and user profile pages.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use serde_json::{Map, Value, json};

use super::ViewError;
use super::detail::DetailState;
use super::doctor_add::non_blank;
use super::doctors::id_key;
use super::user_add::known_role;
use crate::net::api::ApiClient;
use crate::net::types::User;
use crate::state::list::{ListState, Listable, SortKey};
use crate::util::validation::{FieldErrors, email, optional, phone, required};

pub const ENABLED: &str = "ENABLED";
pub const DISABLED: &str = "DISABLED";

#[must_use]
pub fn account_status(user: &User) -> &'static str {
    if user.enabled { ENABLED } else { DISABLED }
}

impl Listable for User {
    const SORT_COLUMNS: &'static [&'static str] = &["id", "name", "email", "role", "status", "created"];

    fn search_text(&self) -> String {
        [Some(self.display_name()), self.email.clone(), self.phone.clone(), self.role().map(ToOwned::to_owned)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn status_label(&self) -> Option<String> {
        Some(account_status(self).to_owned())
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "id" => Some(id_key(&self.id)),
            "name" => Some(SortKey::Text(self.display_name())),
            "email" => self.email.clone().map(SortKey::Text),
            "role" => self.role().map(|role| SortKey::Text(role.to_owned())),
            "status" => Some(SortKey::Text(account_status(self).to_owned())),
            "created" => self.created_at.clone().map(SortKey::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct UserListPage {
    pub list: ListState<User>,
}

impl UserListPage {
    pub async fn load(&mut self, api: &ApiClient) {
        self.list.begin_load();
        let result = api.list_users().await;
        self.list.finish_load(result);
    }
}

/// Account fields an admin may edit. `None` leaves a field alone; a blank
/// phone clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

impl UserChanges {
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if *self == Self::default() {
            errors.check("changes", Err("Nothing to update."));
        }
        if let Some(value) = &self.first_name {
            errors.check("firstName", required(value));
        }
        if let Some(value) = &self.last_name {
            errors.check("lastName", required(value));
        }
        if let Some(value) = &self.email {
            errors.check("email", required(value));
            errors.check("email", email(value));
        }
        if let Some(value) = &self.phone {
            errors.check("phone", optional(value, phone));
        }
        if let Some(value) = &self.role {
            errors.check("role", known_role(value));
        }
        errors
    }

    #[must_use]
    pub fn body(&self) -> Map<String, Value> {
        let text = |value: &Option<String>| value.as_deref().map(|v| json!(v.trim()));
        [
            ("firstName", text(&self.first_name)),
            ("lastName", text(&self.last_name)),
            ("email", text(&self.email)),
            ("phone", self.phone.as_deref().map(|v| json!(non_blank(v)))),
            ("role", self.role.as_deref().map(|v| json!(v.trim().to_ascii_uppercase()))),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_owned(), value)))
        .collect()
    }
}

#[derive(Debug)]
pub struct UserProfilePage {
    pub detail: DetailState<User>,
}

impl UserProfilePage {
    #[must_use]
    pub fn new(user_id: Option<&str>) -> Self {
        Self { detail: DetailState::from_route(user_id) }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        let Some(user_id) = self.detail.begin_load() else {
            return;
        };
        let result = api.get_user(&user_id).await;
        self.detail.finish_load(result);
    }

    /// Enable or disable the account; the local copy follows the backend's
    /// echoed `enabled`, or the requested value when none is echoed.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotLoaded`], [`ViewError::Busy`] or [`ViewError::Failed`].
    pub async fn set_enabled(&mut self, api: &ApiClient, enabled: bool) -> Result<bool, ViewError> {
        let user_id = self.detail.loaded_id()?;
        let ticket = self.detail.gate.begin(if enabled { "enable" } else { "disable" })?;
        let result = api.set_user_enabled(&user_id, enabled).await;
        let body = self.detail.gate.finish(ticket, result)?;
        let now = body.get("enabled").and_then(Value::as_bool).unwrap_or(enabled);
        if let Some(user) = self.detail.record.as_mut() {
            user.enabled = now;
        }
        tracing::info!(user = %user_id, enabled = now, "account status changed");
        Ok(now)
    }

    /// Save account edits for the loaded user.
    ///
    /// # Errors
    ///
    /// [`ViewError::Invalid`] before any request, then
    /// [`ViewError::NotLoaded`], [`ViewError::Busy`] or [`ViewError::Failed`].
    pub async fn update(&mut self, api: &ApiClient, changes: &UserChanges) -> Result<(), ViewError> {
        let errors = changes.validate();
        if !errors.is_empty() {
            return Err(ViewError::Invalid(errors));
        }
        let pending = self.detail.begin_edit(changes.body())?;
        let body = Value::Object(pending.changes.clone());
        let result = api.update_user(&pending.record_id, &body).await;
        self.detail.finish_edit(pending, result)
    }
}
