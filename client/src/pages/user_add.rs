//! "Add user" wizard: identity, contact details, then role.

#[cfg(test)]
#[path = "user_add_test.rs"]
mod user_add_test;

use serde_json::{Value, json};

use super::ViewError;
use super::wizard::{Wizard, WizardForm};
use crate::net::api::ApiClient;
use crate::util::validation::{FieldErrors, email, optional, password, phone, required};

/// Roles an admin may assign from the console.
pub const ROLES: [&str; 7] = ["ADMIN", "STAFF", "METAVET", "GROOMER", "WALKER", "BEHAVIOURIST", "CLIENT"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserStep {
    Identity,
    Contact,
    Access,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub password: String,
    pub enabled: bool,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            role: "CLIENT".to_owned(),
            password: String::new(),
            enabled: true,
        }
    }
}

pub(crate) fn known_role(value: &str) -> Result<(), &'static str> {
    let value = value.trim();
    if ROLES.iter().any(|role| role.eq_ignore_ascii_case(value)) { Ok(()) } else { Err("Choose a valid role.") }
}

impl WizardForm for UserForm {
    type Step = UserStep;

    const STEPS: &'static [UserStep] = &[UserStep::Identity, UserStep::Contact, UserStep::Access];

    fn validate_step(&self, step: UserStep) -> FieldErrors {
        let mut errors = FieldErrors::default();
        match step {
            UserStep::Identity => {
                errors.check("firstName", required(&self.first_name));
                errors.check("lastName", required(&self.last_name));
            }
            UserStep::Contact => {
                errors.check("email", required(&self.email));
                errors.check("email", email(&self.email));
                errors.check("phone", optional(&self.phone, phone));
            }
            UserStep::Access => {
                errors.check("role", known_role(&self.role));
                errors.check("password", password(&self.password));
            }
        }
        errors
    }

    fn body(&self) -> Value {
        let phone = Some(self.phone.trim()).filter(|phone| !phone.is_empty());
        json!({
            "firstName": self.first_name.trim(),
            "lastName": self.last_name.trim(),
            "email": self.email.trim(),
            "phone": phone,
            "role": self.role.trim().to_ascii_uppercase(),
            "password": self.password,
            "enabled": self.enabled,
        })
    }
}

pub type UserAddPage = Wizard<UserForm>;

impl Wizard<UserForm> {
    /// Validate every step and create the account.
    ///
    /// # Errors
    ///
    /// See [`Wizard::begin_submit`] and [`Wizard::finish_submit`].
    pub async fn submit(&mut self, api: &ApiClient) -> Result<Value, ViewError> {
        let body = self.begin_submit()?;
        let result = api.create_user(&body).await;
        self.finish_submit(result)
    }
}
