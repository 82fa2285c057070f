//! Login page: email + password form submitted through the session.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use super::ViewError;
use crate::state::auth::{Redirect, Session};
use crate::util::validation::{FieldErrors, email, required};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check("email", required(&self.email));
        errors.check("email", email(&self.email));
        errors.check("password", required(&self.password));
        errors
    }
}

#[derive(Debug, Default)]
pub struct LoginPage {
    pub form: LoginForm,
    /// `returnUrl` the guard sent the operator here with.
    pub return_to: Option<String>,
    pub busy: bool,
    pub errors: FieldErrors,
    /// Backend message of the last failed attempt.
    pub error: Option<String>,
}

impl LoginPage {
    #[must_use]
    pub fn new(return_to: Option<&str>) -> Self {
        Self { return_to: super::route_param(return_to), ..Self::default() }
    }

    /// Submit the form. The password is cleared after a failed attempt.
    ///
    /// # Errors
    ///
    /// [`ViewError::Busy`] during another attempt, [`ViewError::Invalid`]
    /// before any request, [`ViewError::Failed`] with the backend message.
    pub async fn submit(&mut self, session: &mut Session) -> Result<Redirect, ViewError> {
        if self.busy {
            return Err(ViewError::Busy { running: "login" });
        }
        self.errors = self.form.validate();
        if !self.errors.is_empty() {
            return Err(ViewError::Invalid(self.errors.clone()));
        }

        self.busy = true;
        self.error = None;
        let result = session.login(&self.form.email, &self.form.password, self.return_to.as_deref()).await;
        self.busy = false;

        result.map_err(|error| {
            let message = error.display_message();
            self.error = Some(message.clone());
            self.form.password.clear();
            ViewError::Failed(message)
        })
    }
}
