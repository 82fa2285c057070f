//! Multi-step form state shared by the "add doctor" and "add user" pages.
//!
//! `next` validates only the current step, `back` never validates, and
//! submitting re-validates every step before the body is built.

#[cfg(test)]
#[path = "wizard_test.rs"]
mod wizard_test;

use std::fmt::Debug;

use serde_json::Value;

use super::ViewError;
use crate::net::error::ApiError;
use crate::util::validation::FieldErrors;

/// A form split into ordered steps.
pub trait WizardForm {
    type Step: Copy + Debug + PartialEq + 'static;

    const STEPS: &'static [Self::Step];

    fn validate_step(&self, step: Self::Step) -> FieldErrors;

    /// Request body posted on submit.
    fn body(&self) -> Value;
}

#[derive(Debug, Clone)]
pub struct Wizard<F> {
    pub form: F,
    step_index: usize,
    pub errors: FieldErrors,
    pub submitting: bool,
    /// Display string of the last failed submit.
    pub error: Option<String>,
    /// Backend response of a successful submit.
    pub created: Option<Value>,
}

impl<F: WizardForm> Wizard<F> {
    #[must_use]
    pub fn new(form: F) -> Self {
        Self {
            form,
            step_index: 0,
            errors: FieldErrors::default(),
            submitting: false,
            error: None,
            created: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> F::Step {
        F::STEPS[self.step_index]
    }

    /// 1-based position for "Step 2 of 3" labels.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.step_index + 1, F::STEPS.len())
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 == F::STEPS.len()
    }

    /// Advance when the current step is valid.
    ///
    /// # Errors
    ///
    /// [`ViewError::Invalid`] with the current step's field errors.
    pub fn next(&mut self) -> Result<F::Step, ViewError> {
        self.errors = self.form.validate_step(self.step());
        if !self.errors.is_empty() {
            return Err(ViewError::Invalid(self.errors.clone()));
        }
        if !self.is_last_step() {
            self.step_index += 1;
        }
        Ok(self.step())
    }

    pub fn back(&mut self) -> F::Step {
        self.errors = FieldErrors::default();
        self.step_index = self.step_index.saturating_sub(1);
        self.step()
    }

    /// Validate every step; on failure jump to the first bad step.
    ///
    /// # Errors
    ///
    /// [`ViewError::Invalid`] with that step's field errors.
    pub fn validate_all(&mut self) -> Result<(), ViewError> {
        for (index, step) in F::STEPS.iter().enumerate() {
            let errors = self.form.validate_step(*step);
            if !errors.is_empty() {
                self.step_index = index;
                self.errors = errors.clone();
                return Err(ViewError::Invalid(errors));
            }
        }
        self.errors = FieldErrors::default();
        Ok(())
    }

    /// Validate and mark the submit as in flight. Returns the body to post.
    ///
    /// # Errors
    ///
    /// [`ViewError::Busy`] while a submit is running, or
    /// [`ViewError::Invalid`].
    pub fn begin_submit(&mut self) -> Result<Value, ViewError> {
        if self.submitting {
            return Err(ViewError::Busy { running: "submit" });
        }
        self.validate_all()?;
        self.submitting = true;
        self.error = None;
        Ok(self.form.body())
    }

    /// # Errors
    ///
    /// [`ViewError::Failed`] with the display message.
    pub fn finish_submit(&mut self, result: Result<Value, ApiError>) -> Result<Value, ViewError> {
        self.submitting = false;
        match result {
            Ok(created) => {
                self.created = Some(created.clone());
                Ok(created)
            }
            Err(error) => {
                let message = error.display_message();
                tracing::warn!(error = %error, "form submit failed");
                self.error = Some(message.clone());
                Err(ViewError::Failed(message))
            }
        }
    }
}
