//! In-flight gating and optimistic status merge for approve/reject actions.
//!
//! DESIGN
//! ======
//! A detail view owns one [`ActionGate`]. Starting an action takes a ticket;
//! while a ticket is out every other action is refused, which is how the
//! Approve/Reject controls stay disabled until the backend answers.

#[cfg(test)]
#[path = "approval_test.rs"]
mod approval_test;

use serde_json::Value;

use crate::net::error::ApiError;
use crate::net::types::ReviewStatus;
use crate::pages::ViewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    #[must_use]
    pub fn target(self) -> ReviewStatus {
        match self {
            Self::Approve => ReviewStatus::Approved,
            Self::Reject => ReviewStatus::Rejected,
        }
    }

    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Proof that an action was started; hand it back to [`ActionGate::finish`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct ActionTicket {
    action: &'static str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionGate {
    pending: Option<&'static str>,
    /// Display string of the last failed action.
    pub error: Option<String>,
}

impl ActionGate {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&'static str> {
        self.pending
    }

    /// Start `action`, or refuse with [`ViewError::Busy`].
    ///
    /// # Errors
    ///
    /// [`ViewError::Busy`] while another action is in flight.
    pub fn begin(&mut self, action: &'static str) -> Result<ActionTicket, ViewError> {
        if let Some(running) = self.pending {
            return Err(ViewError::Busy { running });
        }
        self.pending = Some(action);
        self.error = None;
        Ok(ActionTicket { action })
    }

    /// Settle the action: re-enable controls and record any failure.
    pub fn finish<T>(&mut self, ticket: ActionTicket, result: Result<T, ApiError>) -> Result<T, ViewError> {
        debug_assert_eq!(self.pending, Some(ticket.action));
        self.pending = None;
        result.map_err(|error| {
            let message = error.display_message();
            tracing::warn!(action = ticket.action, error = %error, "action failed");
            self.error = Some(message.clone());
            ViewError::Failed(message)
        })
    }
}

/// Status to show after a successful update: whatever the backend echoed,
/// or the requested status when the body carries none. An echoed status the
/// console does not know reads as [`ReviewStatus::Unknown`], the same as in a
/// fetched record.
#[must_use]
pub fn merged_status(response: &Value, target: ReviewStatus) -> ReviewStatus {
    response
        .get("status")
        .and_then(Value::as_str)
        .map_or(target, |raw| raw.parse().unwrap_or(ReviewStatus::Unknown))
}
