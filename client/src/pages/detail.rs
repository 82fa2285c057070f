//! Shared state for single-record pages with approve/reject actions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Doctor profiles and KYC detail pages both fetch one record by route id,
//! show it, and push a status change through an [`ActionGate`]. A missing
//! route id keeps the page on its loading placeholder and nothing is fetched.
//! Profile edits share the same gate, so an edit and a review never overlap.

#[cfg(test)]
#[path = "detail_test.rs"]
mod detail_test;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{Rendered, ViewError, route_param};
use crate::net::error::ApiError;
use crate::net::types::{Doctor, KycRecord, ReviewStatus, StatusUpdate};
use crate::state::approval::{ActionGate, ActionTicket, Decision, merged_status};

/// A record whose review status can be patched locally.
pub trait Reviewable {
    fn review_status(&self) -> ReviewStatus;
    fn apply_review(&mut self, status: ReviewStatus, reason: Option<String>);
}

impl Reviewable for Doctor {
    fn review_status(&self) -> ReviewStatus {
        self.status
    }

    fn apply_review(&mut self, status: ReviewStatus, reason: Option<String>) {
        self.status = status;
        self.rejection_reason = if status == ReviewStatus::Rejected { reason } else { None };
    }
}

impl Reviewable for KycRecord {
    fn review_status(&self) -> ReviewStatus {
        self.status
    }

    fn apply_review(&mut self, status: ReviewStatus, reason: Option<String>) {
        self.status = status;
        self.rejection_reason = if status == ReviewStatus::Rejected { reason } else { None };
    }
}

#[derive(Debug)]
pub struct DetailState<T> {
    route_id: Option<String>,
    pub record: Option<T>,
    pub loading: bool,
    pub load_error: Option<String>,
    pub gate: ActionGate,
}

/// A started review action, handed back to [`DetailState::finish_review`].
#[derive(Debug)]
pub struct PendingReview {
    ticket: ActionTicket,
    pub decision: Decision,
    pub record_id: String,
    pub update: StatusUpdate,
}

/// A started profile edit, handed back to [`DetailState::finish_edit`].
#[derive(Debug)]
pub struct PendingEdit {
    ticket: ActionTicket,
    pub record_id: String,
    pub changes: Map<String, Value>,
}

impl<T> DetailState<T> {
    #[must_use]
    pub fn from_route(param: Option<&str>) -> Self {
        Self {
            route_id: route_param(param),
            record: None,
            loading: false,
            load_error: None,
            gate: ActionGate::default(),
        }
    }

    /// Mark a fetch as started. Returns the id to fetch, or `None` when the
    /// route has no id.
    pub fn begin_load(&mut self) -> Option<String> {
        let id = self.route_id.clone()?;
        self.loading = true;
        self.load_error = None;
        Some(id)
    }

    pub fn finish_load(&mut self, result: Result<T, ApiError>) {
        self.loading = false;
        match result {
            Ok(record) => self.record = Some(record),
            Err(error) => {
                tracing::warn!(error = %error, "detail fetch failed");
                self.load_error = Some(error.display_message());
            }
        }
    }

    /// Route id of the held record.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotLoaded`] until a record has been fetched.
    pub fn loaded_id(&self) -> Result<String, ViewError> {
        match (&self.record, &self.route_id) {
            (Some(_), Some(id)) => Ok(id.clone()),
            _ => Err(ViewError::NotLoaded),
        }
    }

    #[must_use]
    pub fn render(&self) -> Rendered<&T> {
        if self.route_id.is_none() || self.loading {
            return Rendered::Loading;
        }
        if let Some(error) = &self.load_error {
            return Rendered::Error(error.clone());
        }
        match &self.record {
            Some(record) => Rendered::Ready(record),
            None => Rendered::Loading,
        }
    }
}

impl<T: Reviewable> DetailState<T> {
    /// True when Approve/Reject should be enabled.
    #[must_use]
    pub fn can_review(&self) -> bool {
        self.record.is_some() && !self.gate.is_busy()
    }

    /// Start a review; the controls stay disabled until it is finished.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotLoaded`] before the record is loaded,
    /// [`ViewError::Busy`] while another action runs.
    pub fn begin_review(&mut self, decision: Decision, reason: Option<String>) -> Result<PendingReview, ViewError> {
        let record_id = self.loaded_id()?;
        let ticket = self.gate.begin(decision.verb())?;
        let reason = reason.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        let reason = if decision == Decision::Reject { reason } else { None };
        let update = StatusUpdate { status: decision.target(), reason };
        Ok(PendingReview { ticket, decision, record_id, update })
    }

    /// Settle a review and merge the new status into the held record.
    ///
    /// # Errors
    ///
    /// [`ViewError::Failed`] with the display message; the record is left
    /// unchanged.
    pub fn finish_review(
        &mut self,
        pending: PendingReview,
        result: Result<Value, ApiError>,
    ) -> Result<ReviewStatus, ViewError> {
        let PendingReview { ticket, decision, update, .. } = pending;
        let body = self.gate.finish(ticket, result)?;
        let status = merged_status(&body, decision.target());
        if let Some(record) = self.record.as_mut() {
            record.apply_review(status, update.reason);
        }
        tracing::info!(status = %status, "review recorded");
        Ok(status)
    }
}

impl<T: Serialize + DeserializeOwned> DetailState<T> {
    /// Start an edit carrying `changes` as wire-named fields.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotLoaded`] or [`ViewError::Busy`].
    pub fn begin_edit(&mut self, changes: Map<String, Value>) -> Result<PendingEdit, ViewError> {
        let record_id = self.loaded_id()?;
        let ticket = self.gate.begin("edit")?;
        Ok(PendingEdit { ticket, record_id, changes })
    }

    /// Settle an edit. The held record takes the sent changes first, then
    /// any fields the backend echoed.
    ///
    /// # Errors
    ///
    /// [`ViewError::Failed`] with the display message; the record is left
    /// unchanged.
    pub fn finish_edit(&mut self, pending: PendingEdit, result: Result<Value, ApiError>) -> Result<(), ViewError> {
        let PendingEdit { ticket, record_id, changes } = pending;
        let echoed = self.gate.finish(ticket, result)?;
        if let Some(record) = self.record.as_mut() {
            match patched(record, changes, echoed) {
                Ok(updated) => *record = updated,
                Err(error) => tracing::warn!(record = %record_id, error = %error, "saved edit not merged locally"),
            }
        }
        tracing::info!(record = %record_id, "record updated");
        Ok(())
    }
}

fn patched<T>(record: &T, changes: Map<String, Value>, echoed: Value) -> serde_json::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(changes);
        if let Value::Object(echoed) = echoed {
            fields.extend(echoed);
        }
    }
    serde_json::from_value(merged)
}
