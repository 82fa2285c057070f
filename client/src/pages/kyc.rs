//! KYC review pages, one pair (list + detail) per [`KycKind`].
//!
//! The six variants share the same record shape and endpoints; only the
//! reviewer/subject segments of the URL differ, so a single page type carries
//! the kind it was opened for.

#[cfg(test)]
#[path = "kyc_test.rs"]
mod kyc_test;

use serde_json::Value;

use super::ViewError;
use super::detail::DetailState;
use super::doctors::id_key;
use crate::net::api::ApiClient;
use crate::net::types::{Document, KycKind, KycRecord, ReviewStatus};
use crate::state::approval::{ActionGate, Decision};
use crate::state::list::{ListState, Listable, SortKey};

impl Listable for KycRecord {
    const SORT_COLUMNS: &'static [&'static str] = &["id", "name", "email", "status", "submitted"];

    fn search_text(&self) -> String {
        [Some(self.display_name()), self.email.clone(), self.phone.clone(), self.uid.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn status_label(&self) -> Option<String> {
        Some(self.status.as_str().to_owned())
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "id" => Some(id_key(&self.id)),
            "name" => Some(SortKey::Text(self.display_name())),
            "email" => self.email.clone().map(SortKey::Text),
            "status" => Some(SortKey::Text(self.status.as_str().to_owned())),
            "submitted" => self.submitted_at.clone().map(SortKey::Text),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct KycListPage {
    pub kind: KycKind,
    pub list: ListState<KycRecord>,
}

impl KycListPage {
    #[must_use]
    pub fn new(kind: KycKind) -> Self {
        Self { kind, list: ListState::default() }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        self.list.begin_load();
        let result = api.list_kyc(self.kind).await;
        self.list.finish_load(result);
    }
}

#[derive(Debug)]
pub struct KycDetailPage {
    pub kind: KycKind,
    pub detail: DetailState<KycRecord>,
    /// Separate from the review gate so a download never blocks approve/reject.
    pub downloads: ActionGate,
}

impl KycDetailPage {
    #[must_use]
    pub fn new(kind: KycKind, kyc_id: Option<&str>) -> Self {
        Self { kind, detail: DetailState::from_route(kyc_id), downloads: ActionGate::default() }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        let Some(kyc_id) = self.detail.begin_load() else {
            return;
        };
        let result = api.get_kyc(self.kind, &kyc_id).await;
        self.detail.finish_load(result);
    }

    /// Form sections the backend sent beyond the typed fields, in key order.
    #[must_use]
    pub fn extra_fields(&self) -> Vec<(&str, &Value)> {
        let Some(record) = &self.detail.record else {
            return Vec::new();
        };
        let mut fields: Vec<_> = record.extra.iter().map(|(key, value)| (key.as_str(), value)).collect();
        fields.sort_by_key(|(key, _)| *key);
        fields
    }

    /// # Errors
    ///
    /// See [`DetailState::begin_review`] and [`DetailState::finish_review`].
    pub async fn decide(
        &mut self,
        api: &ApiClient,
        decision: Decision,
        reason: Option<String>,
    ) -> Result<ReviewStatus, ViewError> {
        let pending = self.detail.begin_review(decision, reason)?;
        let result = api.update_kyc_status(self.kind, &pending.record_id, &pending.update).await;
        self.detail.finish_review(pending, result)
    }

    /// Fetch one uploaded document of the loaded submission.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotLoaded`] when the record or its `uid` is missing,
    /// [`ViewError::Busy`] during another download, or
    /// [`ViewError::Failed`].
    pub async fn download_document(&mut self, api: &ApiClient, doc_type: &str) -> Result<Document, ViewError> {
        let uid = self.detail.record.as_ref().and_then(|record| record.uid.clone()).ok_or(ViewError::NotLoaded)?;
        let ticket = self.downloads.begin("download")?;
        let result = api.fetch_document(&uid, doc_type).await;
        let document = self.downloads.finish(ticket, result)?;
        tracing::debug!(doc_type, bytes = document.bytes.len(), "document downloaded");
        Ok(document)
    }
}
