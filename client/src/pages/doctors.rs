//! Doctor directory and doctor profile pages.

#[cfg(test)]
#[path = "doctors_test.rs"]
mod doctors_test;

use serde_json::{Map, Value, json};

use super::ViewError;
use super::detail::DetailState;
use super::doctor_add::non_blank;
use crate::net::api::ApiClient;
use crate::net::types::{Doctor, ReviewStatus};
use crate::state::approval::Decision;
use crate::state::list::{ListState, Listable, SortKey};
use crate::util::validation::{FieldErrors, fee, iso_date, optional, required, whole_years};

impl Listable for Doctor {
    const SORT_COLUMNS: &'static [&'static str] = &["id", "name", "email", "specialization", "fee", "status"];

    fn search_text(&self) -> String {
        [
            Some(self.display_name()),
            self.email().map(ToOwned::to_owned),
            self.specialization.clone(),
            self.license_number.clone(),
            self.clinic_name.clone(),
        ]
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
            "id" => Some(id_key(&self.doctor_id)),
            "name" => Some(SortKey::Text(self.display_name())),
            "email" => self.email().map(|email| SortKey::Text(email.to_owned())),
            "specialization" => self.specialization.clone().map(SortKey::Text),
            "fee" => self.consultation_fee.map(SortKey::Number),
            "status" => Some(SortKey::Text(self.status.as_str().to_owned())),
            _ => None,
        }
    }
}

/// Numeric ids sort numerically, anything else as text.
pub(crate) fn id_key(id: &str) -> SortKey {
    id.parse::<f64>().map_or_else(|_| SortKey::Text(id.to_owned()), SortKey::Number)
}

#[derive(Debug, Default)]
pub struct DoctorListPage {
    pub list: ListState<Doctor>,
}

impl DoctorListPage {
    pub async fn load(&mut self, api: &ApiClient) {
        self.list.begin_load();
        let result = api.list_doctors().await;
        self.list.finish_load(result);
    }
}

/// Profile fields an admin may edit. `None` leaves a field alone; a blank
/// value clears an optional field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctorChanges {
    pub license_number: Option<String>,
    pub license_expiry: Option<String>,
    pub qualification: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<String>,
    pub consultation_fee: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
}

impl DoctorChanges {
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if *self == Self::default() {
            errors.check("changes", Err("Nothing to update."));
        }
        if let Some(value) = &self.license_number {
            errors.check("licenseNumber", required(value));
        }
        if let Some(value) = &self.license_expiry {
            errors.check("licenseExpiry", required(value));
            errors.check("licenseExpiry", iso_date(value));
        }
        if let Some(value) = &self.specialization {
            errors.check("specialization", required(value));
        }
        if let Some(value) = &self.experience_years {
            errors.check("experienceYears", optional(value, whole_years));
        }
        if let Some(value) = &self.consultation_fee {
            errors.check("consultationFee", required(value));
            errors.check("consultationFee", fee(value));
        }
        if let Some(value) = &self.clinic_name {
            errors.check("clinicName", required(value));
        }
        errors
    }

    /// Only the fields that were set, under their wire names.
    #[must_use]
    pub fn body(&self) -> Map<String, Value> {
        let text = |value: &Option<String>| value.as_deref().map(|v| json!(v.trim()));
        let clearable = |value: &Option<String>| value.as_deref().map(|v| json!(non_blank(v)));
        [
            ("licenseNumber", text(&self.license_number)),
            ("licenseExpiry", text(&self.license_expiry)),
            ("qualification", clearable(&self.qualification)),
            ("specialization", text(&self.specialization)),
            ("experienceYears", self.experience_years.as_deref().map(|v| json!(v.trim().parse::<u32>().ok()))),
            ("consultationFee", self.consultation_fee.as_deref().map(|v| json!(v.trim().parse::<f64>().ok()))),
            ("clinicName", text(&self.clinic_name)),
            ("clinicAddress", clearable(&self.clinic_address)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_owned(), value)))
        .collect()
    }
}

#[derive(Debug)]
pub struct DoctorProfilePage {
    pub detail: DetailState<Doctor>,
}

impl DoctorProfilePage {
    #[must_use]
    pub fn new(doctor_id: Option<&str>) -> Self {
        Self { detail: DetailState::from_route(doctor_id) }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        let Some(doctor_id) = self.detail.begin_load() else {
            return;
        };
        let result = api.get_doctor(&doctor_id).await;
        self.detail.finish_load(result);
    }

    /// Approve or reject the loaded doctor.
    ///
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
        let result = api.update_doctor_status(&pending.record_id, &pending.update).await;
        self.detail.finish_review(pending, result)
    }

    /// Save profile edits for the loaded doctor.
    ///
    /// # Errors
    ///
    /// [`ViewError::Invalid`] before any request, then see
    /// [`DetailState::begin_edit`] and [`DetailState::finish_edit`].
    pub async fn update(&mut self, api: &ApiClient, changes: &DoctorChanges) -> Result<(), ViewError> {
        let errors = changes.validate();
        if !errors.is_empty() {
            return Err(ViewError::Invalid(errors));
        }
        let pending = self.detail.begin_edit(changes.body())?;
        let body = Value::Object(pending.changes.clone());
        let result = api.update_doctor(&pending.record_id, &body).await;
        self.detail.finish_edit(pending, result)
    }
}
