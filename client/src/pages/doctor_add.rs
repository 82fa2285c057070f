//! "Add doctor" wizard: account, then licence, then practice details.

#[cfg(test)]
#[path = "doctor_add_test.rs"]
mod doctor_add_test;

use serde_json::{Value, json};

use super::ViewError;
use super::wizard::{Wizard, WizardForm};
use crate::net::api::ApiClient;
use crate::util::validation::{
    FieldErrors, email, fee, iso_date, optional, password, phone, required, whole_years,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoctorStep {
    Account,
    Licence,
    Practice,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctorForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub license_number: String,
    pub license_expiry: String,
    pub qualification: String,
    pub specialization: String,
    pub experience_years: String,
    pub consultation_fee: String,
    pub clinic_name: String,
    pub clinic_address: String,
}

impl WizardForm for DoctorForm {
    type Step = DoctorStep;

    const STEPS: &'static [DoctorStep] = &[DoctorStep::Account, DoctorStep::Licence, DoctorStep::Practice];

    fn validate_step(&self, step: DoctorStep) -> FieldErrors {
        let mut errors = FieldErrors::default();
        match step {
            DoctorStep::Account => {
                errors.check("firstName", required(&self.first_name));
                errors.check("lastName", required(&self.last_name));
                errors.check("email", required(&self.email));
                errors.check("email", email(&self.email));
                errors.check("phone", required(&self.phone));
                errors.check("phone", phone(&self.phone));
                errors.check("password", password(&self.password));
            }
            DoctorStep::Licence => {
                errors.check("licenseNumber", required(&self.license_number));
                errors.check("licenseExpiry", required(&self.license_expiry));
                errors.check("licenseExpiry", iso_date(&self.license_expiry));
                errors.check("specialization", required(&self.specialization));
            }
            DoctorStep::Practice => {
                errors.check("experienceYears", optional(&self.experience_years, whole_years));
                errors.check("consultationFee", required(&self.consultation_fee));
                errors.check("consultationFee", fee(&self.consultation_fee));
                errors.check("clinicName", required(&self.clinic_name));
            }
        }
        errors
    }

    fn body(&self) -> Value {
        json!({
            "user": {
                "firstName": self.first_name.trim(),
                "lastName": self.last_name.trim(),
                "email": self.email.trim(),
                "phone": self.phone.trim(),
                "password": self.password,
            },
            "licenseNumber": self.license_number.trim(),
            "licenseExpiry": self.license_expiry.trim(),
            "qualification": non_blank(&self.qualification),
            "specialization": self.specialization.trim(),
            "experienceYears": self.experience_years.trim().parse::<u32>().ok(),
            "consultationFee": self.consultation_fee.trim().parse::<f64>().ok(),
            "clinicName": self.clinic_name.trim(),
            "clinicAddress": non_blank(&self.clinic_address),
        })
    }
}

pub(crate) fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

pub type DoctorAddPage = Wizard<DoctorForm>;

impl Wizard<DoctorForm> {
    /// Validate every step and create the doctor.
    ///
    /// # Errors
    ///
    /// [`ViewError::Invalid`] before any request, [`ViewError::Busy`] or
    /// [`ViewError::Failed`] from the backend.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<Value, ViewError> {
        let body = self.begin_submit()?;
        let result = api.create_doctor(&body).await;
        let created = self.finish_submit(result)?;
        let doctor_id = created.get("doctorId").cloned().unwrap_or_default();
        tracing::info!(doctor = %doctor_id, "doctor created");
        Ok(created)
    }
}
