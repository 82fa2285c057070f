//! Summary report computed from the full doctor, KYC and user lists.
//!
//! Each section is fetched on its own; a failing section keeps its error
//! message and the others still render.

#[cfg(test)]
#[path = "reports_test.rs"]
mod reports_test;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{KycKind, ReviewStatus};

/// Rows per review status, always listing the known statuses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub by_status: BTreeMap<ReviewStatus, usize>,
}

impl StatusCounts {
    #[must_use]
    pub fn tally(statuses: impl IntoIterator<Item = ReviewStatus>) -> Self {
        let mut by_status: BTreeMap<_, _> = ReviewStatus::KNOWN.into_iter().map(|status| (status, 0)).collect();
        let mut total = 0;
        for status in statuses {
            *by_status.entry(status).or_insert(0) += 1;
            total += 1;
        }
        Self { total, by_status }
    }

    #[must_use]
    pub fn count(&self, status: ReviewStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccountCounts {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
}

/// A section's figures or the display message of its failed fetch.
pub type Section<T> = Result<T, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KycSection {
    pub kind: KycKind,
    pub counts: Section<StatusCounts>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub doctors: Section<StatusCounts>,
    pub kyc: Vec<KycSection>,
    pub users: Section<AccountCounts>,
}

impl Report {
    /// Fetch every list and tally it.
    pub async fn load(api: &ApiClient) -> Self {
        let doctors = section(api.list_doctors().await, |doctors| {
            StatusCounts::tally(doctors.iter().map(|doctor| doctor.status))
        });

        let mut kyc = Vec::with_capacity(KycKind::ALL.len());
        for kind in KycKind::ALL {
            let counts = section(api.list_kyc(kind).await, |records| {
                StatusCounts::tally(records.iter().map(|record| record.status))
            });
            kyc.push(KycSection { kind, counts });
        }

        let users = section(api.list_users().await, |users| {
            let enabled = users.iter().filter(|user| user.enabled).count();
            AccountCounts { total: users.len(), enabled, disabled: users.len() - enabled }
        });

        Self { doctors, kyc, users }
    }

    /// Sections that failed, as `(label, message)`.
    #[must_use]
    pub fn failures(&self) -> Vec<(String, &str)> {
        let mut failures = Vec::new();
        if let Err(message) = &self.doctors {
            failures.push(("doctors".to_owned(), message.as_str()));
        }
        for section in &self.kyc {
            if let Err(message) = &section.counts {
                failures.push((format!("kyc {}", section.kind), message.as_str()));
            }
        }
        if let Err(message) = &self.users {
            failures.push(("users".to_owned(), message.as_str()));
        }
        failures
    }
}

fn section<T, S>(result: Result<Vec<T>, ApiError>, summarize: impl FnOnce(&[T]) -> S) -> Section<S> {
    match result {
        Ok(rows) => Ok(summarize(&rows)),
        Err(error) => {
            tracing::warn!(error = %error, "report section failed");
            Err(error.display_message())
        }
    }
}
