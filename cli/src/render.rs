//! Plain-text rendering of pages for the terminal.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write as _;

use client::net::types::{Doctor, KycRecord, User};
use client::pages::reports::{Report, StatusCounts};
use client::pages::users::account_status;
use client::state::list::PageView;
use serde_json::Value;

/// Left-aligned columns separated by two spaces, header underlined.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let headers: Vec<String> = headers.iter().map(|header| (*header).to_owned()).collect();
    push_row(&mut out, &widths, &headers);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_row(&mut out, &widths, &rule);
    for row in rows {
        push_row(&mut out, &widths, row);
    }
    out
}

fn push_row(out: &mut String, widths: &[usize], cells: &[String]) {
    let line = widths
        .iter()
        .zip(cells)
        .map(|(width, cell)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn page_footer<T>(view: &PageView<'_, T>) -> String {
    format!("page {} of {} ({} matching, {} total)", view.page, view.page_count, view.matched, view.total)
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|value| !value.trim().is_empty()).unwrap_or("-").to_owned()
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("{value:.2}"))
}

pub fn doctor_table(view: &PageView<'_, Doctor>) -> String {
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|doctor| {
            vec![
                doctor.doctor_id.clone(),
                doctor.display_name(),
                or_dash(doctor.email()),
                or_dash(doctor.specialization.as_deref()),
                money(doctor.consultation_fee),
                doctor.status.to_string(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "EMAIL", "SPECIALIZATION", "FEE", "STATUS"], &rows)
}

pub fn kyc_table(view: &PageView<'_, KycRecord>) -> String {
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|record| {
            vec![
                record.id.clone(),
                record.display_name(),
                or_dash(record.email.as_deref()),
                or_dash(record.submitted_at.as_deref()),
                record.status.to_string(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "EMAIL", "SUBMITTED", "STATUS"], &rows)
}

pub fn user_table(view: &PageView<'_, User>) -> String {
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|user| {
            vec![
                user.id.clone(),
                user.display_name(),
                or_dash(user.email.as_deref()),
                or_dash(user.role()),
                account_status(user).to_owned(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "EMAIL", "ROLE", "STATUS"], &rows)
}

/// `label: value` lines, labels padded to the widest one.
pub fn fields(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in pairs {
        let _ = writeln!(out, "{:<width$}  {value}", format!("{label}:"), width = width + 1);
    }
    out
}

pub fn doctor_detail(doctor: &Doctor) -> String {
    let experience = doctor.experience_years.map(|years| format!("{years} years"));
    let mut out = fields(&[
        ("Doctor", doctor.doctor_id.clone()),
        ("Name", doctor.display_name()),
        ("Email", or_dash(doctor.email())),
        ("License", or_dash(doctor.license_number.as_deref())),
        ("License expiry", or_dash(doctor.license_expiry.as_deref())),
        ("Specialization", or_dash(doctor.specialization.as_deref())),
        ("Qualification", or_dash(doctor.qualification.as_deref())),
        ("Experience", or_dash(experience.as_deref())),
        ("Fee", money(doctor.consultation_fee)),
        ("Clinic", or_dash(doctor.clinic_name.as_deref())),
        ("Address", or_dash(doctor.clinic_address.as_deref())),
        ("Status", doctor.status.to_string()),
    ]);
    if let Some(reason) = &doctor.rejection_reason {
        let _ = writeln!(out, "Rejected because: {reason}");
    }
    out
}

pub fn kyc_detail(record: &KycRecord, extra: &[(&str, &Value)]) -> String {
    let mut out = fields(&[
        ("Submission", record.id.clone()),
        ("Name", record.display_name()),
        ("Email", or_dash(record.email.as_deref())),
        ("Phone", or_dash(record.phone.as_deref())),
        ("Submitted", or_dash(record.submitted_at.as_deref())),
        ("Status", record.status.to_string()),
    ]);
    if let Some(reason) = &record.rejection_reason {
        let _ = writeln!(out, "Rejected because: {reason}");
    }
    if !record.documents.is_empty() {
        out.push_str("\nDocuments:\n");
        for document in &record.documents {
            let _ = writeln!(out, "  {} ({})", document.doc_type, or_dash(document.file_name.as_deref()));
        }
    }
    for (section, value) in extra {
        let rendered = match value {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        let _ = write!(out, "\n{section}:\n{rendered}\n");
    }
    out
}

pub fn user_detail(user: &User) -> String {
    fields(&[
        ("User", user.id.clone()),
        ("Name", user.display_name()),
        ("Email", or_dash(user.email.as_deref())),
        ("Phone", or_dash(user.phone.as_deref())),
        ("Role", or_dash(user.role())),
        ("Status", account_status(user).to_owned()),
        ("Created", or_dash(user.created_at.as_deref())),
    ])
}

fn counts_line(counts: &StatusCounts) -> String {
    let parts: Vec<String> =
        counts.by_status.iter().map(|(status, count)| format!("{} {count}", status.as_str().to_lowercase())).collect();
    format!("{} total; {}", counts.total, parts.join(", "))
}

pub fn report(report: &Report) -> String {
    let mut out = String::new();
    let doctors = report.doctors.as_ref().map_or_else(|error| format!("error: {error}"), counts_line);
    let _ = writeln!(out, "Doctors: {doctors}");

    out.push_str("KYC:\n");
    for section in &report.kyc {
        let line = section.counts.as_ref().map_or_else(|error| format!("error: {error}"), counts_line);
        let _ = writeln!(out, "  {:<20} {line}", section.kind.label());
    }

    let users = report.users.as_ref().map_or_else(
        |error| format!("error: {error}"),
        |users| format!("{} total; enabled {}, disabled {}", users.total, users.enabled, users.disabled),
    );
    let _ = writeln!(out, "Users: {users}");
    out
}
