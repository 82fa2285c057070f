//! Client-side form rules.
//!
//! The backend is the validation authority; these checks only stop obviously
//! bad input before a round trip. Each rule returns the message shown next to
//! the field.

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;

use std::collections::BTreeMap;
use std::fmt;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Messages keyed by field name, in field-name order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Record `result` for `field`; the first failure per field wins.
    pub fn check(&mut self, field: &str, result: Result<(), &'static str>) {
        if let Err(message) = result {
            self.0.entry(field.to_owned()).or_insert_with(|| message.to_owned());
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

pub fn required(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() { Err("This field is required.") } else { Ok(()) }
}

/// `local@domain.tld`, no whitespace, one `@`.
pub fn email(value: &str) -> Result<(), &'static str> {
    const MESSAGE: &str = "Enter a valid email address.";
    let value = value.trim();
    let (local, domain) = value.split_once('@').ok_or(MESSAGE)?;
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty());
    if well_formed { Ok(()) } else { Err(MESSAGE) }
}

/// 7-15 digits, optional leading `+`, spaces/dashes/parentheses allowed.
pub fn phone(value: &str) -> Result<(), &'static str> {
    const MESSAGE: &str = "Enter a valid phone number.";
    let value = value.trim();
    let body = value.strip_prefix('+').unwrap_or(value);
    if !body.chars().all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')')) {
        return Err(MESSAGE);
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if (7..=15).contains(&digits) { Ok(()) } else { Err(MESSAGE) }
}

pub fn password(value: &str) -> Result<(), &'static str> {
    if value.chars().count() >= MIN_PASSWORD_LEN { Ok(()) } else { Err("Password must be at least 8 characters.") }
}

/// Non-negative decimal amount such as a consultation fee.
pub fn fee(value: &str) -> Result<(), &'static str> {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(()),
        _ => Err("Enter a non-negative amount."),
    }
}

pub fn whole_years(value: &str) -> Result<(), &'static str> {
    const MESSAGE: &str = "Enter a whole number of years.";
    let value = value.trim();
    if !all_digits(value) {
        return Err(MESSAGE);
    }
    value.parse::<u32>().map(|_| ()).map_err(|_| MESSAGE)
}

/// Calendar date as `YYYY-MM-DD`.
pub fn iso_date(value: &str) -> Result<(), &'static str> {
    const MESSAGE: &str = "Use the format YYYY-MM-DD.";
    let mut parts = value.trim().splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MESSAGE);
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 || ![year, month, day].into_iter().all(all_digits) {
        return Err(MESSAGE);
    }
    let (Ok(year), Ok(month), Ok(day)) = (year.parse::<u32>(), month.parse::<u32>(), day.parse::<u32>()) else {
        return Err(MESSAGE);
    };
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return Err(MESSAGE),
    };
    if (1..=days_in_month).contains(&day) { Ok(()) } else { Err(MESSAGE) }
}

/// `u32::from_str` also takes a leading `+`.
fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Run `rule` only when the value is present.
pub fn optional(value: &str, rule: fn(&str) -> Result<(), &'static str>) -> Result<(), &'static str> {
    if value.trim().is_empty() { Ok(()) } else { rule(value) }
}
