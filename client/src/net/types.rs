//! Backend DTOs consumed by the console.
//!
//! DESIGN
//! ======
//! The backend owns these shapes and sends them as loosely-typed JSON. Fields
//! the console reads are typed; everything else lands in `extra` so detail
//! views can still show it. Ids arrive as strings or numbers and are kept as
//! strings.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Review state shared by doctors and KYC submissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    /// Anything the backend sends that the console does not know.
    Unknown,
}

impl ReviewStatus {
    pub const KNOWN: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

impl Serialize for ReviewStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReviewStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(raw) => raw.parse().unwrap_or(Self::Unknown),
            Value::Null => Self::Pending,
            _ => Self::Unknown,
        })
    }
}

/// A console user or marketplace client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Empty when the backend omits it, as it does for users nested in other
    /// records.
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub enabled: bool,
    #[serde(default)]
    pub role: Option<String>,
    /// Older backend builds send the role under this name.
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    #[must_use]
    pub fn display_name(&self) -> String {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("user {}", self.id))
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().or(self.authority.as_deref())
    }
}

/// A veterinary doctor registered on the marketplace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(deserialize_with = "deserialize_id")]
    pub doctor_id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub uid: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub license_expiry: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_f64")]
    pub experience_years: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_f64")]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub clinic_address: Option<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Doctor {
    #[must_use]
    pub fn display_name(&self) -> String {
        self.user.as_ref().map_or_else(|| format!("doctor {}", self.doctor_id), User::display_name)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|user| user.email.as_deref())
    }
}

/// Which KYC flow a submission belongs to: who reviews it and who submitted it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KycKind {
    MetavetGroomer,
    MetavetWalker,
    MetavetBehaviourist,
    GroomerClient,
    WalkerClient,
    BehaviouristClient,
}

impl KycKind {
    pub const ALL: [Self; 6] = [
        Self::MetavetGroomer,
        Self::MetavetWalker,
        Self::MetavetBehaviourist,
        Self::GroomerClient,
        Self::WalkerClient,
        Self::BehaviouristClient,
    ];

    #[must_use]
    pub fn reviewer(self) -> &'static str {
        match self {
            Self::MetavetGroomer | Self::MetavetWalker | Self::MetavetBehaviourist => "metavet",
            Self::GroomerClient => "groomer",
            Self::WalkerClient => "walker",
            Self::BehaviouristClient => "behaviourist",
        }
    }

    #[must_use]
    pub fn subject(self) -> &'static str {
        match self {
            Self::MetavetGroomer => "groomer",
            Self::MetavetWalker => "walker",
            Self::MetavetBehaviourist => "behaviourist",
            Self::GroomerClient | Self::WalkerClient | Self::BehaviouristClient => "client",
        }
    }

    /// Stable CLI/URL name, e.g. `metavet-groomer`.
    #[must_use]
    pub fn slug(self) -> String {
        format!("{}-{}", self.reviewer(), self.subject())
    }

    #[must_use]
    pub fn label(self) -> String {
        format!("{} -> {}", capitalize(self.reviewer()), capitalize(self.subject()))
    }
}

impl fmt::Display for KycKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}

impl Serialize for KycKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.slug())
    }
}

impl FromStr for KycKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase().replace(['/', '_'], "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted)
            .ok_or_else(|| format!("unknown KYC kind: {raw} (expected one of {})", kyc_kind_names()))
    }
}

fn kyc_kind_names() -> String {
    KycKind::ALL.iter().map(|kind| kind.slug()).collect::<Vec<_>>().join(", ")
}

/// Reference to an uploaded KYC document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub doc_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// One KYC submission. Most of the form payload stays in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub uid: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub documents: Vec<DocumentRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KycRecord {
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.extra.get("firstName").and_then(Value::as_str);
        let last = self.extra.get("lastName").and_then(Value::as_str);
        self.full_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| full_name(first, last))
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("submission {}", self.id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_data: Option<User>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Body for the status-update endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Raw bytes of an uploaded document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() { None } else { Some(joined) }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn id_from_value<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(raw)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(E::custom(format!("expected string or number id, got {other}"))),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(value)?.ok_or_else(|| D::Error::custom("id must not be null"))
}

fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(Value::deserialize(deserializer)?)?.unwrap_or_default())
}

/// `null` reads as the default, the same as a missing field.
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    id_from_value(Value::deserialize(deserializer)?)
}

fn deserialize_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(raw) if raw.trim().is_empty() => Ok(None),
        Value::String(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected numeric string, got {raw:?}"))),
        _ => Err(D::Error::custom("expected number")),
    }
}
