//! Static registry of backend operations.
//!
//! DESIGN
//! ======
//! Every REST call the console makes is named here once: HTTP method, URL
//! template with `{param}` placeholders, and whether the token header is
//! attached. `ApiClient` never formats a path by hand.

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod endpoints_test;

use reqwest::{Method, Url};

/// Whether the request interceptor attaches `Authorization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Public,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    RefreshToken,
    CurrentUser,
    ListDoctors,
    GetDoctor,
    CreateDoctor,
    UpdateDoctor,
    UpdateDoctorStatus,
    ListUsers,
    GetUser,
    CreateUser,
    UpdateUser,
    SetUserEnabled,
    ListKyc,
    GetKyc,
    UpdateKycStatus,
    FetchDocument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub method: Method,
    pub template: &'static str,
    pub auth: Auth,
}

pub const ALL_ENDPOINTS: [Endpoint; 18] = [
    Endpoint::Login,
    Endpoint::Register,
    Endpoint::RefreshToken,
    Endpoint::CurrentUser,
    Endpoint::ListDoctors,
    Endpoint::GetDoctor,
    Endpoint::CreateDoctor,
    Endpoint::UpdateDoctor,
    Endpoint::UpdateDoctorStatus,
    Endpoint::ListUsers,
    Endpoint::GetUser,
    Endpoint::CreateUser,
    Endpoint::UpdateUser,
    Endpoint::SetUserEnabled,
    Endpoint::ListKyc,
    Endpoint::GetKyc,
    Endpoint::UpdateKycStatus,
    Endpoint::FetchDocument,
];

impl Endpoint {
    #[must_use]
    pub fn spec(self) -> EndpointSpec {
        let (name, method, template, auth) = match self {
            Self::Login => ("login", Method::POST, "/api/auth/login", Auth::Public),
            Self::Register => ("register", Method::POST, "/api/auth/register", Auth::Public),
            Self::RefreshToken => ("refreshToken", Method::POST, "/api/auth/refresh-token", Auth::Public),
            Self::CurrentUser => ("currentUser", Method::GET, "/api/auth/me", Auth::Token),
            Self::ListDoctors => ("listDoctors", Method::GET, "/api/doctors", Auth::Token),
            Self::GetDoctor => ("getDoctor", Method::GET, "/api/doctors/{doctorId}", Auth::Token),
            Self::CreateDoctor => ("createDoctor", Method::POST, "/api/doctors", Auth::Token),
            Self::UpdateDoctor => ("updateDoctor", Method::PUT, "/api/doctors/{doctorId}", Auth::Token),
            Self::UpdateDoctorStatus => {
                ("updateDoctorStatus", Method::PUT, "/api/doctors/{doctorId}/status", Auth::Token)
            }
            Self::ListUsers => ("listUsers", Method::GET, "/api/users", Auth::Token),
            Self::GetUser => ("getUser", Method::GET, "/api/users/{userId}", Auth::Token),
            Self::CreateUser => ("createUser", Method::POST, "/api/users", Auth::Token),
            Self::UpdateUser => ("updateUser", Method::PUT, "/api/users/{userId}", Auth::Token),
            Self::SetUserEnabled => ("setUserEnabled", Method::PATCH, "/api/users/{userId}/enabled", Auth::Token),
            Self::ListKyc => ("listKyc", Method::GET, "/api/kyc/{reviewer}/{subject}", Auth::Token),
            Self::GetKyc => ("getKyc", Method::GET, "/api/kyc/{reviewer}/{subject}/{kycId}", Auth::Token),
            Self::UpdateKycStatus => {
                ("updateKycStatus", Method::PUT, "/api/kyc/{reviewer}/{subject}/{kycId}/status", Auth::Token)
            }
            Self::FetchDocument => ("fetchDocument", Method::GET, "/api/kyc/documents/{uid}/{docType}", Auth::Token),
        };
        EndpointSpec { name, method, template, auth }
    }

    /// Look up an endpoint by its logical operation name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_ENDPOINTS.into_iter().find(|endpoint| endpoint.spec().name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("missing URL parameter `{param}` for {template}")]
    MissingParam { template: &'static str, param: String },
    #[error("unterminated placeholder in {template}")]
    Unterminated { template: &'static str },
    #[error("backend base URL is not usable: {base_url}")]
    InvalidBaseUrl { base_url: String },
}

/// Path segments of `template` with `{param}` placeholders replaced by their
/// raw values.
///
/// A placeholder must fill a whole segment. Extra params are ignored; a
/// placeholder without a value is an error.
///
/// # Errors
///
/// [`EndpointError::MissingParam`] or [`EndpointError::Unterminated`].
pub fn render_segments<'a>(template: &'static str, params: &[(&str, &'a str)]) -> Result<Vec<&'a str>, EndpointError> {
    template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let Some(placeholder) = segment.strip_prefix('{') else {
                return Ok(segment);
            };
            let name = placeholder.strip_suffix('}').ok_or(EndpointError::Unterminated { template })?;
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| EndpointError::MissingParam { template, param: name.to_owned() })
        })
        .collect()
}

/// Base URL and token label shared by every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistry {
    base_url: String,
    token_type: String,
}

impl EndpointRegistry {
    #[must_use]
    pub fn new(base_url: &str, token_type: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), token_type: token_type.to_owned() }
    }

    /// Absolute URL for `endpoint` with `params` substituted. Values are
    /// percent-encoded as single path segments.
    ///
    /// # Errors
    ///
    /// See [`render_segments`]; [`EndpointError::InvalidBaseUrl`] when the
    /// base URL cannot carry a path.
    pub fn url(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<String, EndpointError> {
        let invalid = || EndpointError::InvalidBaseUrl { base_url: self.base_url.clone() };
        let rendered = render_segments(endpoint.spec().template, params)?;
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|()| invalid())?.pop_if_empty().extend(rendered);
        Ok(url.into())
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self, token: &str) -> String {
        format!("{} {token}", self.token_type)
    }
}
