//! In-process fake of the marketplace backend for tests.
//!
//! Binds an axum router to `127.0.0.1:0` and records what the console sent
//! so tests can assert on headers and bodies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use serde_json::{Value, json};

use crate::config::ConsoleConfig;
use crate::net::api::ApiClient;
use crate::state::storage::{ACCESS_TOKEN_KEY, MemoryStorage, REFRESH_TOKEN_KEY, Storage, USER_DATA_KEY};

pub const ADMIN_EMAIL: &str = "admin@pets.test";
pub const ADMIN_PASSWORD: &str = "correct-horse";

#[derive(Debug, Default)]
pub struct FakeState {
    pub doctors: Vec<Value>,
    pub users: Vec<Value>,
    pub kyc: HashMap<String, Vec<Value>>,
    pub valid_tokens: Vec<String>,
    pub auth_headers: Vec<Option<String>>,
    pub status_updates: Vec<(String, Value)>,
    pub created: Vec<(String, Value)>,
    pub edits: Vec<(String, Value)>,
    pub fail_status_updates: bool,
    pub fail_lists: bool,
    pub omit_user_data: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

pub fn admin_user() -> Value {
    json!({
        "id": 1,
        "uid": "admin-1",
        "firstName": "Ada",
        "lastName": "Admin",
        "email": ADMIN_EMAIL,
        "enabled": true,
        "role": "ADMIN"
    })
}

impl FakeBackend {
    pub fn seeded() -> Self {
        let mut kyc = HashMap::new();
        kyc.insert(
            "metavet/groomer".to_owned(),
            vec![
                json!({ "id": 11, "uid": "groomer-1", "fullName": "Gina Groom", "email": "gina@groom.test",
                        "status": "PENDING", "documents": [{ "docType": "certificate", "fileName": "cert.pdf" }],
                        "insurance": { "provider": "PetSure" } }),
                json!({ "id": 12, "uid": "groomer-2", "fullName": "Gus Trim", "status": "APPROVED" }),
            ],
        );
        kyc.insert(
            "groomer/client".to_owned(),
            vec![json!({ "id": 21, "uid": "client-1", "fullName": "Cleo Client", "status": "REJECTED",
                         "pet": { "name": "Rex", "species": "dog" } })],
        );
        let state = FakeState {
            doctors: vec![
                json!({ "doctorId": 1, "uid": "doc-1", "specialization": "Surgery", "consultationFee": 80,
                        "status": "PENDING", "user": { "id": 5, "firstName": "Maya", "lastName": "Stone", "email": "maya@vet.test" } }),
                json!({ "doctorId": 2, "uid": "doc-2", "specialization": "Dermatology", "consultationFee": "45.5",
                        "status": "APPROVED", "user": { "id": 6, "firstName": "Ben", "lastName": "Archer", "email": "ben@vet.test" } }),
                json!({ "doctorId": 3, "uid": "doc-3", "specialization": "Dentistry", "consultationFee": 60,
                        "status": "REJECTED", "user": { "id": 7, "firstName": "Cara", "lastName": "Diaz", "email": "cara@vet.test" } }),
            ],
            users: vec![
                admin_user(),
                json!({ "id": 2, "firstName": "Walt", "lastName": "Walker", "email": "walt@walk.test", "enabled": true, "role": "WALKER" }),
                json!({ "id": 3, "firstName": "Bea", "lastName": "Haviour", "email": "bea@pets.test", "enabled": false, "authority": "BEHAVIOURIST" }),
            ],
            kyc,
            valid_tokens: vec!["token-1".to_owned(), "token-2".to_owned(), "token-new".to_owned()],
            ..FakeState::default()
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/refresh-token", post(refresh))
            .route("/api/auth/me", get(me))
            .route("/api/doctors", get(list_doctors).post(create_doctor))
            .route("/api/doctors/{id}", get(get_doctor).put(update_doctor))
            .route("/api/doctors/{id}/status", put(doctor_status))
            .route("/api/users", get(list_users).post(create_user))
            .route("/api/users/{id}", get(get_user).put(update_user))
            .route("/api/users/{id}/enabled", axum::routing::patch(user_enabled))
            .route("/api/kyc/documents/{uid}/{doc_type}", get(document))
            .route("/api/kyc/{reviewer}/{subject}", get(list_kyc))
            .route("/api/kyc/{reviewer}/{subject}/{id}", get(get_kyc))
            .route("/api/kyc/{reviewer}/{subject}/{id}/status", put(kyc_status))
            .with_state(self.clone())
    }

    /// Serve the fake on an ephemeral port and return its base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend addr");
        let router = self.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }
}

pub fn client_for(base_url: &str, storage: Arc<dyn Storage>) -> ApiClient {
    let config = ConsoleConfig { api_base_url: base_url.to_owned(), ..ConsoleConfig::default() };
    ApiClient::new(&config, storage).expect("client builds")
}

pub fn logged_in_storage() -> Arc<MemoryStorage> {
    Arc::new(MemoryStorage::with_entries(&[
        (ACCESS_TOKEN_KEY, "token-1"),
        (REFRESH_TOKEN_KEY, "refresh-1"),
        (USER_DATA_KEY, &admin_user().to_string()),
    ]))
}

/// Fake backend plus a client already holding a valid token.
pub async fn logged_in_client() -> (FakeBackend, ApiClient) {
    let backend = FakeBackend::seeded();
    let base_url = backend.spawn().await;
    let client = client_for(&base_url, logged_in_storage());
    (backend, client)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn id_of(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

fn authorize(backend: &FakeBackend, headers: &HeaderMap) -> Result<(), Response> {
    let header = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(ToOwned::to_owned);
    let mut state = backend.lock();
    state.auth_headers.push(header.clone());
    let valid = header
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|token| state.valid_tokens.iter().any(|v| v == token));
    if valid { Ok(()) } else { Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")) }
}

async fn login(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    if body["email"] != ADMIN_EMAIL || body["password"] != ADMIN_PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    if backend.lock().omit_user_data {
        return Json(json!({ "accessToken": "token-1", "refreshToken": "refresh-1" })).into_response();
    }
    Json(json!({ "accessToken": "token-1", "refreshToken": "refresh-1", "userData": admin_user() })).into_response()
}

async fn register(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let mut state = backend.lock();
    if state.users.iter().any(|user| user["email"] == body["email"]) {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let mut user = body.clone();
    user["id"] = json!(state.users.len() + 1);
    user["enabled"] = json!(true);
    if let Some(map) = user.as_object_mut() {
        map.remove("password");
    }
    state.users.push(user.clone());
    state.created.push(("register".to_owned(), body));
    (StatusCode::CREATED, Json(json!({ "accessToken": "token-new", "userData": user }))).into_response()
}

async fn refresh(Json(body): Json<Value>) -> Response {
    if body["refreshToken"] == "refresh-1" {
        return Json(json!({ "accessToken": "token-2", "refreshToken": "refresh-2" })).into_response();
    }
    error(StatusCode::UNAUTHORIZED, "Refresh token expired")
}

async fn me(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    Json(admin_user()).into_response()
}

async fn list_doctors(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let state = backend.lock();
    if state.fail_lists {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Doctor directory offline");
    }
    Json(json!({ "data": state.doctors })).into_response()
}

async fn get_doctor(State(backend): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let state = backend.lock();
    match state.doctors.iter().find(|doctor| id_of(doctor, "doctorId") == id) {
        Some(doctor) => Json(doctor.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Doctor not found"),
    }
}

async fn create_doctor(State(backend): State<FakeBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    let mut doctor = body.clone();
    doctor["doctorId"] = json!(state.doctors.len() + 1);
    doctor["status"] = json!("PENDING");
    state.doctors.push(doctor.clone());
    state.created.push(("doctor".to_owned(), body));
    (StatusCode::CREATED, Json(doctor)).into_response()
}

fn merge_fields(record: &mut Value, body: &Value) {
    if let (Some(fields), Some(changes)) = (record.as_object_mut(), body.as_object()) {
        fields.extend(changes.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
}

async fn update_doctor(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    let Some(doctor) = state.doctors.iter_mut().find(|doctor| id_of(doctor, "doctorId") == id) else {
        return error(StatusCode::NOT_FOUND, "Doctor not found");
    };
    merge_fields(doctor, &body);
    let updated = doctor.clone();
    state.edits.push((format!("doctor/{id}"), body));
    Json(updated).into_response()
}

async fn doctor_status(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    if state.fail_status_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Status service unavailable");
    }
    let Some(doctor) = state.doctors.iter_mut().find(|doctor| id_of(doctor, "doctorId") == id) else {
        return error(StatusCode::NOT_FOUND, "Doctor not found");
    };
    doctor["status"] = body["status"].clone();
    state.status_updates.push((format!("doctor/{id}"), body.clone()));
    Json(json!({ "doctorId": id, "status": body["status"] })).into_response()
}

async fn list_users(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let state = backend.lock();
    if state.fail_lists {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "User directory offline");
    }
    Json(Value::Array(state.users.clone())).into_response()
}

async fn get_user(State(backend): State<FakeBackend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let state = backend.lock();
    match state.users.iter().find(|user| id_of(user, "id") == id) {
        Some(user) => Json(user.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn create_user(State(backend): State<FakeBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    if state.users.iter().any(|user| user["email"] == body["email"]) {
        return error(StatusCode::CONFLICT, "Email already in use");
    }
    let mut user = body.clone();
    user["id"] = json!(state.users.len() + 1);
    state.users.push(user.clone());
    state.created.push(("user".to_owned(), body));
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn update_user(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    let email_taken = body
        .get("email")
        .is_some_and(|email| state.users.iter().any(|user| id_of(user, "id") != id && user["email"] == *email));
    if email_taken {
        return error(StatusCode::CONFLICT, "Email already in use");
    }
    let Some(user) = state.users.iter_mut().find(|user| id_of(user, "id") == id) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    merge_fields(user, &body);
    let updated = user.clone();
    state.edits.push((format!("user/{id}"), body));
    Json(json!({ "data": updated })).into_response()
}

async fn user_enabled(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    if state.fail_status_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Account service unavailable");
    }
    let Some(user) = state.users.iter_mut().find(|user| id_of(user, "id") == id) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    user["enabled"] = body["enabled"].clone();
    state.status_updates.push((format!("user/{id}"), body.clone()));
    Json(json!({ "id": id, "enabled": body["enabled"] })).into_response()
}

async fn list_kyc(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path((reviewer, subject)): Path<(String, String)>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let state = backend.lock();
    if state.fail_lists {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "KYC service offline");
    }
    let rows = state.kyc.get(&format!("{reviewer}/{subject}")).cloned().unwrap_or_default();
    Json(json!({ "content": rows, "totalElements": rows.len() })).into_response()
}

async fn get_kyc(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path((reviewer, subject, id)): Path<(String, String, String)>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let state = backend.lock();
    let found = state.kyc.get(&format!("{reviewer}/{subject}")).and_then(|rows| rows.iter().find(|row| id_of(row, "id") == id));
    match found {
        Some(row) => Json(row.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "KYC submission not found"),
    }
}

async fn kyc_status(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path((reviewer, subject, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    let mut state = backend.lock();
    if state.fail_status_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "KYC service unavailable");
    }
    let key = format!("{reviewer}/{subject}");
    let Some(row) = state.kyc.get_mut(&key).and_then(|rows| rows.iter_mut().find(|row| id_of(row, "id") == id)) else {
        return error(StatusCode::NOT_FOUND, "KYC submission not found");
    };
    row["status"] = body["status"].clone();
    state.status_updates.push((format!("kyc/{key}/{id}"), body));
    StatusCode::NO_CONTENT.into_response()
}

async fn document(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path((uid, doc_type)): Path<(String, String)>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    if uid == "groomer-1" && doc_type == "certificate" {
        return ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.4 fake".to_vec()).into_response();
    }
    error(StatusCode::NOT_FOUND, "Document not found")
}
