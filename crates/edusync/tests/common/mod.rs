//! Test utilities: a mock LMS (issuer + resource API) and credential minting.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use edusync::issuer::{DEFAULT_LOGIN_PATH, HttpIssuer};
use edusync::resource::ResourceClient;
use edusync::session::{MemorySessionStore, SessionManager, SessionStore};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const SECRET: &[u8] = b"edusync-integration-test-secret";

pub const MS_ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

pub const STUDENT_EMAIL: &str = "student@edusync.test";
pub const STUDENT_PASSWORD: &str = "student123";
pub const ADMIN_EMAIL: &str = "admin@edusync.test";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Sign `claims` as an HS256 credential.
pub fn mint(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET),
    )
    .expect("sign test credential")
}

pub fn student_token() -> String {
    mint(json!({
        MS_ROLE_CLAIM: "Student",
        "sub": "41",
        "exp": 4_102_444_800_i64,
    }))
}

pub fn admin_token() -> String {
    mint(json!({
        "role": "Admin",
        "sub": "1",
        "exp": 4_102_444_800_i64,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Default)]
struct LmsState {
    login_calls: AtomicUsize,
    revoked: AtomicBool,
}

/// In-process LMS backend bound to an ephemeral port.
pub struct MockLms {
    pub base_url: String,
    state: Arc<LmsState>,
}

impl MockLms {
    pub async fn start() -> Self {
        let state = Arc::new(LmsState::default());
        let app = Router::new()
            .route(DEFAULT_LOGIN_PATH, post(login))
            .route("/api/dashboard/{id}", get(dashboard))
            .route("/api/courseschedule/mine/{id}", get(schedule))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock LMS");
        let addr = listener.local_addr().expect("mock LMS address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn issuer(&self) -> HttpIssuer {
        HttpIssuer::new(
            self.base_url.as_str(),
            DEFAULT_LOGIN_PATH,
            Duration::from_secs(5),
        )
        .expect("build issuer client")
    }

    pub fn resources(&self, sessions: Arc<SessionManager>) -> ResourceClient {
        ResourceClient::new(self.base_url.as_str(), Duration::from_secs(5), sessions)
            .expect("build resource client")
    }

    pub fn login_calls(&self) -> usize {
        self.state.login_calls.load(Ordering::SeqCst)
    }

    /// Reject every credential from now on, as if they had expired.
    pub fn revoke_credentials(&self) {
        self.state.revoked.store(true, Ordering::SeqCst);
    }
}

pub fn memory_sessions() -> (Arc<SessionManager>, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let sessions = Arc::new(SessionManager::new(store.clone() as Arc<dyn SessionStore>));
    (sessions, store)
}

async fn login(State(state): State<Arc<LmsState>>, Json(body): Json<LoginBody>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let account = match (body.email.as_str(), body.password.as_str()) {
        (STUDENT_EMAIL, STUDENT_PASSWORD) => json!({
            "id": "41",
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": STUDENT_EMAIL,
            "token": student_token(),
        }),
        (ADMIN_EMAIL, ADMIN_PASSWORD) => json!({
            "id": "1",
            "firstName": "Alan",
            "lastName": "Turing",
            "email": ADMIN_EMAIL,
            "token": admin_token(),
        }),
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid email or password" })),
            )
                .into_response();
        }
    };
    Json(account).into_response()
}

fn authorized(state: &LmsState, headers: &HeaderMap) -> bool {
    if state.revoked.load(Ordering::SeqCst) {
        return false;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == student_token() || token == admin_token())
}

async fn dashboard(
    State(state): State<Arc<LmsState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != "41" {
        return (StatusCode::NOT_FOUND, "student not found").into_response();
    }
    Json(json!({
        "fullName": "Grace Hopper",
        "gpa": 3.8,
        "totalCourses": 5,
        "pendingAssignments": 2,
        "todaysClasses": [
            { "time": "09:00", "subject": "Compilers", "doctor": "Dr. Backus" }
        ],
        "achievements": [],
        "upcomingAssignments": [
            { "title": "Parser project", "due": "2024-05-01" }
        ],
        "announcements": [
            { "title": "Midterms moved", "date": "2024-04-20" }
        ]
    }))
    .into_response()
}

async fn schedule(
    State(state): State<Arc<LmsState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != "41" {
        return Json(json!([])).into_response();
    }
    Json(json!([
        {
            "date": "2024-04-22",
            "day": "Monday",
            "time": "09:00",
            "subject": "Compilers",
            "room": "B12",
            "doctor": "Dr. Backus"
        },
        {
            "date": "2024-04-23",
            "day": "Tuesday",
            "time": "11:00",
            "subject": "Operating Systems",
            "room": "A3",
            "doctor": "Dr. Ritchie"
        }
    ]))
    .into_response()
}
