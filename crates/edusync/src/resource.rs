//! Authenticated resource API client.
//!
//! Attaches the session credential to every request. A `401 Unauthorized`
//! answer ends the session before the error reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionManager;

/// Result type for resource API calls.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors from the resource API.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("not logged in")]
    NotAuthenticated,

    /// The API rejected the credential; the session has been ended.
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// One class on today's timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
    pub time: String,
    pub subject: String,
    #[serde(default)]
    pub doctor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDue {
    pub title: String,
    #[serde(default)]
    pub due: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub title: String,
    #[serde(default)]
    pub date: String,
}

/// Student dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub gpa: f64,
    #[serde(default)]
    pub total_courses: u32,
    #[serde(default)]
    pub pending_assignments: u32,
    #[serde(default)]
    pub todays_classes: Vec<ClassSlot>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub upcoming_assignments: Vec<AssignmentDue>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

/// One entry of the student's course schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub date: String,
    #[serde(default)]
    pub day: String,
    pub time: String,
    pub subject: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub doctor: String,
}

/// Client for the LMS resource API.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: Client,
    base_url: String,
    sessions: Arc<SessionManager>,
}

impl ResourceClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        sessions: Arc<SessionManager>,
    ) -> ResourceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sessions,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET `path` with the bearer credential and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ResourceResult<T> {
        let credential = self
            .sessions
            .credential()
            .ok_or(ResourceError::NotAuthenticated)?;

        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).bearer_auth(credential).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("credential rejected by {}, ending session", url);
            if let Err(e) = self.sessions.handle_unauthorized() {
                warn!("failed to clear stored session: {}", e);
            }
            return Err(ResourceError::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.to_string()
            };
            return Err(ResourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ResourceError::Parse(e.to_string()))
    }

    fn user_id(&self) -> ResourceResult<String> {
        self.sessions
            .current_user()
            .and_then(|identity| identity.user_id().map(str::to_string))
            .ok_or(ResourceError::NotAuthenticated)
    }

    /// Dashboard summary for the logged-in student.
    pub async fn dashboard(&self) -> ResourceResult<Dashboard> {
        let id = self.user_id()?;
        self.get_json(&format!("/api/dashboard/{id}")).await
    }

    /// Course schedule for the logged-in student.
    pub async fn course_schedule(&self) -> ResourceResult<Vec<ScheduleEntry>> {
        let id = self.user_id()?;
        self.get_json(&format!("/api/courseschedule/mine/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    fn client() -> ResourceClient {
        let sessions = Arc::new(SessionManager::new(Arc::new(MemorySessionStore::new())));
        ResourceClient::new("http://localhost:5000/", Duration::from_secs(5), sessions).unwrap()
    }

    #[test]
    fn test_url_join() {
        let client = client();
        assert_eq!(client.url("/api/x"), "http://localhost:5000/api/x");
        assert_eq!(client.url("api/x"), "http://localhost:5000/api/x");
    }

    #[tokio::test]
    async fn test_anonymous_requests_fail_locally() {
        let client = client();
        assert!(matches!(
            client.get_json::<serde_json::Value>("/api/anything").await,
            Err(ResourceError::NotAuthenticated)
        ));
        assert!(matches!(
            client.dashboard().await,
            Err(ResourceError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_dashboard_parse_tolerates_missing_lists() {
        let dashboard: Dashboard =
            serde_json::from_str(r#"{"fullName":"Ada Lovelace","gpa":3.9,"totalCourses":5}"#)
                .unwrap();
        assert_eq!(dashboard.full_name, "Ada Lovelace");
        assert_eq!(dashboard.total_courses, 5);
        assert!(dashboard.todays_classes.is_empty());
    }

    #[test]
    fn test_schedule_parse() {
        let entries: Vec<ScheduleEntry> = serde_json::from_str(
            r#"[{"date":"2024-03-04","day":"Monday","time":"09:00","subject":"Algorithms","room":"B12","doctor":"Dr. Knuth"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].subject, "Algorithms");
        assert_eq!(entries[0].room, "B12");
    }
}
