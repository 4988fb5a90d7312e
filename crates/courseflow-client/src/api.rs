//! HTTP implementation of the backend seam.
//!
//! One method per endpoint, all camelCase JSON. Curriculum responses are
//! wrapped in a `{ "data": ... }` envelope; progress and attempt responses
//! are bare. Errors map onto [`BackendError`]: transport failures become
//! `Network`, non-2xx responses become `Status` with the body text, and
//! bodies that do not parse become `Decode`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use courseflow_session::{
    AssessmentAttempt, BackendError, Curriculum, LearnBackend, ProgressSnapshot, SessionConfig,
    StartAttemptRequest, SubmitAttemptRequest,
};

use crate::reporter::PositionSink;

/// Successful responses that arrive wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Client for the learning platform's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Builds a client from the session configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Network` when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &SessionConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BackendError::network(e.to_string()))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// A position sink that reports for one learner through this client.
    #[must_use]
    pub fn position_sink(&self, user_id: impl Into<String>) -> ApiPositionSink {
        ApiPositionSink {
            client: self.clone(),
            user_id: user_id.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::status(status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::decode(e.to_string()))
    }
}

impl LearnBackend for ApiClient {
    async fn fetch_curriculum(&self, course_id: &str) -> Result<Curriculum, BackendError> {
        debug!(course_id, "fetching curriculum");
        let response = self
            .client
            .get(self.url("/api/courses"))
            .query(&[("id", course_id), ("curriculum", "true")])
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        let response = Self::check(response).await?;
        let envelope: DataEnvelope<Curriculum> = Self::decode(response).await?;
        let mut curriculum = envelope.data;
        // The envelope may omit courseId; the caller's id is authoritative.
        if curriculum.course_id.is_empty() {
            curriculum.course_id = course_id.to_string();
        }
        Ok(curriculum)
    }

    async fn fetch_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<ProgressSnapshot, BackendError> {
        debug!(user_id, course_id, "fetching progress");
        let response = self
            .client
            .get(self.url("/api/progress"))
            .query(&[("userId", user_id), ("courseId", course_id)])
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        let response = Self::check(response).await?;
        Self::decode(response).await
    }

    async fn mark_lesson_complete(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<(), BackendError> {
        debug!(user_id, lesson_id, "marking lesson complete");
        let response = self
            .client
            .post(self.url("/api/progress"))
            .query(&[
                ("userId", user_id),
                ("lessonId", lesson_id),
                ("complete", "true"),
            ])
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn put_watch_position(
        &self,
        user_id: &str,
        lesson_id: &str,
        position: u32,
    ) -> Result<(), BackendError> {
        debug!(user_id, lesson_id, position, "updating watch position");
        let response = self
            .client
            .put(self.url("/api/progress"))
            .query(&[("userId", user_id), ("lessonId", lesson_id)])
            .json(&serde_json::json!({ "lastWatchedPosition": position }))
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn start_attempt(
        &self,
        request: &StartAttemptRequest,
    ) -> Result<AssessmentAttempt, BackendError> {
        debug!(assessment_id = %request.assessment_id, "starting attempt");
        let response = self
            .client
            .post(self.url("/api/assessment-attempts"))
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        let response = Self::check(response).await?;
        Self::decode(response).await
    }

    async fn submit_attempt(
        &self,
        request: &SubmitAttemptRequest,
    ) -> Result<AssessmentAttempt, BackendError> {
        debug!(attempt_id = %request.id, "submitting attempt");
        let response = self
            .client
            .post(self.url("/api/assessment-attempts"))
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        let response = Self::check(response).await?;
        Self::decode(response).await
    }
}

/// [`PositionSink`] bound to one learner, for the debounced reporter.
#[derive(Debug, Clone)]
pub struct ApiPositionSink {
    client: ApiClient,
    user_id: String,
}

impl PositionSink for ApiPositionSink {
    async fn put_position(&self, lesson_id: &str, position: u32) -> Result<(), BackendError> {
        self.client
            .put_watch_position(&self.user_id, lesson_id, position)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let config = SessionConfig {
            api_base_url: "http://localhost:4000/".to_string(),
            ..SessionConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/api/courses"), "http://localhost:4000/api/courses");
    }

    #[test]
    fn test_data_envelope_parses() {
        let json = r#"{ "data": { "courseId": "c-1", "courseTitle": "Intro", "modules": [] } }"#;
        let envelope: DataEnvelope<Curriculum> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.course_id, "c-1");
        assert!(envelope.data.modules.is_empty());
    }

    #[test]
    fn test_envelope_without_course_id_still_parses() {
        let json = r#"{ "data": { "courseTitle": "Rust 101", "modules": [] } }"#;
        let envelope: DataEnvelope<Curriculum> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.course_title, "Rust 101");
        assert!(envelope.data.course_id.is_empty());
    }
}
