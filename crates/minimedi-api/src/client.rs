// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the conversational endpoint and the record endpoints.
//!
//! Provides [`ApiClient`] which handles request construction, bearer
//! authentication, status classification, and transient error retry for
//! the model call.

use std::time::Duration;

use async_trait::async_trait;
use minimedi_config::model::ApiConfig;
use minimedi_core::{
    MinimediError, ModelService, NewSessionRecord, RecordBackend, RecordId, RecordPatch,
    SessionRecord, Turn,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::types::{AiCheckRequest, AiCheckResponse, ApiErrorResponse, ClearRecordsResponse};

/// HTTP client for the MiniMedi backend.
///
/// Record writes are sent once; the reconciler retries them on the next
/// payload-bearing turn. Only the model call retries on transient statuses.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ApiClient {
    /// Creates a client from the `[api]` configuration section.
    pub fn new(config: &ApiConfig) -> Result<Self, MinimediError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                MinimediError::Config(format!("invalid auth token header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MinimediError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the transcript to `POST /ai-check/` and returns the raw reply.
    ///
    /// Transient statuses (429, 500, 502, 503, 529) are retried up to
    /// `max_retries` times after `retry_backoff`.
    pub async fn ai_check(&self, transcript: &[Turn]) -> Result<String, MinimediError> {
        let url = self.endpoint("/ai-check/");
        let body = AiCheckRequest {
            messages: transcript,
        };

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, "retrying model request after transient error");
                tokio::time::sleep(self.retry_backoff).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(transport_err)?;

            let status = response.status();
            debug!(status = %status, attempt, turns = transcript.len(), "model response received");

            if status.is_success() {
                let text = response.text().await.map_err(transport_err)?;
                let parsed: AiCheckResponse =
                    serde_json::from_str(&text).map_err(|e| MinimediError::Transport {
                        message: format!("failed to parse model response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(parsed.response);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                attempt += 1;
                continue;
            }

            return Err(MinimediError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&body),
            });
        }
    }

    /// Creates a record with `POST /symptoms/`.
    pub async fn create_symptom(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionRecord, MinimediError> {
        let response = self
            .client
            .post(self.endpoint("/symptoms/"))
            .json(record)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_err)?;
        debug!(status = %status, "create record response received");

        if !status.is_success() {
            return Err(MinimediError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| MinimediError::Transport {
            message: format!("failed to parse created record: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Applies a partial update with `PATCH /symptoms/{id}/`.
    pub async fn patch_symptom(
        &self,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<(), MinimediError> {
        let response = self
            .client
            .patch(self.endpoint(&format!("/symptoms/{id}/")))
            .json(patch)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        debug!(status = %status, record_id = id.as_str(), "update record response received");

        if status == StatusCode::NOT_FOUND {
            return Err(MinimediError::RecordNotFound { id: id.clone() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinimediError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&body),
            });
        }
        Ok(())
    }

    /// Lists saved records with `GET /symptoms/`, newest first.
    pub async fn list_symptoms(&self) -> Result<Vec<SessionRecord>, MinimediError> {
        let response = self
            .client
            .get(self.endpoint("/symptoms/"))
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_err)?;
        debug!(status = %status, "list records response received");

        if !status.is_success() {
            return Err(MinimediError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| MinimediError::Transport {
            message: format!("failed to parse record list: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Deletes one record with `DELETE /symptoms/{id}/`.
    pub async fn delete_symptom(&self, id: &RecordId) -> Result<(), MinimediError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/symptoms/{id}/")))
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        debug!(status = %status, record_id = id.as_str(), "delete record response received");

        if status == StatusCode::NOT_FOUND {
            return Err(MinimediError::RecordNotFound { id: id.clone() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinimediError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&body),
            });
        }
        Ok(())
    }

    /// Deletes every saved record with `DELETE /symptoms/clear-all/`.
    pub async fn clear_symptoms(&self) -> Result<u64, MinimediError> {
        let response = self
            .client
            .delete(self.endpoint("/symptoms/clear-all/"))
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_err)?;
        debug!(status = %status, "clear records response received");

        if !status.is_success() {
            return Err(MinimediError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&body),
            });
        }

        let parsed: ClearRecordsResponse =
            serde_json::from_str(&body).map_err(|e| MinimediError::Transport {
                message: format!("failed to parse clear response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.deleted_count)
    }
}

#[async_trait]
impl ModelService for ApiClient {
    async fn converse(&self, transcript: &[Turn]) -> Result<String, MinimediError> {
        self.ai_check(transcript).await
    }
}

#[async_trait]
impl RecordBackend for ApiClient {
    async fn create_record(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionRecord, MinimediError> {
        self.create_symptom(record).await
    }

    async fn update_record(
        &self,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<(), MinimediError> {
        self.patch_symptom(id, patch).await
    }

    async fn list_records(&self) -> Result<Vec<SessionRecord>, MinimediError> {
        self.list_symptoms().await
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), MinimediError> {
        self.delete_symptom(id).await
    }

    async fn clear_records(&self) -> Result<u64, MinimediError> {
        self.clear_symptoms().await
    }
}

fn transport_err(e: reqwest::Error) -> MinimediError {
    MinimediError::Transport {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimedi_core::Severity;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, token: Option<&str>) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            auth_token: token.map(str::to_string),
            timeout_secs: 5,
            max_retries: 1,
            retry_backoff_ms: 10,
        })
        .unwrap()
    }

    fn new_record() -> NewSessionRecord {
        NewSessionRecord {
            patient_name: "John".into(),
            title: "Health Analysis Report".into(),
            description: "headache".into(),
            ai_analysis: "Thanks John.".into(),
            age: 30,
            gender: "male".into(),
            duration: 2,
            severity: Severity::Medium,
            risk_score: 33,
        }
    }

    #[tokio::test]
    async fn ai_check_sends_transcript_and_returns_reply() {
        let server = MockServer::start().await;
        let turns = vec![Turn::assistant("Hello! name?"), Turn::user("John")];

        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .and(body_json(serde_json::json!({"messages": [
                {"role": "assistant", "content": "Hello! name?"},
                {"role": "user", "content": "John"}
            ]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "Nice to meet you"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let reply = client.converse(&turns).await.unwrap();
        assert_eq!(reply, "Nice to meet you");
    }

    #[tokio::test]
    async fn ai_check_retries_on_503() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "ok"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        assert_eq!(client.converse(&[]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn ai_check_surfaces_server_error_after_retries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "model offline"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let err = client.converse(&[]).await.unwrap_err();
        match err {
            MinimediError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model offline");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ai_check_does_not_retry_client_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "Messages required"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        assert!(matches!(
            client.converse(&[]).await,
            Err(MinimediError::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn ai_check_rejects_body_without_response_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": 1})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        assert!(matches!(
            client.converse(&[]).await,
            Err(MinimediError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn create_record_posts_full_field_set() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/symptoms/"))
            .and(body_json(serde_json::json!({
                "patient_name": "John",
                "title": "Health Analysis Report",
                "description": "headache",
                "ai_analysis": "Thanks John.",
                "age": 30,
                "gender": "male",
                "duration": 2,
                "severity": "MEDIUM",
                "risk_score": 33
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": 41, "patient_name": "John"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let created = client.create_record(&new_record()).await.unwrap();
        assert_eq!(created.id, RecordId::from("41"));
    }

    #[tokio::test]
    async fn create_record_surfaces_validation_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/symptoms/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"title": ["This field is required."]})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        assert!(matches!(
            client.create_record(&new_record()).await,
            Err(MinimediError::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn update_record_sends_only_present_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/symptoms/41/"))
            .and(body_json(serde_json::json!({"duration": 3, "ai_analysis": "summary"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 41})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let patch = RecordPatch {
            duration: Some(3),
            ..RecordPatch::analysis("summary")
        };
        client
            .update_record(&RecordId::from("41"), &patch)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_record_maps_404_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/symptoms/99/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(
                serde_json::json!({"error": "Symptom not found or unauthorized"}),
            ))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let err = client
            .update_record(&RecordId::from("99"), &RecordPatch::analysis("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, MinimediError::RecordNotFound { id } if id.as_str() == "99"));
    }

    #[tokio::test]
    async fn client_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ai-check/"))
            .and(header("authorization", "Bearer tok-1"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok-1"));
        assert!(client.converse(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn list_records_decodes_backend_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/symptoms/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 12, "patient_name": "John", "title": "Health Analysis Report",
                 "severity": "MEDIUM", "risk_score": 41, "duration": 3,
                 "created_at": "2026-03-02T09:00:00Z"},
                {"id": 7, "patient_name": null, "title": "Health Analysis Report",
                 "severity": "LOW", "risk_score": 0, "duration": null,
                 "created_at": "2026-03-01T09:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let records = client.list_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId::from("12"));
        assert_eq!(records[0].severity, Some(Severity::Medium));
        assert_eq!(records[1].id, RecordId::from("7"));
        assert_eq!(records[1].patient_name, None);
    }

    #[tokio::test]
    async fn list_records_surfaces_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/symptoms/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"detail": "Authentication credentials were not provided."}),
            ))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        match client.list_records().await.unwrap_err() {
            MinimediError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Authentication credentials were not provided.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_record_accepts_no_content() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/symptoms/41/"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok-1"));
        client.delete_record(&RecordId::from("41")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_record_maps_404_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/symptoms/99/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(
                serde_json::json!({"error": "Symptom not found or unauthorized"}),
            ))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let err = client.delete_record(&RecordId::from("99")).await.unwrap_err();
        assert!(matches!(err, MinimediError::RecordNotFound { id } if id.as_str() == "99"));
    }

    #[tokio::test]
    async fn clear_records_returns_deleted_count() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/symptoms/clear-all/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "All symptoms cleared successfully",
                "deleted_count": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        assert_eq!(client.clear_records().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn clear_records_surfaces_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/symptoms/clear-all/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        assert!(matches!(
            client.clear_records().await,
            Err(MinimediError::Api { status: 500, .. })
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = test_client("http://localhost:8000/api/", None);
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.endpoint("/symptoms/"),
            "http://localhost:8000/api/symptoms/"
        );
    }
}
