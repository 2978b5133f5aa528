//! Reqwest-backed quest service adapter.
//!
//! This adapter owns transport details only: URL building, request timeout,
//! HTTP error mapping, and JSON decoding into domain values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{CompletionDto, CreateQuestDto, QuestDto, UserDto};
use crate::domain::ports::{CompletionResult, CreateQuestRequest, QuestService, QuestServiceError};
use crate::domain::{Quest, QuestId, User};

const USER_AGENT: &str = concat!("tidequest/", env!("CARGO_PKG_VERSION"));

/// Which call a failed status belongs to; completion maps conflicts specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Read,
    Create,
    Complete,
    Delete,
    GenerateDemo,
}

/// Quest service adapter talking JSON over HTTP to one base URL.
pub struct HttpQuestService {
    client: Client,
    base: Url,
}

impl HttpQuestService {
    /// Build an adapter whose requests time out after `timeout`.
    /// ```rust,ignore
    /// let service = HttpQuestService::new(Url::parse("http://localhost:8000")?, timeout)?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, QuestServiceError> {
        endpoint_url(&self.base, path)
    }

    async fn send(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, QuestServiceError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(?operation, status = status.as_u16(), bytes = body.len(), "quest service responded");
        if !status.is_success() {
            return Err(map_status_error(operation, status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl QuestService for HttpQuestService {
    async fn fetch_demo_user(&self) -> Result<User, QuestServiceError> {
        let url = self.endpoint("users/demo")?;
        let body = self.send(Operation::Read, self.client.get(url)).await?;
        decode::<UserDto>(&body)?
            .into_domain()
            .map_err(QuestServiceError::decode)
    }

    async fn list_quests(&self) -> Result<Vec<Quest>, QuestServiceError> {
        let url = self.endpoint("quests")?;
        let body = self.send(Operation::Read, self.client.get(url)).await?;
        decode::<Vec<QuestDto>>(&body)?
            .into_iter()
            .map(QuestDto::into_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(QuestServiceError::decode)
    }

    async fn create_quest(&self, request: &CreateQuestRequest) -> Result<Quest, QuestServiceError> {
        let url = self.endpoint("quests")?;
        let payload = CreateQuestDto::from(request);
        let body = self
            .send(Operation::Create, self.client.post(url).json(&payload))
            .await?;
        decode::<QuestDto>(&body)?
            .into_domain()
            .map_err(QuestServiceError::decode)
    }

    async fn complete_quest(&self, id: QuestId) -> Result<CompletionResult, QuestServiceError> {
        let url = self.endpoint(&format!("quests/{id}/complete"))?;
        let body = self.send(Operation::Complete, self.client.post(url)).await?;
        Ok(decode::<CompletionDto>(&body)?.into())
    }

    async fn delete_quest(&self, id: QuestId) -> Result<(), QuestServiceError> {
        let url = self.endpoint(&format!("quests/{id}"))?;
        self.send(Operation::Delete, self.client.delete(url)).await?;
        Ok(())
    }

    async fn generate_demo_quests(&self) -> Result<(), QuestServiceError> {
        let url = self.endpoint("quests/demo/generate")?;
        self.send(Operation::GenerateDemo, self.client.post(url)).await?;
        Ok(())
    }
}

/// Resolve `path` under `{base}/api/`, keeping any path prefix on `base`.
fn endpoint_url(base: &Url, path: &str) -> Result<Url, QuestServiceError> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let with_slash = format!("{}/", root.path());
        root.set_path(&with_slash);
    }
    root.join("api/")
        .and_then(|api| api.join(path))
        .map_err(|error| QuestServiceError::rejected(format!("invalid endpoint {path}: {error}")))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, QuestServiceError> {
    serde_json::from_slice(body).map_err(|error| {
        QuestServiceError::decode(format!(
            "invalid quest service JSON: {error}; body: {}",
            body_preview(body)
        ))
    })
}

fn map_transport_error(error: reqwest::Error) -> QuestServiceError {
    if error.is_timeout() {
        QuestServiceError::timeout(error.to_string())
    } else {
        QuestServiceError::transport(error.to_string())
    }
}

fn map_status_error(operation: Operation, status: StatusCode, body: &[u8]) -> QuestServiceError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::NOT_FOUND => QuestServiceError::not_found(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT if operation == Operation::Complete => {
            QuestServiceError::already_completed(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            QuestServiceError::timeout(message)
        }
        _ if status.is_client_error() => QuestServiceError::rejected(message),
        _ => QuestServiceError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = compact.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHAR_LIMIT).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Status mapping, URL building, and decoding without network access.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("http://localhost:8000", "quests", "http://localhost:8000/api/quests")]
    #[case::trailing_slash("http://localhost:8000/", "users/demo", "http://localhost:8000/api/users/demo")]
    #[case::prefixed("https://example.test/quest-svc", "quests/7/complete", "https://example.test/quest-svc/api/quests/7/complete")]
    fn builds_endpoints_under_api_prefix(
        #[case] base: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let base = Url::parse(base).expect("valid base");
        let url = endpoint_url(&base, path).expect("endpoint builds");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case::missing_quest(Operation::Complete, StatusCode::NOT_FOUND, "NotFound")]
    #[case::completed_twice(Operation::Complete, StatusCode::BAD_REQUEST, "AlreadyCompleted")]
    #[case::completion_conflict(Operation::Complete, StatusCode::CONFLICT, "AlreadyCompleted")]
    #[case::bad_create(Operation::Create, StatusCode::BAD_REQUEST, "Rejected")]
    #[case::unprocessable(Operation::Create, StatusCode::UNPROCESSABLE_ENTITY, "Rejected")]
    #[case::request_timeout(Operation::Read, StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(Operation::Delete, StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::server_error(Operation::GenerateDemo, StatusCode::INTERNAL_SERVER_ERROR, "Transport")]
    fn maps_http_statuses_to_port_errors(
        #[case] operation: Operation,
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(operation, status, b"{\"detail\": \"nope\"}");
        let matched = match expected {
            "NotFound" => matches!(error, QuestServiceError::NotFound { .. }),
            "AlreadyCompleted" => matches!(error, QuestServiceError::AlreadyCompleted { .. }),
            "Rejected" => matches!(error, QuestServiceError::Rejected { .. }),
            "Timeout" => matches!(error, QuestServiceError::Timeout { .. }),
            "Transport" => matches!(error, QuestServiceError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} during {operation:?} mapped to {error:?}");
    }

    #[test]
    fn status_messages_carry_compacted_body() {
        let error = map_status_error(
            Operation::Read,
            StatusCode::BAD_GATEWAY,
            b"upstream\n\n   unavailable",
        );
        assert_eq!(
            error,
            QuestServiceError::transport("status 502: upstream unavailable")
        );
    }

    #[test]
    fn body_preview_truncates_long_bodies() {
        let body = "x".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
        assert_eq!(body_preview(b"short"), "short");
    }

    #[test]
    fn decodes_quest_listing_newest_first() {
        let body = br#"[
            {
                "id": 2, "user_id": 1, "title": "Sort the nets", "description": null,
                "difficulty": "HARD", "exp_reward": 50, "status": "COMPLETED",
                "created_at": "2026-03-01T09:00:00", "completed_at": "2026-03-01T10:00:00"
            },
            {
                "id": 1, "user_id": 1, "title": "Feed the turtle", "description": "daily",
                "difficulty": "EASY", "exp_reward": 10, "status": "PENDING",
                "created_at": "2026-02-28T09:00:00"
            }
        ]"#;

        let quests = decode::<Vec<QuestDto>>(body)
            .expect("json decodes")
            .into_iter()
            .map(QuestDto::into_domain)
            .collect::<Result<Vec<_>, _>>()
            .expect("quests map");

        assert_eq!(quests.len(), 2);
        assert_eq!(quests[0].id().get(), 2);
        assert!(!quests[0].is_pending());
        assert_eq!(quests[1].description(), Some("daily"));
        assert_eq!(quests[1].exp_reward(), 10);
    }

    #[test]
    fn decodes_demo_user_with_stats() {
        let body = br#"{
            "id": 1, "username": "Ocean Explorer", "created_at": "2026-01-01T00:00:00",
            "stats": {
                "id": 1, "user_id": 1, "level": 5, "exp": 450, "total_exp": 450,
                "class_type": "WARRIOR", "streak_days": 3, "quests_completed": 15,
                "last_active": "2026-01-01", "exp_to_next_level": 56
            }
        }"#;

        let user = decode::<UserDto>(body)
            .expect("json decodes")
            .into_domain()
            .expect("user maps");

        assert_eq!(user.username(), "Ocean Explorer");
        assert_eq!(user.stats().level(), 5);
        assert_eq!(user.stats().streak_days(), 3);
        assert_eq!(user.stats().exp_to_next_level(), Some(56));
    }

    #[test]
    fn completion_without_exp_keeps_it_absent() {
        let body = br#"{"new_level": 6, "total_exp": 525, "unlocked_achievements": ["First Dive"]}"#;

        let result: CompletionResult = decode::<CompletionDto>(body).expect("json decodes").into();

        assert_eq!(result.new_level, 6);
        assert_eq!(result.exp, None);
        assert_eq!(result.unlocked_achievements, vec!["First Dive".to_owned()]);
    }

    #[test]
    fn undecodable_json_maps_to_decode_error() {
        let error = decode::<CompletionDto>(b"<html>oops</html>").expect_err("not json");
        assert!(matches!(error, QuestServiceError::Decode { .. }));
    }
}
