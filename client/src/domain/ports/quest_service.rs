//! Driven port for the remote quest service.
//!
//! The service is the system of record for users and quests and the only
//! authority on level and experience arithmetic. The domain owns the request
//! and response shapes so adapters stay interchangeable.

use async_trait::async_trait;

use crate::domain::{Difficulty, Quest, QuestId, QuestTitle, User};

/// Payload for `POST /quests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateQuestRequest {
    /// Validated quest title.
    pub title: QuestTitle,
    /// Requested difficulty; the service derives the reward from it.
    pub difficulty: Difficulty,
    /// Free-text description. The controller always sends an empty one.
    pub description: String,
}

/// Authoritative outcome of `POST /quests/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionResult {
    /// Level after the completion.
    pub new_level: u32,
    /// Cumulative experience after the completion.
    pub total_exp: u64,
    /// Experience within `new_level`, when the service reports it.
    pub exp: Option<u64>,
    /// Display labels for achievements unlocked by this completion.
    pub unlocked_achievements: Vec<String>,
}

/// Errors surfaced while calling the quest service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestServiceError {
    /// Network transport failed or the service answered with a server error.
    #[error("quest service transport failed: {message}")]
    Transport { message: String },
    /// The call exceeded its timeout.
    #[error("quest service timeout: {message}")]
    Timeout { message: String },
    /// The quest or user does not exist.
    #[error("quest service could not find resource: {message}")]
    NotFound { message: String },
    /// The quest was already completed.
    #[error("quest already completed: {message}")]
    AlreadyCompleted { message: String },
    /// The service refused the request.
    #[error("quest service rejected request: {message}")]
    Rejected { message: String },
    /// The response body could not be decoded.
    #[error("quest service response decode failed: {message}")]
    Decode { message: String },
}

impl QuestServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn already_completed(message: impl Into<String>) -> Self {
        Self::AlreadyCompleted {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Port for reading and mutating quests on the quest service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestService: Send + Sync {
    /// Fetch the session's demo user (`GET /users/demo`).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use tidequest::domain::ports::{FixtureQuestService, QuestService};
    ///
    /// let user = FixtureQuestService.fetch_demo_user().await?;
    /// assert_eq!(user.stats().level(), 1);
    /// # Ok::<(), tidequest::domain::ports::QuestServiceError>(())
    /// ```
    async fn fetch_demo_user(&self) -> Result<User, QuestServiceError>;

    /// Fetch every quest, newest first (`GET /quests`).
    async fn list_quests(&self) -> Result<Vec<Quest>, QuestServiceError>;

    /// Create a pending quest (`POST /quests`).
    async fn create_quest(&self, request: &CreateQuestRequest) -> Result<Quest, QuestServiceError>;

    /// Complete a pending quest (`POST /quests/{id}/complete`).
    async fn complete_quest(&self, id: QuestId) -> Result<CompletionResult, QuestServiceError>;

    /// Delete a quest in any state (`DELETE /quests/{id}`).
    async fn delete_quest(&self, id: QuestId) -> Result<(), QuestServiceError>;

    /// Ask the service to synthesise a demo batch (`POST /quests/demo/generate`).
    async fn generate_demo_quests(&self) -> Result<(), QuestServiceError>;
}

/// Fixture implementation with an empty collection and a fresh user.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureQuestService;

#[async_trait]
impl QuestService for FixtureQuestService {
    async fn fetch_demo_user(&self) -> Result<User, QuestServiceError> {
        Ok(User::new("fixture", crate::domain::UserStats::default()))
    }

    async fn list_quests(&self) -> Result<Vec<Quest>, QuestServiceError> {
        Ok(Vec::new())
    }

    async fn create_quest(&self, request: &CreateQuestRequest) -> Result<Quest, QuestServiceError> {
        let id = QuestId::new(1).map_err(|error| QuestServiceError::rejected(error.to_string()))?;
        Ok(Quest::new(id, request.title.clone(), request.difficulty))
    }

    async fn complete_quest(&self, id: QuestId) -> Result<CompletionResult, QuestServiceError> {
        Err(QuestServiceError::not_found(format!("quest {id}")))
    }

    async fn delete_quest(&self, id: QuestId) -> Result<(), QuestServiceError> {
        Err(QuestServiceError::not_found(format!("quest {id}")))
    }

    async fn generate_demo_quests(&self) -> Result<(), QuestServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Fixture behaviour and error rendering for the quest service port.

    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::{ControllerSettings, ProgressionController};

    #[rstest]
    #[case(QuestServiceError::transport("reset"), "quest service transport failed: reset")]
    #[case(QuestServiceError::timeout("10s"), "quest service timeout: 10s")]
    #[case(QuestServiceError::already_completed("quest 2"), "quest already completed: quest 2")]
    #[case(
        QuestServiceError::decode("eof"),
        "quest service response decode failed: eof"
    )]
    fn errors_render_their_context(#[case] error: QuestServiceError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[tokio::test]
    async fn fixture_creates_and_refuses_unknown_ids() {
        let request = CreateQuestRequest {
            title: QuestTitle::new("Rinse the shells").expect("valid title"),
            difficulty: Difficulty::Hard,
            description: String::new(),
        };
        let quest = FixtureQuestService
            .create_quest(&request)
            .await
            .expect("fixture create");
        assert_eq!(quest.exp_reward(), 50);

        let missing = FixtureQuestService.complete_quest(quest.id()).await;
        assert!(matches!(missing, Err(QuestServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn fixture_backs_an_empty_session() {
        let controller = ProgressionController::new(
            Arc::new(FixtureQuestService),
            ControllerSettings::default(),
        );
        controller.initialize().await.expect("fixture initializes");

        let progress = controller.progress().expect("user loaded");
        assert_eq!(progress.level, 1);
        assert!(controller.list_quests().is_empty());
    }
}
