//! Domain ports and supporting types for the hexagonal boundary.

mod quest_service;

#[cfg(test)]
pub use quest_service::MockQuestService;
pub use quest_service::{
    CompletionResult, CreateQuestRequest, FixtureQuestService, QuestService, QuestServiceError,
};
