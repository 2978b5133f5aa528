//! Wire DTOs for the quest service JSON API.
//!
//! Responses decode into these shapes first and are then mapped into domain
//! values in one pass, so validation failures surface as decode errors.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CompletionResult, CreateQuestRequest};
use crate::domain::{
    Difficulty, Quest, QuestId, QuestParts, QuestStatus, QuestTitle, User, UserStats,
};

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) username: String,
    #[serde(default)]
    pub(super) stats: Option<UserStatsDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserStatsDto {
    pub(super) level: u32,
    pub(super) exp: u64,
    pub(super) total_exp: u64,
    #[serde(default)]
    pub(super) quests_completed: u64,
    #[serde(default)]
    pub(super) streak_days: u32,
    #[serde(default)]
    pub(super) exp_to_next_level: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QuestDto {
    pub(super) id: u64,
    pub(super) title: String,
    #[serde(default)]
    pub(super) description: Option<String>,
    pub(super) difficulty: Difficulty,
    pub(super) exp_reward: u64,
    pub(super) status: QuestStatusDto,
    #[serde(default)]
    pub(super) created_at: Option<String>,
    #[serde(default)]
    pub(super) completed_at: Option<String>,
}

/// Service quest status. Anything but `COMPLETED` is still open to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum QuestStatusDto {
    Completed,
    #[serde(other)]
    Open,
}

impl From<QuestStatusDto> for QuestStatus {
    fn from(dto: QuestStatusDto) -> Self {
        match dto {
            QuestStatusDto::Completed => Self::Completed,
            QuestStatusDto::Open => Self::Pending,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CompletionDto {
    pub(super) new_level: u32,
    pub(super) total_exp: u64,
    #[serde(default)]
    pub(super) exp: Option<u64>,
    #[serde(default)]
    pub(super) unlocked_achievements: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateQuestDto<'a> {
    pub(super) title: &'a str,
    pub(super) description: &'a str,
    pub(super) difficulty: Difficulty,
}

impl<'a> From<&'a CreateQuestRequest> for CreateQuestDto<'a> {
    fn from(request: &'a CreateQuestRequest) -> Self {
        Self {
            title: request.title.as_ref(),
            description: request.description.as_str(),
            difficulty: request.difficulty,
        }
    }
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<User, String> {
        let stats = match self.stats {
            Some(stats) => stats.into_domain()?,
            None => UserStats::default(),
        };
        Ok(User::new(self.username, stats))
    }
}

impl UserStatsDto {
    fn into_domain(self) -> Result<UserStats, String> {
        let stats = UserStats::new(self.level, self.exp, self.total_exp, self.quests_completed)
            .map_err(|error| format!("invalid user stats: {error}"))?;
        Ok(stats
            .with_streak_days(self.streak_days)
            .with_exp_to_next_level(self.exp_to_next_level))
    }
}

impl QuestDto {
    pub(super) fn into_domain(self) -> Result<Quest, String> {
        let id = QuestId::new(self.id).map_err(|error| format!("quest id {}: {error}", self.id))?;
        let title = QuestTitle::new(&self.title).map_err(|error| format!("quest {id}: {error}"))?;
        let created_at = self
            .created_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|error| format!("quest {id} created_at: {error}"))?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|error| format!("quest {id} completed_at: {error}"))?;

        Ok(Quest::from_parts(QuestParts {
            id,
            title,
            description: self.description.filter(|text| !text.is_empty()),
            difficulty: self.difficulty,
            exp_reward: self.exp_reward,
            status: self.status.into(),
            created_at,
            completed_at,
        }))
    }
}

impl From<CompletionDto> for CompletionResult {
    fn from(dto: CompletionDto) -> Self {
        Self {
            new_level: dto.new_level,
            total_exp: dto.total_exp,
            exp: dto.exp,
            unlocked_achievements: dto.unlocked_achievements,
        }
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one taken as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|error| format!("invalid timestamp {raw:?}: {error}"))
}
