//! Quest data model.
//!
//! A quest is created `Pending`, moves to `Completed` exactly once, and can be
//! deleted from either state. Its experience reward is fixed by difficulty at
//! creation time.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length accepted by the quest service.
pub const QUEST_TITLE_MAX: usize = 200;

/// Validation errors returned by [`QuestTitle::new`] and [`QuestId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    InvalidId,
}

impl fmt::Display for QuestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "quest title must not be empty"),
            Self::TitleTooLong { max } => {
                write!(f, "quest title must be at most {max} characters")
            }
            Self::InvalidId => write!(f, "quest id must be a positive integer"),
        }
    }
}

impl std::error::Error for QuestValidationError {}

/// Service-assigned quest identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct QuestId(u64);

impl QuestId {
    /// Validate and construct a [`QuestId`].
    ///
    /// # Examples
    /// ```
    /// use tidequest::domain::QuestId;
    ///
    /// assert!(QuestId::new(7).is_ok());
    /// assert!(QuestId::new(0).is_err());
    /// ```
    pub fn new(raw: u64) -> Result<Self, QuestValidationError> {
        if raw == 0 {
            return Err(QuestValidationError::InvalidId);
        }
        Ok(Self(raw))
    }

    /// Raw numeric identifier used in request paths.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<QuestId> for u64 {
    fn from(value: QuestId) -> Self {
        value.0
    }
}

impl TryFrom<u64> for QuestId {
    type Error = QuestValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Trimmed, non-blank quest title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestTitle(String);

impl QuestTitle {
    /// Validate and construct a [`QuestTitle`]. Surrounding whitespace is
    /// stripped before the checks run.
    ///
    /// # Examples
    /// ```
    /// use tidequest::domain::QuestTitle;
    ///
    /// let title = QuestTitle::new("  Write the README ").expect("valid title");
    /// assert_eq!(title.as_ref(), "Write the README");
    /// assert!(QuestTitle::new("   ").is_err());
    /// ```
    pub fn new(title: impl AsRef<str>) -> Result<Self, QuestValidationError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(QuestValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > QUEST_TITLE_MAX {
            return Err(QuestValidationError::TitleTooLong {
                max: QUEST_TITLE_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for QuestTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for QuestTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<QuestTitle> for String {
    fn from(value: QuestTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for QuestTitle {
    type Error = QuestValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Quest difficulty, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Epic,
    Legendary,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Normal
    }
}

impl Difficulty {
    /// Every difficulty in display order.
    pub const ALL: [Self; 5] = [
        Self::Easy,
        Self::Normal,
        Self::Hard,
        Self::Epic,
        Self::Legendary,
    ];

    /// Experience granted when a quest of this difficulty is completed.
    ///
    /// # Examples
    /// ```
    /// use tidequest::domain::Difficulty;
    ///
    /// assert_eq!(Difficulty::Legendary.exp_reward(), 200);
    /// ```
    pub const fn exp_reward(self) -> u64 {
        match self {
            Self::Easy => 10,
            Self::Normal => 25,
            Self::Hard => 50,
            Self::Epic => 100,
            Self::Legendary => 200,
        }
    }

    /// One-based display rank.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Normal => 2,
            Self::Hard => 3,
            Self::Epic => 4,
            Self::Legendary => 5,
        }
    }

    /// Wire label used by the quest service.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Normal => "NORMAL",
            Self::Hard => "HARD",
            Self::Epic => "EPIC",
            Self::Legendary => "LEGENDARY",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown difficulty: {value}"))
    }
}

/// Quest lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    Pending,
    Completed,
}

/// A quest as last reported by the quest service.
///
/// ## Invariants
/// - `exp_reward` is fixed at creation and never recomputed locally.
/// - `status` only moves from `Pending` to `Completed`.
///
/// Not (de)serialisable: quests enter the domain through
/// [`Quest::from_parts`] after the adapter has validated the wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    id: QuestId,
    title: QuestTitle,
    description: Option<String>,
    difficulty: Difficulty,
    exp_reward: u64,
    status: QuestStatus,
    created_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    /// Build a pending quest whose reward follows the difficulty table.
    pub fn new(id: QuestId, title: QuestTitle, difficulty: Difficulty) -> Self {
        Self {
            id,
            title,
            description: None,
            difficulty,
            exp_reward: difficulty.exp_reward(),
            status: QuestStatus::Pending,
            created_at: None,
            completed_at: None,
        }
    }

    /// Rehydrate a quest from a service snapshot.
    pub fn from_parts(parts: QuestParts) -> Self {
        let QuestParts {
            id,
            title,
            description,
            difficulty,
            exp_reward,
            status,
            created_at,
            completed_at,
        } = parts;
        Self {
            id,
            title,
            description,
            difficulty,
            exp_reward,
            status,
            created_at,
            completed_at,
        }
    }

    /// Attach an optional description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Attach a creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn id(&self) -> QuestId {
        self.id
    }

    pub fn title(&self) -> &QuestTitle {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn exp_reward(&self) -> u64 {
        self.exp_reward
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Whether the quest is still waiting to be completed.
    pub fn is_pending(&self) -> bool {
        self.status == QuestStatus::Pending
    }

    /// Move the quest to `Completed`. Returns `false` when it already was.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = QuestStatus::Completed;
        self.completed_at = Some(at);
        true
    }
}

/// Raw fields used by [`Quest::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestParts {
    pub id: QuestId,
    pub title: QuestTitle,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub exp_reward: u64,
    pub status: QuestStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
