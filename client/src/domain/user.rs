//! User data model and the single stats transition applied on completion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ports::CompletionResult;

/// Errors raised when a stats snapshot or transition breaks an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatsError {
    /// Level must be at least 1.
    ZeroLevel,
    /// Within-level experience exceeded cumulative experience.
    ExpExceedsTotal { exp: u64, total_exp: u64 },
    /// The service reported a lower level than the one already held.
    LevelRegressed { previous: u32, reported: u32 },
    /// The service reported less cumulative experience than already held.
    TotalExpRegressed { previous: u64, reported: u64 },
}

impl fmt::Display for UserStatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLevel => write!(f, "level must be at least 1"),
            Self::ExpExceedsTotal { exp, total_exp } => {
                write!(f, "exp {exp} exceeds total exp {total_exp}")
            }
            Self::LevelRegressed { previous, reported } => {
                write!(f, "level regressed from {previous} to {reported}")
            }
            Self::TotalExpRegressed { previous, reported } => {
                write!(f, "total exp regressed from {previous} to {reported}")
            }
        }
    }
}

impl std::error::Error for UserStatsError {}

/// Progression counters for one user.
///
/// ## Invariants
/// - `level >= 1`
/// - `total_exp >= exp`
/// - `level`, `total_exp`, and `quests_completed` never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserStatsRecord", into = "UserStatsRecord")]
pub struct UserStats {
    level: u32,
    exp: u64,
    total_exp: u64,
    quests_completed: u64,
    streak_days: u32,
    exp_to_next_level: Option<u64>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0,
            total_exp: 0,
            quests_completed: 0,
            streak_days: 0,
            exp_to_next_level: None,
        }
    }
}

impl UserStats {
    /// Validate and construct a stats snapshot.
    ///
    /// # Examples
    /// ```
    /// use tidequest::domain::UserStats;
    ///
    /// let stats = UserStats::new(5, 112, 450, 15).expect("valid stats");
    /// assert_eq!(stats.level(), 5);
    /// assert!(UserStats::new(1, 10, 5, 0).is_err());
    /// ```
    pub fn new(
        level: u32,
        exp: u64,
        total_exp: u64,
        quests_completed: u64,
    ) -> Result<Self, UserStatsError> {
        if level == 0 {
            return Err(UserStatsError::ZeroLevel);
        }
        if exp > total_exp {
            return Err(UserStatsError::ExpExceedsTotal { exp, total_exp });
        }
        Ok(Self {
            level,
            exp,
            total_exp,
            quests_completed,
            streak_days: 0,
            exp_to_next_level: None,
        })
    }

    /// Attach the streak counter reported by the service.
    #[must_use]
    pub fn with_streak_days(mut self, streak_days: u32) -> Self {
        self.streak_days = streak_days;
        self
    }

    /// Attach the service's remaining-experience hint.
    #[must_use]
    pub fn with_exp_to_next_level(mut self, remaining: Option<u64>) -> Self {
        self.exp_to_next_level = remaining;
        self
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn exp(&self) -> u64 {
        self.exp
    }

    pub fn total_exp(&self) -> u64 {
        self.total_exp
    }

    pub fn quests_completed(&self) -> u64 {
        self.quests_completed
    }

    pub fn streak_days(&self) -> u32 {
        self.streak_days
    }

    pub fn exp_to_next_level(&self) -> Option<u64> {
        self.exp_to_next_level
    }

    /// Apply a confirmed completion and return the level held beforehand.
    ///
    /// `level` and `total_exp` are copied from the service. `exp` follows the
    /// service's within-level value when present; otherwise the previous
    /// value is kept, clamped to the new total. The stats are left untouched
    /// when the result would break an invariant.
    pub fn apply_completion(&mut self, result: &CompletionResult) -> Result<u32, UserStatsError> {
        let previous = self.level;
        if result.new_level == 0 {
            return Err(UserStatsError::ZeroLevel);
        }
        if result.new_level < previous {
            return Err(UserStatsError::LevelRegressed {
                previous,
                reported: result.new_level,
            });
        }
        if result.total_exp < self.total_exp {
            return Err(UserStatsError::TotalExpRegressed {
                previous: self.total_exp,
                reported: result.total_exp,
            });
        }
        // Clamping keeps `total_exp >= exp` however the service reports it.
        let exp = result.exp.unwrap_or(self.exp).min(result.total_exp);

        self.level = result.new_level;
        self.total_exp = result.total_exp;
        self.exp = exp;
        self.quests_completed = self.quests_completed.saturating_add(1);
        self.exp_to_next_level = None;
        Ok(previous)
    }
}

/// Serde shape for [`UserStats`]; decoding goes through [`UserStats::new`].
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserStatsRecord {
    level: u32,
    exp: u64,
    total_exp: u64,
    quests_completed: u64,
    #[serde(default)]
    streak_days: u32,
    #[serde(default)]
    exp_to_next_level: Option<u64>,
}

impl From<UserStats> for UserStatsRecord {
    fn from(value: UserStats) -> Self {
        let UserStats {
            level,
            exp,
            total_exp,
            quests_completed,
            streak_days,
            exp_to_next_level,
        } = value;
        Self {
            level,
            exp,
            total_exp,
            quests_completed,
            streak_days,
            exp_to_next_level,
        }
    }
}

impl TryFrom<UserStatsRecord> for UserStats {
    type Error = UserStatsError;

    fn try_from(value: UserStatsRecord) -> Result<Self, Self::Error> {
        let UserStatsRecord {
            level,
            exp,
            total_exp,
            quests_completed,
            streak_days,
            exp_to_next_level,
        } = value;
        Ok(UserStats::new(level, exp, total_exp, quests_completed)?
            .with_streak_days(streak_days)
            .with_exp_to_next_level(exp_to_next_level))
    }
}

/// The session's user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    username: String,
    stats: UserStats,
}

impl User {
    pub fn new(username: impl Into<String>, stats: UserStats) -> Self {
        Self {
            username: username.into(),
            stats,
        }
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut UserStats {
        &mut self.stats
    }
}
