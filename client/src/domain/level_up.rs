//! One-shot level-up events with a bounded display window.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::QuestId;

/// Raised once when a completion lifts the user to a higher level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpEvent {
    /// Level reached.
    pub new_level: u32,
    /// Level held before the completion.
    pub previous_level: u32,
    /// Quest whose completion triggered the event.
    pub quest_id: QuestId,
    /// Reward of that quest, for the celebration text.
    pub exp_reward: u64,
    /// Achievement labels unlocked in the same completion.
    pub unlocked_achievements: Vec<String>,
    /// When the controller observed the level-up.
    pub raised_at: DateTime<Utc>,
    /// How long presentation layers should keep the celebration visible.
    pub display_for: Duration,
}

impl LevelUpEvent {
    /// Instant after which the celebration should be dismissed.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let window = TimeDelta::from_std(self.display_for).unwrap_or(TimeDelta::MAX);
        self.raised_at
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the celebration is still showing at `now`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    ///
    /// use chrono::{TimeDelta, Utc};
    /// use tidequest::domain::{LevelUpEvent, QuestId};
    ///
    /// let raised_at = Utc::now();
    /// let event = LevelUpEvent {
    ///     new_level: 4,
    ///     previous_level: 3,
    ///     quest_id: QuestId::new(1).expect("valid id"),
    ///     exp_reward: 50,
    ///     unlocked_achievements: Vec::new(),
    ///     raised_at,
    ///     display_for: Duration::from_secs(5),
    /// };
    /// assert!(event.is_active(raised_at + TimeDelta::seconds(4)));
    /// assert!(!event.is_active(raised_at + TimeDelta::seconds(5)));
    /// ```
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now >= self.raised_at && now < self.expires_at()
    }

    /// Number of levels gained in one step.
    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.previous_level)
    }
}
