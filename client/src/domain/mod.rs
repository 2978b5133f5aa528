//! Domain primitives, the progression controller, and its ports.
//!
//! Purpose: keep the quest and experience model independent of transport.
//! Adapters in `outbound` implement [`ports::QuestService`]; the
//! [`ProgressionController`] depends only on that port.
//!
//! Public surface:
//! - Error / ErrorCode: controller failures with a stable category.
//! - Quest, QuestId, QuestTitle, Difficulty, QuestStatus: the quest model.
//! - User, UserStats: the session's user and its counters.
//! - ProgressionController: session state and reconciliation with the service.
//! - progression helpers: display thresholds, service curve, cosmetic tiers.

pub mod error;
pub mod level_up;
pub mod ports;
pub mod progression;
pub mod progression_controller;
pub mod quest;
pub mod user;

pub use self::error::{Error, ErrorCode};
pub use self::level_up::LevelUpEvent;
pub use self::progression::{
    CreatureTier, DepthTier, exp_to_next_level, exp_within_level, experience_required_for_level,
    level_for_total_exp, total_exp_for_level,
};
pub use self::progression_controller::{
    BatchFailure, BatchReport, BatchSleeper, CompletionOutcome, ControllerRuntime,
    ControllerSettings, ProgressSnapshot, ProgressionController, TokioSleeper,
};
pub use self::quest::{
    Difficulty, QUEST_TITLE_MAX, Quest, QuestId, QuestParts, QuestStatus, QuestTitle,
    QuestValidationError,
};
pub use self::user::{User, UserStats, UserStatsError};
