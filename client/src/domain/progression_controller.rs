//! Progression controller: the session's view of the user and their quests.
//!
//! The controller mediates between user actions and the quest service. Local
//! state only changes after the service confirms an action, and level or
//! experience numbers are always copied from the service, never derived.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::ports::{CompletionResult, CreateQuestRequest, QuestService, QuestServiceError};
use crate::domain::{
    CreatureTier, DepthTier, Difficulty, Error, ErrorCode, LevelUpEvent, Quest, QuestId,
    QuestTitle, User, experience_required_for_level,
};

mod runtime;

pub use runtime::{BatchSleeper, ControllerRuntime, ControllerSettings, TokioSleeper};

const LEVEL_UP_CHANNEL_CAPACITY: usize = 16;

/// Result of one confirmed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Quest that was completed.
    pub quest_id: QuestId,
    /// Service response as received.
    pub result: CompletionResult,
    /// Level held before the completion, when a user was loaded.
    pub previous_level: Option<u32>,
    /// Event raised when the completion increased the level.
    pub level_up: Option<LevelUpEvent>,
}

/// One quest that failed inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Quest whose completion was refused.
    pub quest_id: QuestId,
    /// Controller error for that completion, with the service error as source.
    pub error: Error,
}

/// Summary of [`ProgressionController::complete_all_pending`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    /// Quests completed, in processing order.
    pub completed: Vec<QuestId>,
    /// Quests skipped after a failed completion, in processing order.
    pub failed: Vec<BatchFailure>,
    /// Level-up events raised during the batch.
    pub level_ups: Vec<LevelUpEvent>,
    /// Whether the batch stopped early because it was cancelled.
    pub cancelled: bool,
}

impl BatchReport {
    /// Number of completion requests issued.
    pub fn attempted(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Derived display values for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Current level as last confirmed by the service.
    pub level: u32,
    /// Experience earned within the current level.
    pub exp: u64,
    /// Cumulative experience across all levels.
    pub total_exp: u64,
    /// Number of quests completed by the user.
    pub quests_completed: u64,
    /// Display threshold for the next level; informative only.
    pub exp_required: u64,
    /// Ocean depth band for the current level.
    pub depth: DepthTier,
    /// Companion creature for the current level.
    pub creature: CreatureTier,
}

impl ProgressSnapshot {
    fn for_user(user: &User) -> Self {
        let stats = user.stats();
        Self {
            level: stats.level(),
            exp: stats.exp(),
            total_exp: stats.total_exp(),
            quests_completed: stats.quests_completed(),
            exp_required: experience_required_for_level(stats.level()),
            depth: DepthTier::for_level(stats.level()),
            creature: CreatureTier::for_level(stats.level()),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    quests: Vec<Quest>,
    celebration: Option<LevelUpEvent>,
}

/// Removes a quest id from the in-flight set when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<QuestId>>,
    id: QuestId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Session controller owning the user's stats and quest collection.
///
/// Construct one per session and share it by reference or `Arc`.
pub struct ProgressionController<S: ?Sized> {
    service: Arc<S>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn BatchSleeper>,
    settings: ControllerSettings,
    state: Mutex<SessionState>,
    in_flight: Mutex<HashSet<QuestId>>,
    level_ups: broadcast::Sender<LevelUpEvent>,
}

impl<S> ProgressionController<S>
where
    S: QuestService + ?Sized,
{
    /// Build a controller with the system clock and Tokio sleeper.
    /// ```rust,ignore
    /// let controller = ProgressionController::new(service, ControllerSettings::default());
    /// ```
    pub fn new(service: Arc<S>, settings: ControllerSettings) -> Self {
        Self::with_runtime(service, ControllerRuntime::default(), settings)
    }

    /// Build a controller with injected runtime abstractions.
    pub fn with_runtime(
        service: Arc<S>,
        runtime: ControllerRuntime,
        settings: ControllerSettings,
    ) -> Self {
        let (level_ups, _) = broadcast::channel(LEVEL_UP_CHANNEL_CAPACITY);
        Self {
            service,
            clock: runtime.clock,
            sleeper: runtime.sleeper,
            settings,
            state: Mutex::new(SessionState::default()),
            in_flight: Mutex::new(HashSet::new()),
            level_ups,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        // Critical sections never panic, so a poisoned guard still holds
        // consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the user and the quest list.
    ///
    /// Both fetches must succeed; otherwise the session is left empty.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InitializationFailure`] when either fetch fails.
    pub async fn initialize(&self) -> Result<(), Error> {
        let loaded = async {
            let user = self.service.fetch_demo_user().await?;
            let quests = self.service.list_quests().await?;
            Ok::<_, QuestServiceError>((user, quests))
        }
        .await;

        let mut state = self.lock_state();
        match loaded {
            Ok((user, quests)) => {
                info!(
                    username = user.username(),
                    level = user.stats().level(),
                    quests = quests.len(),
                    "session initialized"
                );
                state.user = Some(user);
                state.quests = quests;
                state.celebration = None;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "session initialization failed");
                *state = SessionState::default();
                Err(Error::from_service(
                    ErrorCode::InitializationFailure,
                    "initialize session",
                    error,
                ))
            }
        }
    }

    /// Cached user snapshot, if initialized.
    pub fn user(&self) -> Option<User> {
        self.lock_state().user.clone()
    }

    /// Cached quests, newest first.
    pub fn list_quests(&self) -> Vec<Quest> {
        self.lock_state().quests.clone()
    }

    /// Cached quests still pending, in listed order.
    pub fn active_quests(&self) -> Vec<Quest> {
        self.lock_state()
            .quests
            .iter()
            .filter(|quest| quest.is_pending())
            .cloned()
            .collect()
    }

    /// Cached completed quests, in listed order.
    pub fn completed_quests(&self) -> Vec<Quest> {
        self.lock_state()
            .quests
            .iter()
            .filter(|quest| !quest.is_pending())
            .cloned()
            .collect()
    }

    /// Derived display values, if a user is loaded.
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.lock_state().user.as_ref().map(ProgressSnapshot::for_user)
    }

    /// Replace the cached quest list with a fresh fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::FetchFailure`]; the cached list is kept.
    pub async fn refresh_quests(&self) -> Result<(), Error> {
        let quests = self.service.list_quests().await.map_err(|error| {
            warn!(%error, "quest refresh failed");
            Error::from_service(ErrorCode::FetchFailure, "fetch quests", error)
        })?;
        debug!(quests = quests.len(), "quest list refreshed");
        self.lock_state().quests = quests;
        Ok(())
    }

    /// Create a quest and prepend the service's copy to the cache.
    ///
    /// Blank titles are rejected before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::CreateFailure`] for invalid titles and service
    /// failures.
    pub async fn create_quest(&self, title: &str, difficulty: Difficulty) -> Result<Quest, Error> {
        let title = QuestTitle::new(title).map_err(|error| Error::create_failure(error.to_string()))?;
        let request = CreateQuestRequest {
            title,
            difficulty,
            description: String::new(),
        };

        let quest = self
            .service
            .create_quest(&request)
            .await
            .map_err(|error| {
                warn!(%error, %difficulty, "quest creation failed");
                Error::from_service(ErrorCode::CreateFailure, "create quest", error)
            })?;

        info!(quest_id = %quest.id(), %difficulty, "quest created");
        self.lock_state().quests.insert(0, quest.clone());
        Ok(quest)
    }

    /// Complete a quest and apply the service's authoritative stats.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::Conflict`] when a completion for `id` is already in flight.
    /// - [`ErrorCode::CompleteFailure`] when the service rejects the request or
    ///   reports stats that would move the user backwards.
    pub async fn complete_quest(&self, id: QuestId) -> Result<CompletionOutcome, Error> {
        let _guard = self.claim(id)?;

        let result = self.service.complete_quest(id).await.map_err(|error| {
            warn!(quest_id = %id, %error, "quest completion failed");
            Error::from_service(
                ErrorCode::CompleteFailure,
                &format!("complete quest {id}"),
                error,
            )
        })?;

        self.apply_completion(id, result)
    }

    fn claim(&self, id: QuestId) -> Result<InFlightGuard<'_>, Error> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(id) {
            return Err(Error::conflict(format!(
                "completion for quest {id} already in flight"
            )));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            id,
        })
    }

    fn apply_completion(
        &self,
        id: QuestId,
        result: CompletionResult,
    ) -> Result<CompletionOutcome, Error> {
        let now = self.clock.utc();
        let mut state = self.lock_state();

        let previous_level = match state.user.as_mut() {
            Some(user) => Some(user.stats_mut().apply_completion(&result).map_err(|error| {
                warn!(quest_id = %id, %error, "service reported inconsistent stats");
                Error::complete_failure(format!("complete quest {id}: {error}"))
            })?),
            None => None,
        };

        let exp_reward = match state.quests.iter_mut().find(|quest| quest.id() == id) {
            Some(quest) => {
                quest.mark_completed(now);
                quest.exp_reward()
            }
            None => 0,
        };

        let level_up = previous_level
            .filter(|previous| result.new_level > *previous)
            .map(|previous_level| LevelUpEvent {
                new_level: result.new_level,
                previous_level,
                quest_id: id,
                exp_reward,
                unlocked_achievements: result.unlocked_achievements.clone(),
                raised_at: now,
                display_for: self.settings.celebration_window,
            });

        if let Some(event) = &level_up {
            info!(
                quest_id = %id,
                previous_level = event.previous_level,
                new_level = event.new_level,
                "level up"
            );
            state.celebration = Some(event.clone());
            // No receivers is fine; the event stays available via the celebration slot.
            let _ = self.level_ups.send(event.clone());
        }

        info!(
            quest_id = %id,
            new_level = result.new_level,
            total_exp = result.total_exp,
            "quest completed"
        );
        Ok(CompletionOutcome {
            quest_id: id,
            result,
            previous_level,
            level_up,
        })
    }

    /// Delete a quest after the service confirms. Stats are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::DeleteFailure`]; the cache is unchanged.
    pub async fn delete_quest(&self, id: QuestId) -> Result<(), Error> {
        self.service.delete_quest(id).await.map_err(|error| {
            warn!(quest_id = %id, %error, "quest deletion failed");
            Error::from_service(
                ErrorCode::DeleteFailure,
                &format!("delete quest {id}"),
                error,
            )
        })?;

        let mut state = self.lock_state();
        if let Some(index) = state.quests.iter().position(|quest| quest.id() == id) {
            state.quests.remove(index);
        }
        info!(quest_id = %id, "quest deleted");
        Ok(())
    }

    /// Ask the service for a demo batch, then re-fetch the whole list.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::DemoGenerationFailure`] when generation fails and
    /// [`ErrorCode::FetchFailure`] when the follow-up refresh fails.
    pub async fn generate_demo_quests(&self) -> Result<(), Error> {
        self.service.generate_demo_quests().await.map_err(|error| {
            warn!(%error, "demo quest generation failed");
            Error::from_service(
                ErrorCode::DemoGenerationFailure,
                "generate demo quests",
                error,
            )
        })?;
        info!("demo quests generated");
        self.refresh_quests().await
    }

    /// Complete every pending quest one at a time, in listed order.
    ///
    /// Consecutive completions are separated by the configured step delay.
    /// A failed completion is recorded and skipped. `cancel` is checked
    /// before each step and interrupts the delay.
    pub async fn complete_all_pending(&self, cancel: &CancellationToken) -> BatchReport {
        let pending: Vec<QuestId> = self
            .active_quests()
            .iter()
            .map(Quest::id)
            .collect();
        info!(pending = pending.len(), "completing pending quests");

        let mut report = BatchReport::default();
        for (step, id) in pending.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if step > 0 {
                tokio::select! {
                    () = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    () = self.sleeper.sleep(self.settings.batch_step_delay) => {}
                }
            }

            match self.complete_quest(id).await {
                Ok(outcome) => {
                    report.completed.push(id);
                    report.level_ups.extend(outcome.level_up);
                }
                Err(error) => report.failed.push(BatchFailure {
                    quest_id: id,
                    error,
                }),
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "batch completion finished"
        );
        report
    }

    /// The latest level-up while its display window is open.
    pub fn active_celebration(&self) -> Option<LevelUpEvent> {
        let now = self.clock.utc();
        let mut state = self.lock_state();
        match &state.celebration {
            Some(event) if event.is_active(now) => Some(event.clone()),
            Some(_) => {
                state.celebration = None;
                None
            }
            None => None,
        }
    }

    /// Receive every level-up event raised after this call.
    pub fn subscribe_level_ups(&self) -> broadcast::Receiver<LevelUpEvent> {
        self.level_ups.subscribe()
    }
}
