//! In-process quest service.
//!
//! Stands in for the remote service when running offline and in integration
//! tests. It keeps the service-side rules: rewards fixed at creation, level
//! computed from cumulative experience, and one-time milestone achievements.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use tracing::debug;

use crate::domain::ports::{CompletionResult, CreateQuestRequest, QuestService, QuestServiceError};
use crate::domain::{
    Difficulty, Quest, QuestId, QuestTitle, User, UserStats, exp_to_next_level, exp_within_level,
    level_for_total_exp,
};

/// Username of the seeded demo account.
pub const DEMO_USERNAME: &str = "Ocean Explorer";

const ACHIEVEMENT_BONUS: u64 = 50;

const DEMO_BATCH: [(&str, &str, Difficulty); 10] = [
    ("Ship the container build", "Deploy the app image", Difficulty::Epic),
    ("Write the API endpoints", "Implement the REST surface", Difficulty::Hard),
    ("Design the database", "Lay out the quest tables", Difficulty::Hard),
    ("Add animations", "Bubble and ripple effects", Difficulty::Normal),
    ("Build UI components", "Quest cards and header", Difficulty::Normal),
    ("Fix a bug", "Debug the level system", Difficulty::Easy),
    ("Write documentation", "Update the README", Difficulty::Easy),
    ("Optimise performance", "Speed up loading", Difficulty::Hard),
    ("Add sound effects", "Audio feedback on completion", Difficulty::Normal),
    ("Implement demo mode", "Fast walkthrough for showcases", Difficulty::Legendary),
];

/// One-time milestones that grant a bonus when first reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Achievement {
    FirstQuest,
    TenQuests,
    LevelTen,
    FirstEpic,
    FirstLegendary,
}

impl Achievement {
    const ALL: [Self; 5] = [
        Self::FirstQuest,
        Self::TenQuests,
        Self::LevelTen,
        Self::FirstEpic,
        Self::FirstLegendary,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::FirstQuest => "First Dive",
            Self::TenQuests => "Seasoned Swimmer",
            Self::LevelTen => "Deep Sea Diver",
            Self::FirstEpic => "Epic Voyager",
            Self::FirstLegendary => "Legend of the Deep",
        }
    }

    fn reached(self, quests_completed: u64, level: u32, difficulty: Difficulty) -> bool {
        match self {
            Self::FirstQuest => quests_completed >= 1,
            Self::TenQuests => quests_completed >= 10,
            Self::LevelTen => level >= 10,
            Self::FirstEpic => difficulty == Difficulty::Epic,
            Self::FirstLegendary => difficulty == Difficulty::Legendary,
        }
    }
}

#[derive(Debug)]
struct Account {
    username: String,
    level: u32,
    total_exp: u64,
    quests_completed: u64,
    streak_days: u32,
    unlocked: BTreeSet<Achievement>,
}

impl Account {
    fn snapshot(&self) -> Result<User, QuestServiceError> {
        let stats = UserStats::new(
            self.level,
            exp_within_level(self.total_exp, self.level),
            self.total_exp,
            self.quests_completed,
        )
        .map_err(|error| QuestServiceError::rejected(error.to_string()))?
        .with_streak_days(self.streak_days)
        .with_exp_to_next_level(Some(exp_to_next_level(self.total_exp, self.level)));
        Ok(User::new(self.username.clone(), stats))
    }
}

#[derive(Debug)]
struct Store {
    account: Account,
    /// Oldest first; listings reverse it.
    quests: Vec<Quest>,
    last_id: u64,
}

impl Store {
    fn insert(
        &mut self,
        title: QuestTitle,
        difficulty: Difficulty,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<Quest, QuestServiceError> {
        let id = QuestId::new(self.last_id + 1)
            .map_err(|error| QuestServiceError::rejected(error.to_string()))?;
        self.last_id = id.get();
        let description = Some(description.to_owned()).filter(|text| !text.is_empty());
        let quest = Quest::new(id, title, difficulty)
            .with_description(description)
            .with_created_at(clock.utc());
        self.quests.push(quest.clone());
        Ok(quest)
    }

    fn quest_mut(&mut self, id: QuestId) -> Result<&mut Quest, QuestServiceError> {
        self.quests
            .iter_mut()
            .find(|quest| quest.id() == id)
            .ok_or_else(|| QuestServiceError::not_found(format!("quest {id} not found")))
    }
}

/// Quest service held entirely in memory.
pub struct InMemoryQuestService {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryQuestService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQuestService {
    /// Service seeded with the demo account and no quests.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Demo-seeded service stamping quests with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let account = Account {
            username: DEMO_USERNAME.to_owned(),
            level: 5,
            total_exp: 450,
            quests_completed: 15,
            streak_days: 3,
            unlocked: BTreeSet::new(),
        };
        Self {
            store: Mutex::new(Store {
                account,
                quests: Vec::new(),
                last_id: 0,
            }),
            clock,
        }
    }

    /// Service whose account starts from `user`'s counters.
    ///
    /// The level is recomputed from `total_exp` unless the user already
    /// holds a higher one.
    pub fn with_user(user: &User) -> Self {
        let service = Self::new();
        {
            let mut store = service.lock_store();
            let stats = user.stats();
            store.account = Account {
                username: user.username().to_owned(),
                level: stats.level().max(level_for_total_exp(stats.total_exp())),
                total_exp: stats.total_exp(),
                quests_completed: stats.quests_completed(),
                streak_days: stats.streak_days(),
                unlocked: BTreeSet::new(),
            };
        }
        service
    }

    fn lock_store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl QuestService for InMemoryQuestService {
    async fn fetch_demo_user(&self) -> Result<User, QuestServiceError> {
        self.lock_store().account.snapshot()
    }

    async fn list_quests(&self) -> Result<Vec<Quest>, QuestServiceError> {
        Ok(self.lock_store().quests.iter().rev().cloned().collect())
    }

    async fn create_quest(&self, request: &CreateQuestRequest) -> Result<Quest, QuestServiceError> {
        let quest = self.lock_store().insert(
            request.title.clone(),
            request.difficulty,
            &request.description,
            self.clock.as_ref(),
        )?;
        debug!(quest_id = %quest.id(), difficulty = %quest.difficulty(), "stored quest");
        Ok(quest)
    }

    async fn complete_quest(&self, id: QuestId) -> Result<CompletionResult, QuestServiceError> {
        let now = self.clock.utc();
        let mut store = self.lock_store();
        let quest = store.quest_mut(id)?;
        if !quest.mark_completed(now) {
            return Err(QuestServiceError::already_completed(format!(
                "quest {id} already completed"
            )));
        }
        let reward = quest.exp_reward();
        let difficulty = quest.difficulty();

        let account = &mut store.account;
        account.total_exp = account.total_exp.saturating_add(reward);
        let new_level = level_for_total_exp(account.total_exp).max(account.level);
        account.level = new_level;
        account.quests_completed = account.quests_completed.saturating_add(1);

        let mut unlocked_achievements = Vec::new();
        for achievement in Achievement::ALL {
            if account.unlocked.contains(&achievement)
                || !achievement.reached(account.quests_completed, new_level, difficulty)
            {
                continue;
            }
            account.unlocked.insert(achievement);
            // Bonus lands after the level is settled; the next completion catches up.
            // The reported total below already includes it.
            account.total_exp = account.total_exp.saturating_add(ACHIEVEMENT_BONUS);
            unlocked_achievements.push(achievement.label().to_owned());
        }

        debug!(
            quest_id = %id,
            reward,
            new_level,
            total_exp = account.total_exp,
            unlocked = unlocked_achievements.len(),
            "completed stored quest"
        );
        Ok(CompletionResult {
            new_level,
            total_exp: account.total_exp,
            exp: Some(exp_within_level(account.total_exp, new_level)),
            unlocked_achievements,
        })
    }

    async fn delete_quest(&self, id: QuestId) -> Result<(), QuestServiceError> {
        let mut store = self.lock_store();
        let index = store
            .quests
            .iter()
            .position(|quest| quest.id() == id)
            .ok_or_else(|| QuestServiceError::not_found(format!("quest {id} not found")))?;
        store.quests.remove(index);
        Ok(())
    }

    async fn generate_demo_quests(&self) -> Result<(), QuestServiceError> {
        let mut store = self.lock_store();
        for (title, description, difficulty) in DEMO_BATCH {
            let title = QuestTitle::new(title)
                .map_err(|error| QuestServiceError::rejected(error.to_string()))?;
            store.insert(title, difficulty, description, self.clock.as_ref())?;
        }
        debug!(count = DEMO_BATCH.len(), "generated demo quests");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::QuestStatus;

    #[fixture]
    fn service() -> InMemoryQuestService {
        InMemoryQuestService::new()
    }

    fn request(title: &str, difficulty: Difficulty) -> CreateQuestRequest {
        CreateQuestRequest {
            title: QuestTitle::new(title).expect("valid title"),
            difficulty,
            description: String::new(),
        }
    }

    fn fresh_user() -> User {
        User::new("diver", UserStats::default())
    }

    #[rstest]
    #[tokio::test]
    async fn demo_user_matches_seed(service: InMemoryQuestService) {
        let user = service.fetch_demo_user().await.expect("user");

        assert_eq!(user.username(), DEMO_USERNAME);
        let stats = user.stats();
        assert_eq!(stats.level(), 5);
        assert_eq!(stats.total_exp(), 450);
        assert_eq!(stats.exp(), 112);
        assert_eq!(stats.quests_completed(), 15);
        assert_eq!(stats.streak_days(), 3);
        assert_eq!(stats.exp_to_next_level(), Some(57));
    }

    #[rstest]
    #[tokio::test]
    async fn created_quests_list_newest_first(service: InMemoryQuestService) {
        let first = service
            .create_quest(&request("Feed the fish", Difficulty::Easy))
            .await
            .expect("create");
        let second = service
            .create_quest(&request("Chart the reef", Difficulty::Legendary))
            .await
            .expect("create");

        assert_eq!(first.id().get(), 1);
        assert_eq!(second.id().get(), 2);
        assert_eq!(second.exp_reward(), 200);
        let ids: Vec<u64> = service
            .list_quests()
            .await
            .expect("list")
            .iter()
            .map(|quest| quest.id().get())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn quests_are_stamped_with_the_injected_clock() {
        let now = chrono::Utc::now();
        let mut clock = mockable::MockClock::new();
        clock.expect_utc().return_const(now);
        let service = InMemoryQuestService::with_clock(Arc::new(clock));
        let quest = service
            .create_quest(&request("Feed the fish", Difficulty::Easy))
            .await
            .expect("create");

        let result = service.complete_quest(quest.id()).await.expect("complete");

        assert_eq!(quest.created_at(), Some(now));
        assert_eq!(result.new_level, 5, "demo seed stays on level 5");
        let listed = service.list_quests().await.expect("list");
        assert_eq!(listed[0].completed_at(), Some(now));
    }

    #[rstest]
    #[tokio::test]
    async fn ids_are_not_reused_after_delete(service: InMemoryQuestService) {
        let first = service
            .create_quest(&request("Feed the fish", Difficulty::Easy))
            .await
            .expect("create");
        service.delete_quest(first.id()).await.expect("delete");

        let next = service
            .create_quest(&request("Clean the tank", Difficulty::Easy))
            .await
            .expect("create");
        assert_eq!(next.id().get(), 2);
    }

    #[tokio::test]
    async fn completion_adds_reward_and_levels_up() {
        let service = InMemoryQuestService::with_user(&fresh_user());
        let quest = service
            .create_quest(&request("Chart the reef", Difficulty::Epic))
            .await
            .expect("create");

        let result = service.complete_quest(quest.id()).await.expect("complete");

        assert_eq!(result.new_level, 2, "100 exp reaches level 2");
        assert_eq!(
            result.unlocked_achievements,
            vec!["First Dive".to_owned(), "Epic Voyager".to_owned()]
        );
        assert_eq!(result.total_exp, 200, "two bonuses credited after levelling");
        assert_eq!(result.exp, Some(100));
        let stored = service.fetch_demo_user().await.expect("user");
        assert_eq!(
            stored.stats().total_exp(),
            result.total_exp,
            "reported total is the post-bonus stored total"
        );
        assert_eq!(stored.stats().level(), 2, "level waits for the next completion");
        let listed = service.list_quests().await.expect("list");
        assert_eq!(listed[0].status(), QuestStatus::Completed);
    }

    #[tokio::test]
    async fn achievements_unlock_once() {
        let service = InMemoryQuestService::with_user(&fresh_user());
        for title in ["one", "two"] {
            service
                .create_quest(&request(title, Difficulty::Easy))
                .await
                .expect("create");
        }

        let first = service.complete_quest(QuestId::new(1).expect("id")).await.expect("complete");
        let second = service.complete_quest(QuestId::new(2).expect("id")).await.expect("complete");

        assert_eq!(first.unlocked_achievements, vec!["First Dive".to_owned()]);
        assert!(second.unlocked_achievements.is_empty());
        assert_eq!(second.total_exp, 70);
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_completion_is_rejected(service: InMemoryQuestService) {
        let quest = service
            .create_quest(&request("Feed the fish", Difficulty::Easy))
            .await
            .expect("create");
        service.complete_quest(quest.id()).await.expect("complete");

        let error = service
            .complete_quest(quest.id())
            .await
            .expect_err("second completion fails");
        assert!(matches!(error, QuestServiceError::AlreadyCompleted { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_ids_are_not_found(service: InMemoryQuestService) {
        let id = QuestId::new(42).expect("id");

        assert!(matches!(
            service.complete_quest(id).await,
            Err(QuestServiceError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_quest(id).await,
            Err(QuestServiceError::NotFound { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn demo_batch_has_fixed_difficulty_mix(service: InMemoryQuestService) {
        service.generate_demo_quests().await.expect("generate");

        let quests = service.list_quests().await.expect("list");
        assert_eq!(quests.len(), 10);
        assert!(quests.iter().all(Quest::is_pending));
        let count = |difficulty: Difficulty| {
            quests
                .iter()
                .filter(|quest| quest.difficulty() == difficulty)
                .count()
        };
        assert_eq!(count(Difficulty::Legendary), 1);
        assert_eq!(count(Difficulty::Epic), 1);
        assert_eq!(count(Difficulty::Hard), 3);
        assert_eq!(count(Difficulty::Normal), 3);
        assert_eq!(count(Difficulty::Easy), 2);
    }
}
