//! End-to-end controller behaviour against the in-memory quest service.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use tidequest::domain::ports::{QuestService, QuestServiceError};
use tidequest::domain::{
    ControllerRuntime, ControllerSettings, Difficulty, ErrorCode, ProgressionController,
    QuestStatus, User, UserStats,
};
use tidequest::outbound::memory::{DEMO_USERNAME, InMemoryQuestService};
use tidequest::test_support::{MutableClock, RecordingSleeper};
use tokio_util::sync::CancellationToken;

struct Session {
    service: Arc<InMemoryQuestService>,
    controller: ProgressionController<InMemoryQuestService>,
    clock: Arc<MutableClock>,
    sleeper: Arc<RecordingSleeper>,
}

fn session_with(service: InMemoryQuestService) -> Session {
    let start = Utc
        .with_ymd_and_hms(2026, 5, 4, 8, 0, 0)
        .single()
        .expect("valid time");
    let clock = Arc::new(MutableClock::new(start));
    let sleeper = Arc::new(RecordingSleeper::default());
    let service = Arc::new(service);
    let runtime = ControllerRuntime {
        clock: clock.clone(),
        sleeper: sleeper.clone(),
    };
    let controller = ProgressionController::with_runtime(
        Arc::clone(&service),
        runtime,
        ControllerSettings::default(),
    );
    Session {
        service,
        controller,
        clock,
        sleeper,
    }
}

#[fixture]
fn demo_session() -> Session {
    session_with(InMemoryQuestService::new())
}

#[fixture]
fn fresh_session() -> Session {
    session_with(InMemoryQuestService::with_user(&User::new(
        "diver",
        UserStats::default(),
    )))
}

#[rstest]
#[tokio::test]
async fn demo_session_starts_with_seeded_user_and_no_quests(demo_session: Session) {
    demo_session
        .controller
        .initialize()
        .await
        .expect("initialize succeeds");

    let user = demo_session.controller.user().expect("user loaded");
    assert_eq!(user.username(), DEMO_USERNAME);
    assert_eq!(user.stats().level(), 5);
    assert_eq!(user.stats().total_exp(), 450);
    assert!(demo_session.controller.list_quests().is_empty());
}

#[rstest]
#[tokio::test]
async fn demo_batch_completes_in_one_paced_run(demo_session: Session) {
    let controller = &demo_session.controller;
    controller.initialize().await.expect("initialize succeeds");
    let mut events = controller.subscribe_level_ups();

    controller
        .generate_demo_quests()
        .await
        .expect("generation succeeds");
    assert_eq!(controller.active_quests().len(), 10);

    let report = controller
        .complete_all_pending(&CancellationToken::new())
        .await;

    assert_eq!(report.completed.len(), 10);
    assert!(report.failed.is_empty());
    assert!(!report.cancelled);
    assert_eq!(
        demo_session.sleeper.recorded(),
        vec![Duration::from_millis(600); 9]
    );
    assert!(controller.active_quests().is_empty());

    let local = controller.user().expect("user loaded");
    let remote = demo_session
        .service
        .fetch_demo_user()
        .await
        .expect("service user");
    assert_eq!(local.stats().quests_completed(), 25);
    assert_eq!(local.stats().level(), remote.stats().level());
    assert_eq!(local.stats().total_exp(), remote.stats().total_exp());

    assert!(!report.level_ups.is_empty(), "545 exp crosses a level");
    for event in &report.level_ups {
        assert!(event.new_level > event.previous_level);
        let received = events.try_recv().expect("event broadcast");
        assert_eq!(&received, event);
    }
    assert!(events.try_recv().is_err(), "no extra events");
}

#[rstest]
#[tokio::test]
async fn first_epic_levels_a_fresh_user(fresh_session: Session) {
    let controller = &fresh_session.controller;
    controller.initialize().await.expect("initialize succeeds");
    let quest = controller
        .create_quest("Map the kelp forest", Difficulty::Epic)
        .await
        .expect("create succeeds");

    let outcome = controller
        .complete_quest(quest.id())
        .await
        .expect("complete succeeds");

    let event = outcome.level_up.expect("level up");
    assert_eq!((event.previous_level, event.new_level), (1, 2));
    assert_eq!(event.exp_reward, 100);
    assert_eq!(event.unlocked_achievements.len(), 2);
    let stats = controller.user().expect("user loaded").stats().clone();
    assert_eq!(stats.total_exp(), outcome.result.total_exp);
    assert_eq!(stats.quests_completed(), 1);

    fresh_session.clock.advance(Duration::from_secs(1));
    assert!(controller.active_celebration().is_some());
    fresh_session.clock.advance(Duration::from_secs(10));
    assert!(controller.active_celebration().is_none());
}

#[rstest]
#[tokio::test]
async fn repeated_completion_is_refused_without_double_credit(fresh_session: Session) {
    let controller = &fresh_session.controller;
    controller.initialize().await.expect("initialize succeeds");
    let quest = controller
        .create_quest("Polish the portholes", Difficulty::Easy)
        .await
        .expect("create succeeds");
    controller
        .complete_quest(quest.id())
        .await
        .expect("first completion succeeds");
    let before = controller.user();

    let error = controller
        .complete_quest(quest.id())
        .await
        .expect_err("second completion fails");

    assert_eq!(error.code(), ErrorCode::CompleteFailure);
    assert!(matches!(
        error.service_error(),
        Some(QuestServiceError::AlreadyCompleted { .. })
    ));
    assert_eq!(controller.user(), before);
}

#[rstest]
#[tokio::test]
async fn deleting_a_completed_quest_keeps_progress(fresh_session: Session) {
    let controller = &fresh_session.controller;
    controller.initialize().await.expect("initialize succeeds");
    let kept = controller
        .create_quest("Count the starfish", Difficulty::Normal)
        .await
        .expect("create succeeds");
    let removed = controller
        .create_quest("Sweep the deck", Difficulty::Hard)
        .await
        .expect("create succeeds");
    controller
        .complete_quest(removed.id())
        .await
        .expect("complete succeeds");
    let before = controller.user();

    controller
        .delete_quest(removed.id())
        .await
        .expect("delete succeeds");

    let quests = controller.list_quests();
    assert_eq!(quests.len(), 1);
    assert_eq!(quests[0].id(), kept.id());
    assert_eq!(quests[0].status(), QuestStatus::Pending);
    assert_eq!(controller.user(), before);
    assert_eq!(
        fresh_session
            .service
            .list_quests()
            .await
            .expect("service list")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn blank_titles_never_reach_the_service(fresh_session: Session) {
    let controller = &fresh_session.controller;
    controller.initialize().await.expect("initialize succeeds");

    let error = controller
        .create_quest("   ", Difficulty::Legendary)
        .await
        .expect_err("blank title rejected");

    assert_eq!(error.code(), ErrorCode::CreateFailure);
    assert!(
        fresh_session
            .service
            .list_quests()
            .await
            .expect("service list")
            .is_empty()
    );
}
