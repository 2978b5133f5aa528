//! Terminal front end for the quest progression controller.
//!
//! Each invocation initialises a session, runs one command, and prints the
//! resulting state. Settings come from `TIDEQUEST_*` variables and the
//! config file; `--api-url` and `--offline` override them.

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tidequest::config::QuestClientSettings;
use tidequest::domain::ports::QuestService;
use tidequest::domain::{
    BatchReport, CompletionOutcome, Difficulty, LevelUpEvent, ProgressionController, Quest,
    QuestId, QuestStatus,
};
use tidequest::outbound::http::HttpQuestService;
use tidequest::outbound::memory::InMemoryQuestService;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `tidequest` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tidequest",
    about = "Track quests and level up against a quest service",
    version
)]
struct CliArgs {
    /// Quest service base URL. Overrides `TIDEQUEST_API_URL`.
    #[arg(long = "api-url", value_name = "url", global = true)]
    api_url: Option<String>,
    /// Run against an in-process service instead of HTTP.
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Show the user's level and progress.
    Status,
    /// List quests, newest first.
    List {
        /// Only show pending quests.
        #[arg(long)]
        pending: bool,
    },
    /// Create a quest.
    Create {
        /// Quest title.
        title: String,
        /// One of easy, normal, hard, epic, legendary.
        #[arg(long, short, default_value_t = Difficulty::Normal)]
        difficulty: Difficulty,
    },
    /// Complete one quest.
    Complete {
        /// Quest id.
        id: u64,
    },
    /// Delete one quest.
    Delete {
        /// Quest id.
        id: u64,
    },
    /// Generate the demo batch of quests.
    Demo {
        /// Complete every pending quest afterwards.
        #[arg(long)]
        complete: bool,
    },
    /// Complete every pending quest, one at a time. Ctrl-C stops the batch.
    CompleteAll,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args)?;
    let service = build_service(&settings)?;
    let controller = ProgressionController::new(service, settings.controller_settings());
    controller.initialize().await?;

    match args.command {
        Command::Status => {}
        Command::List { pending } => {
            let quests = if pending {
                controller.active_quests()
            } else {
                controller.list_quests()
            };
            print_quests(&quests);
            return Ok(());
        }
        Command::Create { title, difficulty } => {
            let quest = controller.create_quest(&title, difficulty).await?;
            println!("created {}", describe_quest(&quest));
            return Ok(());
        }
        Command::Complete { id } => {
            let outcome = controller.complete_quest(parse_id(id)?).await?;
            print_outcome(&outcome);
        }
        Command::Delete { id } => {
            controller.delete_quest(parse_id(id)?).await?;
            println!("deleted quest {id}");
            return Ok(());
        }
        Command::Demo { complete } => {
            controller.generate_demo_quests().await?;
            println!("generated demo quests");
            print_quests(&controller.active_quests());
            if complete {
                let report = complete_all(&controller).await;
                print_report(&report);
            }
        }
        Command::CompleteAll => {
            let report = complete_all(&controller).await;
            print_report(&report);
        }
    }

    print_status(&controller);
    Ok(())
}

fn load_settings(args: &CliArgs) -> Result<QuestClientSettings> {
    let mut settings = QuestClientSettings::load_from_iter([OsString::from("tidequest")])
        .map_err(|error| eyre!("load configuration: {error}"))?;
    if let Some(api_url) = &args.api_url {
        settings.api_url = Some(api_url.clone());
    }
    settings.offline |= args.offline;
    Ok(settings)
}

fn build_service(settings: &QuestClientSettings) -> Result<Arc<dyn QuestService>> {
    if settings.offline {
        return Ok(Arc::new(InMemoryQuestService::new()));
    }
    let base = settings.api_url().wrap_err("parse quest service URL")?;
    let service = HttpQuestService::new(base, settings.request_timeout())
        .wrap_err("build HTTP client")?;
    Ok(Arc::new(service))
}

fn parse_id(raw: u64) -> Result<QuestId> {
    QuestId::new(raw).map_err(|error| eyre!("quest id {raw}: {error}"))
}

async fn complete_all(controller: &ProgressionController<dyn QuestService>) -> BatchReport {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    let report = controller.complete_all_pending(&cancel).await;
    watcher.abort();
    report
}

fn describe_quest(quest: &Quest) -> String {
    let mark = match quest.status() {
        QuestStatus::Pending => ' ',
        QuestStatus::Completed => 'x',
    };
    format!(
        "[{mark}] #{id} {title} ({difficulty}, {reward} exp)",
        id = quest.id(),
        title = quest.title(),
        difficulty = quest.difficulty(),
        reward = quest.exp_reward(),
    )
}

fn print_quests(quests: &[Quest]) {
    if quests.is_empty() {
        println!("no quests");
    }
    for quest in quests {
        println!("{}", describe_quest(quest));
    }
}

fn print_level_up(event: &LevelUpEvent) {
    println!(
        "level up! {} -> {} (+{} exp from quest {})",
        event.previous_level, event.new_level, event.exp_reward, event.quest_id
    );
}

fn print_outcome(outcome: &CompletionOutcome) {
    println!(
        "completed quest {}: level {}, {} total exp",
        outcome.quest_id, outcome.result.new_level, outcome.result.total_exp
    );
    for achievement in &outcome.result.unlocked_achievements {
        println!("achievement unlocked: {achievement}");
    }
    if let Some(event) = &outcome.level_up {
        print_level_up(event);
    }
}

fn print_report(report: &BatchReport) {
    println!(
        "batch: {} completed, {} failed{}",
        report.completed.len(),
        report.failed.len(),
        if report.cancelled { ", cancelled" } else { "" }
    );
    for failure in &report.failed {
        println!("  quest {} failed: {}", failure.quest_id, failure.error);
    }
    for event in &report.level_ups {
        print_level_up(event);
    }
}

fn print_status(controller: &ProgressionController<dyn QuestService>) {
    let (Some(user), Some(progress)) = (controller.user(), controller.progress()) else {
        println!("no user loaded");
        return;
    };
    println!(
        "{} | level {} | {} / {} exp | {} total | {} quests completed",
        user.username(),
        progress.level,
        progress.exp,
        progress.exp_required,
        progress.total_exp,
        progress.quests_completed,
    );
    println!(
        "exploring the {} with a {}",
        progress.depth.label(),
        progress.creature.label()
    );
}
