use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use academy_core::model::{LessonId, ModuleId, ProgressKey, QuestId};
use clap::{ArgAction, Parser, Subcommand};
use services::{AppServices, EventSink, QuestAttempt, QuizError, QuizSession};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::{DEFAULT_STORE_URL, load_curriculum, normalize_store_url, prepare_sqlite_file};
use console::ConsoleSink;

#[derive(Debug, Parser)]
#[command(name = "academy", version, about = "NeonHack Academy learning tracker")]
struct Cli {
    /// Where progress is stored (`sqlite://...`, a file path or `sqlite::memory:`)
    #[arg(long, env = "ACADEMY_STORE_URL", default_value = DEFAULT_STORE_URL, global = true)]
    store: String,

    /// Curriculum JSON to use instead of the bundled one
    #[arg(long, env = "ACADEMY_CURRICULUM", global = true)]
    curriculum: Option<PathBuf>,

    /// Disable the terminal bell on milestones
    #[arg(long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List modules with completion counts
    Modules,
    /// List the lessons of a module
    Lessons { module: String },
    /// Show a lesson: theory, labs and reading
    Lesson { module: String, lesson: String },
    /// Show XP, level and quests (default)
    Status,
    /// Mark a lesson complete (+50 XP)
    Complete { module: String, lesson: String },
    /// Attempt a quest by completing the next unfinished lesson
    Quest { quest: String },
    /// Re-check quest unlock conditions
    Evaluate,
    /// Award XP directly
    Award {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Take a lesson's quiz interactively
    Quiz { module: String, lesson: String },
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let curriculum = Arc::new(load_curriculum(cli.curriculum.as_deref())?);
    let store_url = normalize_store_url(&cli.store)?;
    // SQLite will not create a missing file on its own.
    prepare_sqlite_file(&store_url)?;
    tracing::debug!(store = %store_url, "opening progress store");

    let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink { sound: !cli.quiet });
    let app = AppServices::new_sqlite(&store_url, Arc::clone(&curriculum), sink).await?;
    let progress = app.progress();
    let mut out = io::stdout().lock();

    match cli.command.unwrap_or(Command::Status) {
        Command::Modules => {
            console::render_modules(&mut out, &progress.overview().await?)?;
        }
        Command::Lessons { module } => {
            let id = ModuleId::new(module);
            let module = curriculum
                .module(&id)
                .ok_or_else(|| format!("unknown module: {id}"))?;
            console::render_lessons(&mut out, module, &progress.snapshot().await?)?;
        }
        Command::Lesson { module, lesson } => {
            let (module, lesson) = (ModuleId::new(module), LessonId::new(lesson));
            let found = curriculum
                .lesson(&module, &lesson)
                .ok_or_else(|| format!("unknown lesson: {module}:{lesson}"))?;
            console::render_lesson(&mut out, found)?;
        }
        Command::Status => {
            console::render_status(&mut out, &progress.snapshot().await?)?;
        }
        Command::Complete { module, lesson } => {
            let key = ProgressKey::new(ModuleId::new(module), LessonId::new(lesson));
            if curriculum.lesson(key.module(), key.lesson()).is_none() {
                tracing::warn!(lesson = %key, "lesson is not part of the curriculum");
            }
            drop(out);
            progress.mark_complete(key).await?;
        }
        Command::Quest { quest } => {
            drop(out);
            match progress.attempt_quest(&QuestId::new(quest)).await? {
                QuestAttempt::Completed { reward: None, .. } => {
                    println!("Lesson completed, but this quest has no reward left to pay.");
                }
                QuestAttempt::Completed { .. } => {}
                QuestAttempt::NothingToDo => println!("No incomplete lessons."),
            }
        }
        Command::Evaluate => {
            drop(out);
            if progress.evaluate_quests().await?.is_none() {
                println!("No new quests.");
            }
        }
        Command::Award { amount } => {
            drop(out);
            let award = progress.award_xp(amount).await?;
            println!("+{} XP (total {}).", award.gained, award.total);
        }
        Command::Quiz { module, lesson } => {
            drop(out);
            run_quiz(&app, &ModuleId::new(module), &LessonId::new(lesson)).await?;
        }
    }

    Ok(())
}

async fn run_quiz(
    app: &AppServices,
    module: &ModuleId,
    lesson: &LessonId,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = app.quiz_loop();
    let mut session = QuizSession::new();
    match quiz.start_quiz(&mut session, module, lesson) {
        Err(QuizError::NoQuizAvailable) => {
            println!("No quiz available for this lesson.");
            return Ok(());
        }
        other => other?,
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(question) = session.current_question() {
        console::render_question(&mut io::stdout(), session.progress(), question)?;
        let options = question.options().len();

        loop {
            print!("Answer [1-{options}, q to quit]: ");
            io::stdout().flush()?;
            let Some(line) = lines.next().transpose()? else {
                session.end();
                println!();
                return Ok(());
            };
            let input = line.trim();
            if input.eq_ignore_ascii_case("q") {
                session.end();
                println!("Quiz ended, no XP awarded.");
                return Ok(());
            }
            let Some(choice) = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("Enter a number between 1 and {options}.");
                continue;
            };
            match session.answer(choice) {
                Ok(true) => println!("Correct!"),
                Ok(false) => println!("Wrong."),
                Err(QuizError::InvalidOption { .. }) => {
                    println!("Enter a number between 1 and {options}.");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
            break;
        }

        // The finished summary is printed by the console sink.
        quiz.advance(&mut session).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
