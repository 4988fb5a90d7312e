//! Courseflow CLI
//!
//! Main entry point for driving learner sessions from the terminal.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use courseflow_client::{ApiClient, PositionReporter, ResourceCache};
use courseflow_session::{
    AttemptPhase, ContentType, Curriculum, LearnBackend, LearningSession, Module,
    ProgressSnapshot, ProgressTracker, ScoreSummary, SessionConfig,
};
use tracing_subscriber::EnvFilter;

/// Courseflow - Learner Session Tool
///
/// Drives a learner's progress through a course: inspect the curriculum,
/// complete lessons, report watch positions, and take assessments.
#[derive(Parser, Debug)]
#[command(name = "courseflow")]
#[command(version, about, long_about = None)]
struct Args {
    /// Learner user id
    #[arg(short, long, value_name = "USER")]
    user: String,

    /// Path to configuration file (default: courseflow.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Backend API base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the curriculum outline with completion state
    Show {
        /// Course to show; repeat for several courses
        #[arg(long = "course", value_name = "COURSE", required = true)]
        courses: Vec<String>,
    },

    /// Mark a lesson complete
    Complete {
        /// The owning course
        #[arg(long, value_name = "COURSE")]
        course: String,

        /// The lesson to complete
        #[arg(long, value_name = "LESSON")]
        lesson: String,
    },

    /// Report watch positions for a lesson (debounced to one update)
    Watch {
        /// The owning course
        #[arg(long, value_name = "COURSE")]
        course: String,

        /// The lesson being watched
        #[arg(long, value_name = "LESSON")]
        lesson: String,

        /// Playback positions in seconds, comma-separated
        #[arg(long, value_name = "SECONDS", value_delimiter = ',', required = true)]
        positions: Vec<u32>,
    },

    /// Take an assessment end to end
    Assess {
        /// The owning course
        #[arg(long, value_name = "COURSE")]
        course: String,

        /// The assessment to attempt
        #[arg(long, value_name = "ASSESSMENT")]
        assessment: String,

        /// Answers as question=value pairs, comma-separated
        #[arg(long, value_name = "Q=V", value_delimiter = ',', required = true)]
        answers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides, then re-validate.
    if let Some(ref api_url) = args.api_url {
        config.api_base_url.clone_from(api_url);
    }
    config.validate()?;

    tracing::debug!(api_base_url = %config.api_base_url, user = %args.user, "configured");

    let client = ApiClient::new(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build API client: {e}"))?;

    match args.command {
        Command::Show { courses } => show_courses(&client, &config, &args.user, &courses).await,
        Command::Complete { course, lesson } => {
            complete_lesson(client, &config, &args.user, &course, &lesson).await
        }
        Command::Watch {
            course,
            lesson,
            positions,
        } => watch_lesson(client, &config, &args.user, &course, &lesson, &positions).await,
        Command::Assess {
            course,
            assessment,
            answers,
        } => take_assessment(client, &config, &args.user, &course, &assessment, &answers).await,
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<SessionConfig> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            SessionConfig::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => SessionConfig::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Shows the outline of one or more courses.
///
/// Repeated `--course` flags for the same course hit the read-through cache
/// instead of the backend.
async fn show_courses(
    client: &ApiClient,
    config: &SessionConfig,
    user: &str,
    courses: &[String],
) -> anyhow::Result<()> {
    let curriculum_cache: ResourceCache<Curriculum> = ResourceCache::new();
    let progress_cache: ResourceCache<ProgressSnapshot> = ResourceCache::new();

    for course in courses {
        let curriculum = curriculum_cache
            .get_or_fetch("curriculum", course, || client.fetch_curriculum(course))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load course '{course}': {e}"))?;
        let snapshot = progress_cache
            .get_or_fetch("progress", course, || client.fetch_progress(user, course))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load progress for '{course}': {e}"))?;

        let mut tracker =
            ProgressTracker::new(chrono::Duration::seconds(to_i64(config.optimistic_window_secs)));
        tracker.apply_snapshot(snapshot);

        print_outline(&curriculum, &tracker);
    }

    Ok(())
}

/// Marks a lesson complete through a full session, so the optimistic patch
/// and confirming re-fetch run the same way an interactive driver would.
async fn complete_lesson(
    client: ApiClient,
    config: &SessionConfig,
    user: &str,
    course: &str,
    lesson: &str,
) -> anyhow::Result<()> {
    let mut session = LearningSession::new(client, config.clone(), user, course);
    session.load().await?;

    if session.tracker().is_completed(lesson) {
        println!("Lesson '{lesson}' is already complete");
        return Ok(());
    }

    session.mark_lesson_complete(lesson).await?;
    println!("Lesson '{lesson}' marked complete");

    if let Some(progress) = session.course_progress() {
        println!(
            "Course progress: {:.0}% ({}/{} lessons)",
            progress.overall_percentage, progress.completed_lessons, progress.total_lessons
        );
    }
    Ok(())
}

/// Feeds playback positions through the debounced reporter.
///
/// All positions coalesce into a single update carrying the last one.
async fn watch_lesson(
    client: ApiClient,
    config: &SessionConfig,
    user: &str,
    course: &str,
    lesson: &str,
    positions: &[u32],
) -> anyhow::Result<()> {
    // Validate the lesson id against the curriculum before reporting.
    let curriculum = client
        .fetch_curriculum(course)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load course '{course}': {e}"))?;
    if curriculum.find_lesson(lesson).is_none() {
        anyhow::bail!(
            "Lesson '{lesson}' is not part of course '{course}'\n\nSuggestion: Run 'courseflow show --course {course}' to list lessons"
        );
    }

    let sink = client.position_sink(user);
    let mut reporter =
        PositionReporter::new(sink, Duration::from_millis(config.debounce_millis));

    for &position in positions {
        reporter.record(lesson, position);
    }
    reporter.flush().await;

    if let Some(&last) = positions.last() {
        println!("Reported watch position {last}s for lesson '{lesson}'");
    }
    Ok(())
}

/// Runs one assessment attempt end to end: confirm, answer, submit.
async fn take_assessment(
    client: ApiClient,
    config: &SessionConfig,
    user: &str,
    course: &str,
    assessment: &str,
    answers: &[String],
) -> anyhow::Result<()> {
    let mut session = LearningSession::new(client, config.clone(), user, course);
    session.load().await?;

    session.start_assessment(assessment)?;
    print_start_dialog(&session);

    session.confirm_start().await?;
    debug_assert_eq!(session.controller().phase(), AttemptPhase::InProgress);

    for pair in answers {
        let (question, value) = pair.split_once('=').ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid answer '{pair}'\n\nSuggestion: Use question=value pairs, e.g. --answers q1=4,q2=true"
            )
        })?;
        session.set_answer(question.trim(), value.trim())?;
    }

    let summary = session
        .submit()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Attempt was already submitted"))?;

    print_result(assessment, summary);
    if session.can_retake() {
        println!("A retake is available for this assessment");
    }
    Ok(())
}

/// Prints the curriculum outline with completion checkmarks.
fn print_outline(curriculum: &Curriculum, tracker: &ProgressTracker) {
    println!("=== {} ===", curriculum.course_title);

    for module in &curriculum.modules {
        println!("{}", module.title);
        for lesson in &module.lessons {
            let mark = if tracker.is_completed(&lesson.id) {
                "x"
            } else {
                " "
            };
            println!(
                "  [{mark}] {} ({}) {}",
                lesson.id,
                content_type_label(lesson.content_type),
                lesson.title
            );
        }
        print_module_assessment(module);
    }

    if let Some(ref final_assessment) = curriculum.final_assessment {
        println!("Final assessment: {}", final_assessment.title);
    }

    if let Some(progress) = tracker.course_progress() {
        println!(
            "Progress: {:.0}% ({}/{} lessons, {}/{} assessments)",
            progress.overall_percentage,
            progress.completed_lessons,
            progress.total_lessons,
            progress.completed_assessments,
            progress.total_assessments
        );
        if progress.certificate_eligible {
            println!("Certificate: eligible");
        }
    }
    println!();
}

fn print_module_assessment(module: &Module) {
    if let Some(ref assessment) = module.assessment {
        println!(
            "      {} (module assessment, pass at {:.0}%)",
            assessment.title, assessment.passing_score
        );
    }
}

/// Prints what the start dialog would show: prior attempts and limits.
fn print_start_dialog(session: &LearningSession<ApiClient>) {
    let controller = session.controller();
    let Some(assessment) = controller.assessment() else {
        return;
    };

    println!("=== {} ===", assessment.title);
    println!("Questions: {}", assessment.questions.len());
    println!("Passing score: {:.0}%", assessment.passing_score);
    if let Some(limit) = assessment.time_limit {
        println!("Time limit: {limit} minutes");
    }
    match assessment.max_attempts {
        Some(max) => println!(
            "Attempts used: {}/{max}",
            controller.prior_attempts()
        ),
        None => println!("Attempts used: {}", controller.prior_attempts()),
    }
}

/// Prints the scored result of a submitted attempt.
fn print_result(assessment: &str, summary: ScoreSummary) {
    println!();
    println!("=== Result: {assessment} ===");
    println!(
        "Score: {:.1}/{:.1} ({:.0}%)",
        summary.score, summary.total_points, summary.percentage
    );
    println!("Outcome: {}", if summary.passed { "PASSED" } else { "FAILED" });
}

const fn content_type_label(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Video => "video",
        ContentType::Article => "article",
        ContentType::Quiz => "quiz",
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
