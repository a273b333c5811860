//! TutorFlow Telegram bot binary.
//!
//! Confirm today's lessons with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx TELEGRAM_CHAT_ID=123 cargo run -p tutorflow-telegram -- --lessons today.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tutorflow_core::{
    config, JsonLessonSource, JsonlResultSink, LessonSource, ResultSink, StaticLessonSource,
};
use tutorflow_telegram::{parse_timeout_secs, BotConfig, ConfirmationBot, OrchestratorConfig};

/// TutorFlow - confirm finished lessons and payments over Telegram
#[derive(Parser, Debug)]
#[command(name = "tutorflow-telegram")]
#[command(about = "Ask the tutor on Telegram whether each lesson took place and how it was paid")]
struct Args {
    /// JSON file with the lessons to confirm
    #[arg(short, long, conflicts_with = "subject")]
    lessons: Option<PathBuf>,

    /// Student to confirm (repeatable), sharing --duration
    #[arg(short, long)]
    subject: Vec<String>,

    /// Lesson duration used with --subject
    #[arg(short, long, default_value = "1h")]
    duration: String,

    /// Seconds to wait for an answer on each lesson (default: wait forever)
    #[arg(short, long, value_parser = timeout_arg)]
    timeout: Option<Duration>,

    /// File to append confirmed results to (default: ~/.tutorflow/results/lessons.jsonl)
    #[arg(short, long)]
    results: Option<PathBuf>,

    /// Do not write results to disk
    #[arg(long)]
    no_save: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn timeout_arg(raw: &str) -> Result<Duration, String> {
    parse_timeout_secs(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load environment variables from config directory first
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    // Also try a local .env.local or .env
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = match args.verbose {
        0 => "tutorflow_telegram=info,tutorflow_core=info,teloxide=warn",
        1 => "tutorflow_telegram=debug,tutorflow_core=debug,teloxide=info",
        2 => "tutorflow_telegram=trace,tutorflow_core=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let lessons = match &args.lessons {
        Some(path) => JsonLessonSource::new(path).lessons()?,
        None => StaticLessonSource::new(args.subject.clone(), args.duration.clone()).lessons()?,
    };
    if lessons.is_empty() {
        println!("No lessons to confirm. Use --lessons <file> or --subject <name>.");
        return Ok(());
    }

    let bot_config = BotConfig::from_env()?;
    let mut bot = ConfirmationBot::new(&bot_config);
    if let Some(timeout) = args.timeout {
        bot = bot.with_orchestrator_config(OrchestratorConfig::new().with_response_timeout(timeout));
    }

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] TutorFlow Telegram Bot");
            println!("   Bot: @{}", username);
            println!("   Lessons to confirm: {}", lessons.len());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }
    println!("   Press Ctrl+C to stop\n");

    let sink: Option<Arc<dyn ResultSink>> = if args.no_save {
        None
    } else {
        let path = args.results.clone().unwrap_or_else(config::results_file);
        println!("   Saving results to {}", path.display());
        Some(Arc::new(JsonlResultSink::new(path)))
    };

    let results = bot.run(lessons, sink).await?;

    println!("\n[done] {} lesson(s) confirmed", results.len());
    for result in &results {
        println!("   {} ({})", result.summary(), result.duration);
    }

    Ok(())
}
