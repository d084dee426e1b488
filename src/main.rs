use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mock_interview::history::questions_in_category;
use mock_interview::models::Phase;
use mock_interview::practice::run_practice;
use mock_interview::{
    create_router, AppState, Config, ConfiguredEngines, EngineFactory, HttpInterviewApi,
    InterviewApi, InterviewSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mock-interview")]
#[command(about = "Timed mock interview practice with spoken answers")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/mock-interview")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the session control API
    Serve {
        /// Override the configured HTTP port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one interview session in this terminal
    Practice {
        /// Override the planning phase length in seconds
        #[arg(long)]
        planning_seconds: Option<u64>,
    },
    /// List past sessions with their answers
    History,
    /// List the question bank
    Questions {
        #[arg(long)]
        category: Option<String>,
    },
    /// Add one question to the bank
    AddQuestion {
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Import questions from a spreadsheet
    Import {
        #[arg(long)]
        category: String,
        #[arg(long)]
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mock_interview=info,tower_http=info".into());

    // stdout belongs to the practice prompt
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    info!("Loaded config: {}", cfg.service.name);

    let api: Arc<dyn InterviewApi> = Arc::new(HttpInterviewApi::new(cfg.api.base_url.clone()));

    match cli.command {
        Commands::Serve { port } => serve(&cfg, api, port).await,
        Commands::Practice { planning_seconds } => practice(&cfg, api, planning_seconds).await,
        Commands::History => print_history(&cfg, api.as_ref()).await,
        Commands::Questions { category } => print_questions(api.as_ref(), category).await,
        Commands::AddQuestion {
            category,
            title,
            content,
        } => {
            let ack = api.create_question(&category, &title, &content).await?;
            println!("{}", ack.status);
            Ok(())
        }
        Commands::Import { category, file } => {
            let ack = api.bulk_import_questions(&category, &file).await?;
            match ack.count {
                Some(count) => println!("{} ({} questions)", ack.status, count),
                None => println!("{}", ack.status),
            }
            Ok(())
        }
    }
}

async fn serve(cfg: &Config, api: Arc<dyn InterviewApi>, port: Option<u16>) -> Result<()> {
    let engines: Arc<dyn EngineFactory> = Arc::new(ConfiguredEngines::new(cfg.speech.clone()));
    let state = AppState::new(api, engines, cfg.session_config());
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, port.unwrap_or(cfg.service.http.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn practice(
    cfg: &Config,
    api: Arc<dyn InterviewApi>,
    planning_seconds: Option<u64>,
) -> Result<()> {
    let mut session_config = cfg.session_config();
    if let Some(seconds) = planning_seconds {
        session_config.planning_duration = std::time::Duration::from_secs(seconds);
    }

    let engines = ConfiguredEngines::new(cfg.speech.clone());
    let recognizer = engines.recognizer(&session_config.session_id, &session_config.locale);
    let mut session = InterviewSession::new(session_config, api, recognizer, engines.synthesizer());
    session.start().await?;

    match run_practice(session.spawn()).await? {
        Some(summary) => println!(
            "Saved session ({} answers, {})",
            summary.details.answers.len(),
            mock_interview::history::format_duration(summary.duration_seconds)
        ),
        None => println!("Session left, nothing saved"),
    }
    Ok(())
}

async fn print_history(cfg: &Config, api: &dyn InterviewApi) -> Result<()> {
    let offset = cfg.session.display_utc_offset_hours;
    let entries = api.fetch_history().await?;
    if entries.is_empty() {
        println!("No sessions yet");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  ({})",
            entry.display_date(offset),
            entry.display_duration()
        );
        for phase in [Phase::Plan, Phase::Imm] {
            for (question, answer) in entry.answered_questions(phase) {
                println!("  [{}] {}", phase, question.content);
                println!("      {}", answer);
            }
        }
    }
    Ok(())
}

async fn print_questions(api: &dyn InterviewApi, category: Option<String>) -> Result<()> {
    let questions = api.fetch_questions().await?;
    let selected: Vec<_> = match &category {
        Some(category) => questions_in_category(&questions, category),
        None => questions.iter().collect(),
    };

    for q in selected {
        match &q.title {
            Some(title) => println!("#{} [{}] {}: {}", q.id, q.category, title, q.content),
            None => println!("#{} [{}] {}", q.id, q.category, q.content),
        }
    }
    Ok(())
}
