//! Reading Curator CLI
//!
//! Loads a content catalog and a learner's task logs from JSON, then runs one
//! curation query and prints the result as JSON on stdout. Logs go to stderr.
//!
//! # Commands
//!
//! - **recommend**: one item for a time budget
//! - **rank**: items aimed at a skill category
//! - **topic**: a topic to explore next
//! - **difficulty**: baseline and trend-aware difficulty
//! - **profile**: performance signals and reading profile

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use curator::loader;
use curator::recommendation::signals::SKILL_CATEGORIES;
use curator::recommendation::{
    CurationEngine, DifficultyLevel, PerformanceSignals, ReadingProfile, RecommendationQuery,
    SkillCategory, TopicPreferences,
};
use curator::Config;

#[derive(Debug, Parser)]
#[command(name = "curator", version, about = "Reading content curation and recommendation")]
struct Cli {
    /// Content catalog (JSON array)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Task log document (JSON)
    #[arg(long, global = true)]
    logs: Option<PathBuf>,

    /// Word mastery map (JSON)
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// Seed for reproducible sampling
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Topic to keep out of rotation (repeatable)
    #[arg(long = "avoid", global = true)]
    avoid: Vec<String>,

    /// Topic to favour in rotation (repeatable)
    #[arg(long = "prefer", global = true)]
    prefer: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recommend one item for the available time
    Recommend {
        #[arg(long)]
        minutes: u32,
    },
    /// Rank items for a skill category (grammar, reading, listening, vocab)
    Rank {
        #[arg(long)]
        category: String,
    },
    /// Pick a topic to explore
    Topic,
    /// Show the optimal and predicted difficulty
    Difficulty {
        /// Base level for the prediction (defaults to the optimal level)
        #[arg(long)]
        base: Option<String>,
    },
    /// Show performance signals and the reading profile
    Profile,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(path) = cli.catalog {
        config.data.catalog_path = path;
    }
    if let Some(path) = cli.logs {
        config.data.logs_path = path;
    }
    if cli.vocabulary.is_some() {
        config.data.vocabulary_path = cli.vocabulary;
    }

    let catalog = loader::load_catalog(&config.data.catalog_path)
        .with_context(|| format!("failed to load catalog {}", config.data.catalog_path.display()))?;
    let preferences = TopicPreferences {
        avoided: cli.avoid,
        preferred: cli.prefer,
    };
    let snapshot = loader::load_snapshot(&config.data, preferences)?;

    let engine = CurationEngine::with_settings(
        Arc::new(catalog),
        config.engine.weights.clone(),
        config.engine.settings(),
    )?;

    let seed = cli.seed.or(config.engine.rng_seed).unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    info!("🎲 Sampling seed {}", seed);

    let output = match cli.command {
        Command::Recommend { minutes } => {
            let query = RecommendationQuery::now(minutes);
            match engine.recommend(&query, &snapshot, &mut rng) {
                Some(recommendation) => serde_json::to_value(&recommendation)?,
                None => serde_json::Value::Null,
            }
        }
        Command::Rank { category } => {
            let category = SkillCategory::lookup(&category).ok_or_else(|| {
                let known: Vec<&str> = SKILL_CATEGORIES.iter().map(|c| c.name).collect();
                anyhow!(
                    "unknown skill category '{}', expected one of {}",
                    category,
                    known.join(", ")
                )
            })?;
            serde_json::to_value(engine.rank_for_category(&category, &snapshot))?
        }
        Command::Topic => {
            let now_millis = chrono::Utc::now().timestamp_millis();
            serde_json::json!({ "topic": engine.recommend_topic(&snapshot, now_millis, &mut rng) })
        }
        Command::Difficulty { base } => {
            let base = base
                .map(|level| level.parse::<DifficultyLevel>())
                .transpose()?;
            let optimal = engine.optimal_difficulty(&snapshot);
            let predicted = engine.predict_difficulty(base, &snapshot);
            serde_json::json!({
                "current_week": snapshot.current_week(),
                "optimal": optimal,
                "predicted": predicted,
                "predicted_name": predicted.display_name(),
            })
        }
        Command::Profile => {
            serde_json::json!({
                "current_week": snapshot.current_week(),
                "signals": PerformanceSignals::extract(&snapshot.logs),
                "profile": ReadingProfile::from_logs(&snapshot.logs),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Initialize structured logging with tracing
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Default log levels
        EnvFilter::new("curator=info,warn")
    });

    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("CURATOR_LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(std::env::var("NO_COLOR").is_err())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
