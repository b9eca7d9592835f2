use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mane_core::{FeatureEncoder, FeatureSchema, SurveyRecord};
use mane_inference::ModelRegistry;
use mane_recommend::{FeedbackTracker, RecommendationService};
use mane_storage::{seed_from_dir, MemoryStore, SnapshotPersistence, SurveyStore};

/// Explainable haircare recommendation engine
#[derive(Parser, Debug)]
#[command(name = "mane")]
#[command(about = "Survey-to-recommendation inference engine", long_about = None)]
struct Args {
    /// Path to the data directory (seed JSON files and store snapshot)
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Path to the frozen model artifacts
    #[arg(long, default_value = "./models")]
    model_dir: PathBuf,

    /// Path to the uploaded survey photos
    #[arg(long, default_value = "./static/uploads")]
    uploads_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build, persist and print the recommendation bundle for a survey
    Recommend {
        #[arg(long)]
        survey_id: i64,
    },
    /// Regenerate recommendations for a user's newest survey, paging by
    /// stored feedback iterations
    Improve {
        #[arg(long)]
        user_id: i64,
    },
    /// Record feedback for a recommendation (rating 0 = thumbs down)
    Feedback {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        rec_id: i64,
        #[arg(long)]
        rating: i32,
    },
    /// Fit the survey encoder on training rows and save its state
    FitEncoder {
        /// JSON array of survey records
        #[arg(long)]
        rows: PathBuf,
        /// Output path for the fitted encoder state
        #[arg(long)]
        out: PathBuf,
    },
    /// Encode a survey and print its feature vector (debugging aid)
    Encode {
        #[arg(long)]
        survey_id: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mane v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Model directory: {:?}", args.model_dir);

    let persistence = SnapshotPersistence::new(args.data_dir.join("store.snapshot"));
    let store = match persistence.load()? {
        Some(store) => store,
        None => seed_from_dir(&args.data_dir)?,
    };
    let store = Arc::new(store);

    match args.command {
        Command::Recommend { survey_id } => {
            let service = build_service(&args, store.clone())?;
            let bundle = service.build(survey_id)?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
            persistence.save(&store)?;
        }
        Command::Improve { user_id } => {
            let service = build_service(&args, store.clone())?;
            let bundle = service.rebuild_latest(user_id)?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
            persistence.save(&store)?;
        }
        Command::Feedback {
            user_id,
            rec_id,
            rating,
        } => {
            let tracker = FeedbackTracker::new(store.clone());
            let iteration = tracker.submit(user_id, rec_id, rating)?;
            println!("recommendation {} is now at iteration {}", rec_id, iteration);
            persistence.save(&store)?;
        }
        Command::FitEncoder { rows, out } => {
            let bytes = std::fs::read(&rows)?;
            let records: Vec<SurveyRecord> = serde_json::from_slice(&bytes)?;
            let mut encoder = FeatureEncoder::new(FeatureSchema::questionnaire_v1());
            encoder.fit(&records)?;
            encoder.save(&out)?;
            println!(
                "encoder fitted on {} rows, {} feature columns, saved to {:?}",
                records.len(),
                encoder.feature_columns()?.len(),
                out
            );
        }
        Command::Encode { survey_id } => {
            let encoder = load_encoder(&args.data_dir);
            let survey = store
                .survey(survey_id)?
                .ok_or(mane_core::Error::SurveyNotFound(survey_id))?;
            let vector = encoder.transform(&survey)?;
            println!("{} columns", vector.len());
            println!("{:?}", vector);
        }
    }

    Ok(())
}

fn build_service(
    args: &Args,
    store: Arc<MemoryStore>,
) -> anyhow::Result<RecommendationService<MemoryStore>> {
    let encoder = load_encoder(&args.data_dir);
    let models = ModelRegistry::load(&args.model_dir);
    Ok(RecommendationService::new(
        store,
        encoder,
        models,
        &args.uploads_dir,
    )?)
}

/// The fitted encoder state if one was shipped; otherwise an unfitted
/// encoder. Running the tabular model against an unfitted encoder is a
/// hard `NotFitted` error rather than a degradation.
fn load_encoder(data_dir: &std::path::Path) -> FeatureEncoder {
    let path = data_dir.join("survey_encoder.bin");
    if path.exists() {
        match FeatureEncoder::load(&path) {
            Ok(encoder) => return encoder,
            Err(e) => warn!(error = %e, "failed to load encoder state"),
        }
    } else {
        warn!(path = %path.display(), "no encoder state found");
    }
    FeatureEncoder::new(FeatureSchema::questionnaire_v1())
}
