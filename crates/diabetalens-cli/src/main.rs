//! DiabetaLens CLI - diabetes risk forecasting from the command line
//!
//! ## Commands
//!
//! - `diabetalens assess --age 65 --bmi 32 --steps 3500,3500,...` - Full pipeline
//! - `diabetalens baseline 65` - Population baseline for an age
//! - `diabetalens activity --steps-file steps.json` - Activity category
//! - `diabetalens forecast --steps-file steps.json` - 1/3/6 month projections
//! - `diabetalens metrics --age 45 --steps-file steps.json` - Baseline and activity
//! - `diabetalens batch patients.json` - Up to 10 patients at once
//! - `diabetalens config` - Effective configuration as TOML

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use diabetalens_core::{
    ActivityClassifier, BaselineRiskEstimator, BatchPatient, DiabetaConfig,
    FutureActivityProjector, RiskOrchestrator, StepSummary,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod input;
mod render;

use input::StepsArgs;

/// Smallest history the `activity` command accepts
const MIN_ACTIVITY_DAYS: usize = 7;

/// DiabetaLens - short-horizon diabetes risk from age, BMI and step counts
#[derive(Parser)]
#[command(name = "diabetalens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Decision-ensemble model document (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full risk pipeline for one patient
    Assess {
        /// Age in years (0-120)
        #[arg(long)]
        age: u32,

        /// Body-mass index (10-60)
        #[arg(long)]
        bmi: f64,

        #[command(flatten)]
        steps: StepsArgs,
    },

    /// Show the population baseline for an age
    Baseline {
        /// Age in years (0-120)
        age: u32,
    },

    /// Classify a step history (at least 7 days)
    Activity {
        #[command(flatten)]
        steps: StepsArgs,
    },

    /// Project a 28-day history over 1, 3 and 6 months
    Forecast {
        #[command(flatten)]
        steps: StepsArgs,
    },

    /// Baseline and activity without calling the risk model
    Metrics {
        /// Age in years (0-120)
        #[arg(long)]
        age: u32,

        #[command(flatten)]
        steps: StepsArgs,
    },

    /// Assess a JSON array of patients
    Batch {
        /// File holding `[{"age": .., "bmi": .., "past_28_day_steps": [..]}, ..]`
        file: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cli.verbose),
        )
        .init();

    let config = load_config(&cli)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Assess { age, bmi, steps } => {
            let steps = steps.read()?;
            let orchestrator = RiskOrchestrator::from_config(config)?;
            tracing::info!(classifier = orchestrator.classifier_name(), "assessing patient");

            let result = orchestrator.calculate_risk(age, bmi, &steps).await?;
            if cli.json {
                print_json(&result)?;
            } else {
                render::risk_result(&result);
            }
        }

        Commands::Baseline { age } => {
            let info = BaselineRiskEstimator::default().age_group_info(age)?;
            if cli.json {
                print_json(&info)?;
            } else {
                render::age_group_info(&info);
            }
        }

        Commands::Activity { steps } => {
            let steps = steps.read()?;
            if steps.len() < MIN_ACTIVITY_DAYS {
                bail!(
                    "activity needs at least {} daily values, got {}",
                    MIN_ACTIVITY_DAYS,
                    steps.len()
                );
            }
            let assessment = ActivityClassifier::new(config.activity).classify(&steps)?;
            if cli.json {
                print_json(&assessment)?;
            } else {
                render::activity(&assessment);
            }
        }

        Commands::Forecast { steps } => {
            let steps = steps.read()?;
            let projector = FutureActivityProjector::new(config.forecast);
            let forecast = projector.forecast(&steps)?;
            let summary = StepSummary::from_steps(&steps)?;
            if cli.json {
                print_json(&serde_json::json!({
                    "forecast": forecast,
                    "summary": summary,
                }))?;
            } else {
                render::forecast(&forecast, &summary, projector.sedentary_threshold());
            }
        }

        Commands::Metrics { age, steps } => {
            let steps = steps.read()?;
            let orchestrator = RiskOrchestrator::from_config(config)?;
            let metrics = orchestrator.health_metrics(age, &steps)?;
            if cli.json {
                print_json(&metrics)?;
            } else {
                render::age_group_info(&metrics.baseline);
                render::activity(&metrics.step_analysis);
            }
        }

        Commands::Batch { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let patients: Vec<BatchPatient> = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a JSON array of patients", file.display()))?;

            let orchestrator = RiskOrchestrator::from_config(config)?;
            let report = orchestrator.assess_batch(&patients).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                render::batch(&report);
            }
        }

        Commands::Config => {
            if cli.json {
                print_json(&config)?;
            } else {
                print!("{}", config.to_toml_string()?);
            }
        }
    }

    Ok(())
}

/// File, then environment, then command-line flags
fn load_config(cli: &Cli) -> anyhow::Result<DiabetaConfig> {
    let config = match &cli.config {
        Some(path) => DiabetaConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => DiabetaConfig::default(),
    };
    let mut config = config.apply_env_overrides()?;

    if let Some(model) = &cli.model {
        config = config.with_model_path(model);
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
