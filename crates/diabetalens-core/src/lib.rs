//! DiabetaLens Core - short-horizon diabetes risk forecasting
//!
//! DiabetaLens turns a patient's age, BMI and the last 28 days of step
//! counts into diabetes-risk percentages for 1, 3 and 6 months.
//!
//! # Architecture
//!
//! Four stages and the orchestrator that composes them:
//!
//! 1. **Baseline** (`baseline`): population prevalence by age, piecewise linear
//! 2. **Activity** (`activity`): outlier-filtered median of the step history
//! 3. **Risk level** (`classifier`): pluggable model behind [`RiskClassifier`]
//! 4. **Forecast** (`forecast`): the 28-day history tiled over each horizon
//! 5. **Orchestrator** (`orchestrator`): age gate, low-risk gate, additive blend
//!
//! # Quick Start
//!
//! ```
//! use diabetalens_core::{classify_activity, estimate_baseline, ActivityCategory};
//!
//! assert_eq!(estimate_baseline(65).unwrap(), 12.6);
//!
//! let activity = classify_activity(&[7000; 28]).unwrap();
//! assert_eq!(activity.category, ActivityCategory::Moderate);
//! ```
//!
//! Full assessments go through [`RiskOrchestrator`]:
//!
//! ```
//! use diabetalens_core::{DiabetaConfig, RiskMethod, RiskOrchestrator};
//!
//! let orchestrator = RiskOrchestrator::from_config(DiabetaConfig::default()).unwrap();
//! let result = tokio_test::block_on(orchestrator.calculate_risk(65, 32.0, &[3500; 28])).unwrap();
//!
//! assert_eq!(result.method, RiskMethod::ActivityAdjusted);
//! assert!(result.risk_6_month > result.baseline_risk);
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod activity;
pub mod baseline;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod forecast;
pub mod orchestrator;
pub mod recommendations;
pub mod types;

// Re-export commonly used types for convenience
pub use activity::{classify_activity, ActivityAssessment, ActivityClassifier, ActivityThresholds};
pub use baseline::{estimate_baseline, AgeGroupInfo, BaselineCategory, BaselineRiskEstimator};
pub use batch::{BatchEntry, BatchPatient, BatchReport, BatchSummary, MAX_BATCH_SIZE};
pub use classifier::{
    ForestClassifier, ForestModel, RiskClassifier, RiskFeatures, RiskLevelAssessment,
};
pub use config::{ClassifierSettings, DiabetaConfig, PipelineSettings};
pub use error::{DiabetaError, ErrorKind, Result, ResultExt};
pub use forecast::{
    project_future, ActivityForecast, ForecastSettings, FutureActivityProjector,
    FutureStepsProjection, StepSummary,
};
pub use orchestrator::{
    HealthMetrics, PipelineStage, RiskAdjustments, RiskOrchestrator, RiskResult,
};
pub use types::{
    ActivityCategory, AgeGroup, Confidence, Horizon, PatientProfile, RiskLevel, RiskMethod,
    STEP_HISTORY_DAYS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
