//! Risk Level Classifier capability
//!
//! The pipeline never looks inside a model. It hands a [`RiskFeatures`] to a
//! [`RiskClassifier`], receives a probability, and bands it itself:
//! [0, 0.3) low-risk, [0.3, 0.6) medium-risk, [0.6, 1.0] high-risk.
//!
//! Implementations must be deterministic for identical features and safe to
//! share across concurrent requests.

pub mod forest;

pub use forest::{ForestClassifier, ForestModel};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DiabetaError, Result};
use crate::types::{round_to, ActivityCategory, Confidence, RiskLevel};

/// Inputs handed to a classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub age: u32,
    pub bmi: f64,
    pub activity: ActivityCategory,
}

/// Banded classifier output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelAssessment {
    /// Probability of elevated risk, four decimals (banding uses the raw value)
    pub probability: f64,
    pub level: RiskLevel,
    pub confidence: Confidence,
}

impl RiskLevelAssessment {
    /// Validate and band a raw probability; NaN or out-of-range is a malformed answer
    pub fn from_probability(probability: f64) -> Result<Self> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(DiabetaError::classifier(format!(
                "malformed probability {}",
                probability
            )));
        }
        Ok(Self {
            probability: round_to(probability, 4),
            level: RiskLevel::from_probability(probability),
            confidence: Confidence::from_probability(probability),
        })
    }
}

/// Capability implemented by every risk model
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    /// Identifier used in diagnostics
    fn name(&self) -> &str;

    /// Probability in [0, 1] that the patient is at elevated risk
    async fn predict_probability(&self, features: &RiskFeatures) -> Result<f64>;
}
