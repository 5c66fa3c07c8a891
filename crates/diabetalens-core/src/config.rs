//! Pipeline configuration
//!
//! Every tunable constant of the pipeline lives here with its published
//! default. A deployment overrides them from a TOML file and, for the
//! classifier section, from environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::activity::ActivityThresholds;
use crate::error::{DiabetaError, Result};
use crate::forecast::ForecastSettings;

/// Environment variable overriding `classifier.model_path`
pub const ENV_MODEL_PATH: &str = "DIABETALENS_MODEL_PATH";

/// Environment variable overriding `classifier.timeout_ms`
pub const ENV_CLASSIFIER_TIMEOUT_MS: &str = "DIABETALENS_CLASSIFIER_TIMEOUT_MS";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiabetaConfig {
    /// Outlier bounds and activity bands
    pub activity: ActivityThresholds,

    /// Sedentary cut-off for projections
    pub forecast: ForecastSettings,

    /// Gating and blending rules
    pub pipeline: PipelineSettings,

    /// Model source and call budget
    pub classifier: ClassifierSettings,
}

impl DiabetaConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a model document instead of the built-in reference ensemble
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.classifier.model_path = Some(path.into());
        self
    }

    /// Set the classifier call budget
    pub fn with_classifier_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.classifier.timeout_ms = timeout_ms;
        self
    }

    /// Clamp activity-adjusted percentages to `ceiling`
    pub fn with_risk_ceiling(mut self, ceiling: f64) -> Self {
        self.pipeline.risk_ceiling = Some(ceiling);
        self
    }

    /// Set the sedentary cut-off
    pub fn with_sedentary_threshold(mut self, threshold: u32) -> Self {
        self.forecast.sedentary_threshold = threshold;
        self
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DiabetaError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DiabetaError::Config(format!("cannot render TOML: {}", e)))
    }

    /// Apply `DIABETALENS_*` overrides from the process environment
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_MODEL_PATH).filter(|p| !p.trim().is_empty()) {
            self.classifier.model_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_CLASSIFIER_TIMEOUT_MS) {
            self.classifier.timeout_ms = raw.trim().parse().map_err(|_| {
                DiabetaError::Config(format!(
                    "{} must be a whole number of milliseconds, got '{}'",
                    ENV_CLASSIFIER_TIMEOUT_MS, raw
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject internally inconsistent settings
    pub fn validate(&self) -> Result<()> {
        let a = &self.activity;
        if a.outlier_min > a.outlier_max {
            return Err(DiabetaError::Config(format!(
                "activity.outlier_min ({}) exceeds activity.outlier_max ({})",
                a.outlier_min, a.outlier_max
            )));
        }
        if !a.low_max.is_finite() || !a.moderate_max.is_finite() || a.low_max >= a.moderate_max {
            return Err(DiabetaError::Config(format!(
                "activity.low_max ({}) must be below activity.moderate_max ({})",
                a.low_max, a.moderate_max
            )));
        }

        let p = &self.pipeline;
        if !p.sedentary_day_increment.is_finite() || p.sedentary_day_increment < 0.0 {
            return Err(DiabetaError::Config(format!(
                "pipeline.sedentary_day_increment must be non-negative, got {}",
                p.sedentary_day_increment
            )));
        }
        if let Some(ceiling) = p.risk_ceiling {
            if !ceiling.is_finite() || ceiling <= 0.0 {
                return Err(DiabetaError::Config(format!(
                    "pipeline.risk_ceiling must be positive, got {}",
                    ceiling
                )));
            }
        }

        if self.classifier.timeout_ms == 0 {
            return Err(DiabetaError::Config(
                "classifier.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gating and blending rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Patients younger than this get the baseline for every horizon
    pub age_gate: u32,

    /// Percentage points added per projected sedentary day
    pub sedentary_day_increment: f64,

    /// Optional upper clamp on activity-adjusted percentages (unbounded when absent).
    /// A ceiling below a patient's baseline leaves that patient at the baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_ceiling: Option<f64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            age_gate: 30,
            sedentary_day_increment: 0.1,
            risk_ceiling: None,
        }
    }
}

/// Model source and call budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Model document; the built-in reference ensemble when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    /// Upper bound on a single classifier call
    pub timeout_ms: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_path: None,
            timeout_ms: 2000,
        }
    }
}

impl ClassifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
