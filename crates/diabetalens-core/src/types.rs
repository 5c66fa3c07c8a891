//! Core types for DiabetaLens
//!
//! This module defines the value types shared by every pipeline stage:
//! - Patient input (`PatientProfile`) and its boundary validation
//! - Activity categories, risk levels and classifier confidence
//! - Forecast horizons and the calculation method tag

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DiabetaError, Result};

/// Number of daily step counts in a patient history
pub const STEP_HISTORY_DAYS: usize = 28;

/// Largest daily step count accepted at the input boundary
pub const MAX_DAILY_STEPS: u32 = 100_000;

/// Oldest accepted age in years
pub const MAX_AGE: u32 = 120;

/// Accepted BMI range, inclusive
pub const BMI_RANGE: (f64, f64) = (10.0, 60.0);

/// Overall activity category derived from a step history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Low,
    Moderate,
    High,
}

impl ActivityCategory {
    /// Upper bound (inclusive) of the `Low` band with default thresholds
    pub const DEFAULT_LOW_MAX: f64 = 6000.0;

    /// Upper bound (inclusive) of the `Moderate` band with default thresholds
    pub const DEFAULT_MODERATE_MAX: f64 = 10000.0;

    /// Classify a single daily value with the default 6000/10000 thresholds
    pub fn from_steps(steps: f64) -> Self {
        Self::with_thresholds(steps, Self::DEFAULT_LOW_MAX, Self::DEFAULT_MODERATE_MAX)
    }

    /// Classify a value against explicit band limits
    pub fn with_thresholds(steps: f64, low_max: f64, moderate_max: f64) -> Self {
        if steps <= low_max {
            ActivityCategory::Low
        } else if steps <= moderate_max {
            ActivityCategory::Moderate
        } else {
            ActivityCategory::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Low => "low",
            ActivityCategory::Moderate => "moderate",
            ActivityCategory::High => "high",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diabetes risk level reported by the risk classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    LowRisk,
    MediumRisk,
    HighRisk,
}

impl RiskLevel {
    /// Band a probability: [0, 0.3) low, [0.3, 0.6) medium, [0.6, 1.0] high
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            RiskLevel::LowRisk
        } else if probability < 0.6 {
            RiskLevel::MediumRisk
        } else {
            RiskLevel::HighRisk
        }
    }

    /// Whether this level triggers the activity-adjusted path
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::MediumRisk | RiskLevel::HighRisk)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::LowRisk => "low-risk",
            RiskLevel::MediumRisk => "medium-risk",
            RiskLevel::HighRisk => "high-risk",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence attached to a classifier probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// High when the probability is far from the decision region, medium otherwise
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.2 || probability > 0.8 {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(label)
    }
}

/// Forecast window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    OneMonth,
    ThreeMonths,
    SixMonths,
}

impl Horizon {
    /// All horizons in ascending order
    pub const ALL: [Horizon; 3] = [Horizon::OneMonth, Horizon::ThreeMonths, Horizon::SixMonths];

    pub fn months(self) -> u32 {
        match self {
            Horizon::OneMonth => 1,
            Horizon::ThreeMonths => 3,
            Horizon::SixMonths => 6,
        }
    }

    /// Length of the window in days (30 per month)
    pub fn days(self) -> usize {
        self.months() as usize * 30
    }

    /// Map a day count back to a horizon
    pub fn from_days(days: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.days() == days)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.months() {
            1 => f.write_str("1 month"),
            n => write!(f, "{} months", n),
        }
    }
}

/// Which rule produced the horizon percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMethod {
    BaselineOnly,
    ActivityAdjusted,
}

impl fmt::Display for RiskMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskMethod::BaselineOnly => f.write_str("baseline_only"),
            RiskMethod::ActivityAdjusted => f.write_str("activity_adjusted"),
        }
    }
}

/// Coarse age grouping reported alongside a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    YoungAdult,
    Adult,
}

/// Validated patient input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Age in whole years, [0, 120]
    pub age: u32,
    /// Body-mass index, [10, 60]
    pub bmi: f64,
    /// Daily step counts, oldest first
    #[serde(rename = "past_28_day_steps", alias = "steps")]
    pub steps: Vec<u32>,
}

impl PatientProfile {
    /// Build and validate a profile
    pub fn new(age: u32, bmi: f64, steps: impl Into<Vec<u32>>) -> Result<Self> {
        let profile = Self {
            age,
            bmi,
            steps: steps.into(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check every boundary invariant; profiles built through serde must call this
    pub fn validate(&self) -> Result<()> {
        validate_age(self.age)?;
        validate_bmi(self.bmi)?;
        validate_step_history(&self.steps)
    }
}

pub(crate) fn validate_age(age: u32) -> Result<()> {
    if age > MAX_AGE {
        return Err(DiabetaError::invalid(format!(
            "age must be between 0 and {}, got {}",
            MAX_AGE, age
        )));
    }
    Ok(())
}

pub(crate) fn validate_bmi(bmi: f64) -> Result<()> {
    let (min, max) = BMI_RANGE;
    if !bmi.is_finite() || bmi < min || bmi > max {
        return Err(DiabetaError::invalid(format!(
            "BMI must be between {} and {}, got {}",
            min, max, bmi
        )));
    }
    Ok(())
}

/// Exactly 28 values, none above [`MAX_DAILY_STEPS`]
pub(crate) fn validate_step_history(steps: &[u32]) -> Result<()> {
    if steps.len() != STEP_HISTORY_DAYS {
        return Err(DiabetaError::invalid(format!(
            "step history must contain exactly {} daily values, got {}",
            STEP_HISTORY_DAYS,
            steps.len()
        )));
    }
    if let Some((day, value)) = steps
        .iter()
        .enumerate()
        .find(|(_, &value)| value > MAX_DAILY_STEPS)
    {
        return Err(DiabetaError::invalid(format!(
            "day {} has {} steps, above the {} limit",
            day + 1,
            value,
            MAX_DAILY_STEPS
        )));
    }
    Ok(())
}

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_activity_category_bands() {
        assert_eq!(ActivityCategory::from_steps(0.0), ActivityCategory::Low);
        assert_eq!(ActivityCategory::from_steps(6000.0), ActivityCategory::Low);
        assert_eq!(ActivityCategory::from_steps(6000.5), ActivityCategory::Moderate);
        assert_eq!(ActivityCategory::from_steps(10000.0), ActivityCategory::Moderate);
        assert_eq!(ActivityCategory::from_steps(10000.5), ActivityCategory::High);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::LowRisk);
        assert_eq!(RiskLevel::from_probability(0.2999), RiskLevel::LowRisk);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::MediumRisk);
        assert_eq!(RiskLevel::from_probability(0.5999), RiskLevel::MediumRisk);
        assert_eq!(RiskLevel::from_probability(0.6), RiskLevel::HighRisk);
        assert_eq!(RiskLevel::from_probability(1.0), RiskLevel::HighRisk);
        assert!(!RiskLevel::LowRisk.is_elevated());
        assert!(RiskLevel::MediumRisk.is_elevated());
    }

    #[test]
    fn test_confidence() {
        assert_eq!(Confidence::from_probability(0.1), Confidence::High);
        assert_eq!(Confidence::from_probability(0.2), Confidence::Medium);
        assert_eq!(Confidence::from_probability(0.8), Confidence::Medium);
        assert_eq!(Confidence::from_probability(0.885), Confidence::High);
    }

    #[test]
    fn test_risk_level_serde() {
        let json = serde_json::to_string(&RiskLevel::MediumRisk).unwrap();
        assert_eq!(json, "\"medium-risk\"");
        let parsed: RiskLevel = serde_json::from_str("\"high-risk\"").unwrap();
        assert_eq!(parsed, RiskLevel::HighRisk);
    }

    #[test]
    fn test_horizon_days() {
        let days: Vec<usize> = Horizon::ALL.iter().map(|h| h.days()).collect();
        assert_eq!(days, vec![30, 90, 180]);
        assert_eq!(Horizon::from_days(90), Some(Horizon::ThreeMonths));
        assert_eq!(Horizon::from_days(60), None);
        assert_eq!(Horizon::SixMonths.to_string(), "6 months");
    }

    #[test]
    fn test_profile_validation() {
        assert!(PatientProfile::new(45, 28.5, vec![8000; 28]).is_ok());

        let cases = [
            PatientProfile::new(121, 25.0, vec![8000; 28]),
            PatientProfile::new(45, 9.9, vec![8000; 28]),
            PatientProfile::new(45, 60.1, vec![8000; 28]),
            PatientProfile::new(45, f64::NAN, vec![8000; 28]),
            PatientProfile::new(45, 25.0, vec![8000; 27]),
            PatientProfile::new(45, 25.0, vec![8000; 29]),
        ];
        for case in cases {
            assert_eq!(case.unwrap_err().kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_profile_rejects_implausible_steps() {
        let mut steps = vec![8000; 28];
        steps[3] = 100_001;
        let err = PatientProfile::new(45, 25.0, steps).unwrap_err();
        assert!(err.to_string().contains("day 4"));

        let mut steps = vec![8000; 28];
        steps[0] = MAX_DAILY_STEPS;
        assert!(PatientProfile::new(45, 25.0, steps).is_ok());
    }

    #[test]
    fn test_profile_deserialize_field_names() {
        let json = format!(
            r#"{{"age": 50, "bmi": 30.0, "past_28_day_steps": {:?}}}"#,
            vec![5000; 28]
        );
        let profile: PatientProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile.steps.len(), 28);

        let json = format!(r#"{{"age": 50, "bmi": 30.0, "steps": {:?}}}"#, vec![5000; 28]);
        let profile: PatientProfile = serde_json::from_str(&json).unwrap();
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.5964, 1), 1.6);
        assert_eq!(round_to(12.6049, 2), 12.6);
        assert_eq!(round_to(0.88499999, 4), 0.885);
    }
}
