//! Risk Orchestrator
//!
//! Runs the pipeline for one patient:
//!
//! ```text
//! Start -> BaselineComputed -+-> TerminalBaseline                  (age < gate)
//!                            +-> ActivityComputed -> RiskClassified
//!                                  +-> TerminalBaseline            (low-risk)
//!                                  +-> Projected -> TerminalAdjusted
//! ```
//!
//! Later stages are only reached when the earlier gate lets the patient
//! through, so the common young / low-risk path never calls the projector.
//! The single suspension point is the classifier call, which is bounded by
//! `classifier.timeout_ms`. Calls must run inside a Tokio runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::activity::{ActivityAssessment, ActivityClassifier};
use crate::baseline::{AgeGroupInfo, BaselineRiskEstimator};
use crate::classifier::{ForestClassifier, RiskClassifier, RiskFeatures, RiskLevelAssessment};
use crate::config::DiabetaConfig;
use crate::error::{DiabetaError, ErrorKind, Result};
use crate::forecast::{ActivityForecast, FutureActivityProjector};
use crate::recommendations::{recommendations_for, Pathway};
use crate::types::{
    round_to, validate_age, validate_bmi, validate_step_history, AgeGroup, Horizon, PatientProfile,
    RiskMethod,
};

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    BaselineComputed,
    ActivityComputed,
    RiskClassified,
    Projected,
    TerminalBaseline,
    TerminalAdjusted,
}

impl PipelineStage {
    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Start, BaselineComputed)
                | (BaselineComputed, TerminalBaseline)
                | (BaselineComputed, ActivityComputed)
                | (ActivityComputed, RiskClassified)
                | (RiskClassified, TerminalBaseline)
                | (RiskClassified, Projected)
                | (Projected, TerminalAdjusted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineStage::TerminalBaseline | PipelineStage::TerminalAdjusted
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Tracks the current stage of one run
#[derive(Debug)]
struct StageTracker {
    age: u32,
    current: PipelineStage,
}

impl StageTracker {
    fn new(age: u32) -> Self {
        Self {
            age,
            current: PipelineStage::Start,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal pipeline transition {} -> {}",
            self.current,
            next
        );
        tracing::debug!(age = self.age, from = %self.current, to = %next, "pipeline transition");
        self.current = next;
    }
}

/// Percentage points added on top of the baseline, per horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustments {
    pub one_month: f64,
    pub three_months: f64,
    pub six_months: f64,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub age: u32,
    pub bmi: f64,
    pub age_group: AgeGroup,
    pub baseline_risk: f64,
    pub risk_1_month: f64,
    pub risk_3_month: f64,
    pub risk_6_month: f64,
    pub method: RiskMethod,
    pub reason: String,
    /// Absent when the age gate ends the run: below the gate the pipeline
    /// goes straight from the baseline to its terminal state, so activity is
    /// never assessed and the steps cannot influence the result
    pub activity: Option<ActivityAssessment>,
    pub risk_level: Option<RiskLevelAssessment>,
    pub risk_adjustments: Option<RiskAdjustments>,
    pub forecast: Option<ActivityForecast>,
    pub recommendations: Vec<String>,
}

impl RiskResult {
    pub fn risk_for(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::OneMonth => self.risk_1_month,
            Horizon::ThreeMonths => self.risk_3_month,
            Horizon::SixMonths => self.risk_6_month,
        }
    }
}

/// Baseline and activity without a classifier call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub age: u32,
    pub baseline_risk: f64,
    pub baseline: AgeGroupInfo,
    pub step_analysis: ActivityAssessment,
}

/// Composes the estimator, classifiers and projector
#[derive(Clone)]
pub struct RiskOrchestrator {
    config: DiabetaConfig,
    baseline: BaselineRiskEstimator,
    activity: ActivityClassifier,
    projector: FutureActivityProjector,
    classifier: Arc<dyn RiskClassifier>,
}

impl fmt::Debug for RiskOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskOrchestrator")
            .field("config", &self.config)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl RiskOrchestrator {
    /// Build from a validated configuration and a shared classifier
    pub fn new(config: DiabetaConfig, classifier: Arc<dyn RiskClassifier>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            baseline: BaselineRiskEstimator::default(),
            activity: ActivityClassifier::new(config.activity.clone()),
            projector: FutureActivityProjector::new(config.forecast.clone()),
            config,
            classifier,
        })
    }

    /// Build with the model named in `config`, or the reference ensemble
    pub fn from_config(config: DiabetaConfig) -> Result<Self> {
        let classifier: Arc<dyn RiskClassifier> = match &config.classifier.model_path {
            Some(path) => Arc::new(ForestClassifier::from_file(path)?),
            None => ForestClassifier::reference()?,
        };
        Self::new(config, classifier)
    }

    pub fn config(&self) -> &DiabetaConfig {
        &self.config
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Run the pipeline for a profile (validated again here)
    pub async fn assess(&self, profile: &PatientProfile) -> Result<RiskResult> {
        self.calculate_risk(profile.age, profile.bmi, &profile.steps)
            .await
    }

    /// Horizon percentages for one patient
    pub async fn calculate_risk(&self, age: u32, bmi: f64, steps: &[u32]) -> Result<RiskResult> {
        validate_age(age)?;
        validate_bmi(bmi)?;
        validate_step_history(steps)?;

        let mut stage = StageTracker::new(age);
        let gate = self.config.pipeline.age_gate;

        let baseline_risk = self.baseline.estimate(age)?;
        stage.advance(PipelineStage::BaselineComputed);

        if age < gate {
            stage.advance(PipelineStage::TerminalBaseline);
            return Ok(RiskResult {
                age,
                bmi,
                age_group: AgeGroup::YoungAdult,
                baseline_risk,
                risk_1_month: baseline_risk,
                risk_3_month: baseline_risk,
                risk_6_month: baseline_risk,
                method: RiskMethod::BaselineOnly,
                reason: format!("Age < {}: using baseline risk for all horizons", gate),
                activity: None,
                risk_level: None,
                risk_adjustments: None,
                forecast: None,
                recommendations: recommendations_for(Pathway::Young, None),
            });
        }

        let activity = self.activity.classify(steps)?;
        stage.advance(PipelineStage::ActivityComputed);

        let risk_level = self
            .classify_risk(RiskFeatures {
                age,
                bmi,
                activity: activity.category,
            })
            .await?;
        stage.advance(PipelineStage::RiskClassified);

        if !risk_level.level.is_elevated() {
            stage.advance(PipelineStage::TerminalBaseline);
            return Ok(RiskResult {
                age,
                bmi,
                age_group: AgeGroup::Adult,
                baseline_risk,
                risk_1_month: baseline_risk,
                risk_3_month: baseline_risk,
                risk_6_month: baseline_risk,
                method: RiskMethod::BaselineOnly,
                reason: format!(
                    "Age >= {} but {}: using baseline risk for all horizons",
                    gate, risk_level.level
                ),
                recommendations: recommendations_for(Pathway::LowRisk, Some(activity.category)),
                activity: Some(activity),
                risk_level: Some(risk_level),
                risk_adjustments: None,
                forecast: None,
            });
        }

        let forecast = self.projector.forecast(steps)?;
        stage.advance(PipelineStage::Projected);

        let increment = self.config.pipeline.sedentary_day_increment;
        let adjustment = |h: Horizon| round_to(forecast.sedentary_days(h) as f64 * increment, 2);
        let adjustments = RiskAdjustments {
            one_month: adjustment(Horizon::OneMonth),
            three_months: adjustment(Horizon::ThreeMonths),
            six_months: adjustment(Horizon::SixMonths),
        };
        let blended = |h: Horizon| {
            let raw = baseline_risk + forecast.sedentary_days(h) as f64 * increment;
            let capped = match self.config.pipeline.risk_ceiling {
                Some(ceiling) => raw.min(ceiling).max(baseline_risk),
                None => raw,
            };
            round_to(capped, 2)
        };

        let result = RiskResult {
            age,
            bmi,
            age_group: AgeGroup::Adult,
            baseline_risk,
            risk_1_month: blended(Horizon::OneMonth),
            risk_3_month: blended(Horizon::ThreeMonths),
            risk_6_month: blended(Horizon::SixMonths),
            method: RiskMethod::ActivityAdjusted,
            reason: format!(
                "Age >= {} and {}: using activity-adjusted risk",
                gate, risk_level.level
            ),
            recommendations: recommendations_for(
                Pathway::AtRisk(risk_level.level),
                Some(activity.category),
            ),
            activity: Some(activity),
            risk_level: Some(risk_level),
            risk_adjustments: Some(adjustments),
            forecast: Some(forecast),
        };
        stage.advance(PipelineStage::TerminalAdjusted);
        Ok(result)
    }

    /// One bounded classifier call; every failure surfaces as `ClassifierUnavailable`
    async fn classify_risk(&self, features: RiskFeatures) -> Result<RiskLevelAssessment> {
        let budget = self.config.classifier.timeout();
        let name = self.classifier.name();

        let probability =
            match tokio::time::timeout(budget, self.classifier.predict_probability(&features)).await
            {
                Ok(Ok(probability)) => probability,
                Ok(Err(e)) if e.kind() == ErrorKind::ClassifierUnavailable => return Err(e),
                Ok(Err(e)) => {
                    return Err(DiabetaError::classifier(format!("{} failed: {}", name, e)))
                }
                Err(_) => {
                    return Err(DiabetaError::classifier(format!(
                        "{} did not answer within {:?}",
                        name, budget
                    )))
                }
            };

        RiskLevelAssessment::from_probability(probability)
            .map_err(|e| e.context(format!("classifier {}", name)))
    }

    /// Baseline and activity summary, no classifier involved
    pub fn health_metrics(&self, age: u32, steps: &[u32]) -> Result<HealthMetrics> {
        validate_age(age)?;
        validate_step_history(steps)?;

        let baseline = self.baseline.age_group_info(age)?;
        let step_analysis = self.activity.classify(steps)?;
        Ok(HealthMetrics {
            age,
            baseline_risk: baseline.risk_percentage,
            baseline,
            step_analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns a fixed probability and counts calls
    struct FixedClassifier {
        probability: f64,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(probability: f64) -> Arc<Self> {
            Arc::new(Self {
                probability,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RiskClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn predict_probability(&self, _features: &RiskFeatures) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probability)
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl RiskClassifier for SlowClassifier {
        fn name(&self) -> &str {
            "slow"
        }

        async fn predict_probability(&self, _features: &RiskFeatures) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(0.9)
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl RiskClassifier for BrokenClassifier {
        fn name(&self) -> &str {
            "broken"
        }

        async fn predict_probability(&self, _features: &RiskFeatures) -> Result<f64> {
            Err(DiabetaError::Config("model directory missing".into()))
        }
    }

    fn orchestrator(classifier: Arc<dyn RiskClassifier>) -> RiskOrchestrator {
        RiskOrchestrator::new(DiabetaConfig::default(), classifier).unwrap()
    }

    #[test]
    fn test_stage_transitions() {
        use PipelineStage::*;
        assert!(Start.can_transition_to(BaselineComputed));
        assert!(BaselineComputed.can_transition_to(TerminalBaseline));
        assert!(RiskClassified.can_transition_to(TerminalBaseline));
        assert!(Projected.can_transition_to(TerminalAdjusted));
        assert!(!Start.can_transition_to(Projected));
        assert!(!ActivityComputed.can_transition_to(Projected));
        assert!(!TerminalAdjusted.can_transition_to(Start));
        assert!(TerminalBaseline.is_terminal());
        assert!(!Projected.is_terminal());
    }

    #[tokio::test]
    async fn test_young_patient_skips_classifier() {
        let classifier = FixedClassifier::new(0.95);
        let orch = orchestrator(classifier.clone());

        let result = orch.calculate_risk(25, 22.0, &[8000; 28]).await.unwrap();

        assert_eq!(result.method, RiskMethod::BaselineOnly);
        assert_eq!(result.age_group, AgeGroup::YoungAdult);
        assert_eq!(result.risk_1_month, result.baseline_risk);
        assert_eq!(result.risk_6_month, result.baseline_risk);
        assert!(result.activity.is_none());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_low_risk_gate() {
        let classifier = FixedClassifier::new(0.12);
        let orch = orchestrator(classifier.clone());

        let result = orch.calculate_risk(45, 24.0, &[3000; 28]).await.unwrap();

        assert_eq!(result.method, RiskMethod::BaselineOnly);
        assert_eq!(result.risk_3_month, result.baseline_risk);
        assert!(result.forecast.is_none());
        assert_eq!(result.risk_level.unwrap().level, crate::types::RiskLevel::LowRisk);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_activity_adjusted_blend() {
        let orch = orchestrator(FixedClassifier::new(0.45));
        let mut steps = vec![8000; 28];
        steps[0] = 4000;
        steps[1] = 4500;

        let result = orch.calculate_risk(50, 29.0, &steps).await.unwrap();
        let forecast = result.forecast.as_ref().unwrap();

        // 30 days: both sedentary days appear twice; 90 = 3*28 + 6; 180 = 6*28 + 12
        assert_eq!(forecast.sedentary_days(Horizon::OneMonth), 4);
        assert_eq!(forecast.sedentary_days(Horizon::ThreeMonths), 8);
        assert_eq!(forecast.sedentary_days(Horizon::SixMonths), 14);

        let b = result.baseline_risk;
        assert!((result.risk_1_month - (b + 0.4)).abs() < 1e-9);
        assert!((result.risk_3_month - (b + 0.8)).abs() < 1e-9);
        assert!((result.risk_6_month - (b + 1.4)).abs() < 1e-9);
        assert_eq!(result.method, RiskMethod::ActivityAdjusted);
        assert_eq!(result.risk_adjustments.unwrap().six_months, 1.4);
    }

    #[tokio::test]
    async fn test_risk_ceiling() {
        let config = DiabetaConfig::default().with_risk_ceiling(20.0);
        let orch = RiskOrchestrator::new(config, FixedClassifier::new(0.9)).unwrap();

        let result = orch.calculate_risk(65, 32.0, &[3500; 28]).await.unwrap();
        assert_eq!(result.risk_6_month, 20.0);
        assert!(result.risk_1_month < 20.0);
    }

    #[tokio::test]
    async fn test_ceiling_below_baseline_keeps_baseline() {
        let config = DiabetaConfig::default().with_risk_ceiling(5.0);
        let orch = RiskOrchestrator::new(config, FixedClassifier::new(0.9)).unwrap();

        let result = orch.calculate_risk(65, 32.0, &[3500; 28]).await.unwrap();
        assert_eq!(result.baseline_risk, 12.6);
        for horizon in Horizon::ALL {
            assert_eq!(result.risk_for(horizon), result.baseline_risk);
        }
    }

    #[tokio::test]
    async fn test_probability_just_below_band_stays_low_risk() {
        let classifier = FixedClassifier::new(0.29996);
        let orch = orchestrator(classifier.clone());

        let result = orch.calculate_risk(50, 30.0, &[3500; 28]).await.unwrap();
        let level = result.risk_level.unwrap();

        assert_eq!(level.level, crate::types::RiskLevel::LowRisk);
        assert_eq!(level.probability, 0.3);
        assert_eq!(result.method, RiskMethod::BaselineOnly);
        assert_eq!(result.risk_6_month, result.baseline_risk);
        assert!(result.forecast.is_none());
    }

    #[tokio::test]
    async fn test_invalid_inputs_fail_before_any_stage() {
        let classifier = FixedClassifier::new(0.9);
        let orch = orchestrator(classifier.clone());

        for (age, bmi, len) in [(121, 25.0, 28), (50, 61.0, 28), (50, 25.0, 27), (25, 25.0, 3)] {
            let err = orch
                .calculate_risk(age, bmi, &vec![8000; len])
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_outliers_fail_for_adults() {
        let orch = orchestrator(FixedClassifier::new(0.9));
        let err = orch.calculate_risk(50, 30.0, &[60; 28]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[tokio::test]
    async fn test_classifier_timeout() {
        let config = DiabetaConfig::default().with_classifier_timeout_ms(20);
        let orch = RiskOrchestrator::new(config, Arc::new(SlowClassifier)).unwrap();
        let err = orch.calculate_risk(60, 30.0, &[4000; 28]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClassifierUnavailable);
        assert!(err.to_string().contains("slow"));
    }

    #[tokio::test]
    async fn test_classifier_failure_is_not_masked() {
        let orch = orchestrator(Arc::new(BrokenClassifier));
        let err = orch.calculate_risk(60, 30.0, &[4000; 28]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClassifierUnavailable);
        assert!(err.to_string().contains("model directory missing"));
    }

    #[tokio::test]
    async fn test_malformed_probability() {
        let orch = orchestrator(FixedClassifier::new(1.7));
        let err = orch.calculate_risk(60, 30.0, &[4000; 28]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClassifierUnavailable);
    }

    #[test]
    fn test_health_metrics() {
        let orch = orchestrator(FixedClassifier::new(0.5));
        let metrics = orch.health_metrics(45, &[7000; 28]).unwrap();
        assert_eq!(metrics.baseline_risk, 4.9);
        assert_eq!(metrics.baseline.age_group, "45-54");
        assert_eq!(metrics.step_analysis.valid_days, 28);
    }
}
