//! Activity Level Classifier
//!
//! Reduces a daily step history to one [`ActivityCategory`]. Days outside the
//! plausible range (device not worn, sensor glitches) are dropped first, then
//! the category is read from the median of what remains. The mean is kept for
//! comparison only; a single 90 000-step day moves it, the median not at all.

use serde::{Deserialize, Serialize};

use crate::error::{DiabetaError, Result};
use crate::types::{round_to, ActivityCategory};

/// Outlier bounds and category limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityThresholds {
    /// Smallest plausible daily value (inclusive)
    pub outlier_min: u32,
    /// Largest plausible daily value (inclusive)
    pub outlier_max: u32,
    /// Median at or below this is `low`
    pub low_max: f64,
    /// Median at or below this (and above `low_max`) is `moderate`
    pub moderate_max: f64,
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            outlier_min: 100,
            outlier_max: 50_000,
            low_max: ActivityCategory::DEFAULT_LOW_MAX,
            moderate_max: ActivityCategory::DEFAULT_MODERATE_MAX,
        }
    }
}

impl ActivityThresholds {
    pub fn is_plausible(&self, steps: u32) -> bool {
        (self.outlier_min..=self.outlier_max).contains(&steps)
    }
}

/// Summary of a step history after outlier filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAssessment {
    pub category: ActivityCategory,
    pub median_steps: f64,
    /// Mean of the valid days, one decimal
    pub mean_steps: f64,
    pub total_days: usize,
    pub valid_days: usize,
    pub outliers_removed: usize,
    pub min_steps: u32,
    pub max_steps: u32,
}

/// Median-based classifier
#[derive(Debug, Clone, Default)]
pub struct ActivityClassifier {
    thresholds: ActivityThresholds,
}

impl ActivityClassifier {
    pub fn new(thresholds: ActivityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ActivityThresholds {
        &self.thresholds
    }

    /// Classify a step history of any non-zero length
    pub fn classify(&self, steps: &[u32]) -> Result<ActivityAssessment> {
        if steps.is_empty() {
            return Err(DiabetaError::invalid("step history cannot be empty"));
        }

        let mut valid: Vec<u32> = steps
            .iter()
            .copied()
            .filter(|&s| self.thresholds.is_plausible(s))
            .collect();

        if valid.is_empty() {
            return Err(DiabetaError::InsufficientData(format!(
                "all {} days fall outside [{}, {}] steps",
                steps.len(),
                self.thresholds.outlier_min,
                self.thresholds.outlier_max
            )));
        }

        valid.sort_unstable();
        let median_steps = median_of_sorted(&valid);
        let mean_steps = valid.iter().map(|&s| f64::from(s)).sum::<f64>() / valid.len() as f64;

        Ok(ActivityAssessment {
            category: ActivityCategory::with_thresholds(
                median_steps,
                self.thresholds.low_max,
                self.thresholds.moderate_max,
            ),
            median_steps,
            mean_steps: round_to(mean_steps, 1),
            total_days: steps.len(),
            valid_days: valid.len(),
            outliers_removed: steps.len() - valid.len(),
            min_steps: valid[0],
            max_steps: valid[valid.len() - 1],
        })
    }
}

/// Classify with the default thresholds
pub fn classify_activity(steps: &[u32]) -> Result<ActivityAssessment> {
    ActivityClassifier::default().classify(steps)
}

/// Middle element, or the mean of the two middle elements; `sorted` must be non-empty
pub(crate) fn median_of_sorted(sorted: &[u32]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (f64::from(sorted[n / 2 - 1]) + f64::from(sorted[n / 2])) / 2.0
    } else {
        f64::from(sorted[n / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn active_with_extras(extra: &[u32]) -> Vec<u32> {
        let mut steps: Vec<u32> = [8000, 8500, 7500, 9000, 8200].repeat(5);
        steps.extend_from_slice(extra);
        steps
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median_of_sorted(&[1, 2, 3]), 2.0);
        assert_eq!(median_of_sorted(&[1, 2, 3, 4]), 2.5);
        assert_eq!(median_of_sorted(&[7000]), 7000.0);
    }

    #[test]
    fn test_uniform_history() {
        let result = classify_activity(&[8000; 28]).unwrap();
        assert_eq!(result.category, ActivityCategory::Moderate);
        assert_eq!(result.median_steps, 8000.0);
        assert_eq!(result.mean_steps, 8000.0);
        assert_eq!(result.valid_days, 28);
        assert_eq!(result.outliers_removed, 0);
        assert_eq!((result.min_steps, result.max_steps), (8000, 8000));
    }

    #[test]
    fn test_sick_days_do_not_drag_category() {
        let result = classify_activity(&active_with_extras(&[800, 1200, 900])).unwrap();
        assert_eq!(result.category, ActivityCategory::Moderate);
        assert_eq!(result.outliers_removed, 0);
        assert!(result.mean_steps < result.median_steps);
    }

    #[test]
    fn test_device_errors_are_filtered() {
        let result = classify_activity(&active_with_extras(&[0, 75000, 50])).unwrap();
        assert_eq!(result.category, ActivityCategory::Moderate);
        assert_eq!(result.total_days, 28);
        assert_eq!(result.valid_days, 25);
        assert_eq!(result.outliers_removed, 3);
        assert_eq!(result.max_steps, 9000);
    }

    #[test]
    fn test_outlier_bounds_are_inclusive() {
        let result = classify_activity(&[100, 50000, 99, 50001]).unwrap();
        assert_eq!(result.valid_days, 2);
        assert_eq!(result.min_steps, 100);
        assert_eq!(result.max_steps, 50000);
    }

    #[test]
    fn test_category_extremes() {
        let low = classify_activity(&[3000, 4000, 5000, 4500, 3500].repeat(5)).unwrap();
        assert_eq!(low.category, ActivityCategory::Low);

        let high = classify_activity(&[12000, 11000, 13000, 10500, 11500].repeat(5)).unwrap();
        assert_eq!(high.category, ActivityCategory::High);
    }

    #[test]
    fn test_all_outliers_is_insufficient_data() {
        let err = classify_activity(&[50; 28]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_empty_history_is_invalid() {
        let err = classify_activity(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = ActivityClassifier::new(ActivityThresholds {
            low_max: 8500.0,
            ..ActivityThresholds::default()
        });
        let result = classifier.classify(&[8000; 28]).unwrap();
        assert_eq!(result.category, ActivityCategory::Low);
    }
}
