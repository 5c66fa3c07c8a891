//! Future Activity Projector
//!
//! Forecasts daily steps by tiling the raw 28-day history cyclically: day `i`
//! of any horizon repeats day `i mod 28` of the past. No trend, smoothing or
//! randomness is applied, so a forecast is fully reproducible from its input.
//! The history is used unfiltered; outlier handling belongs to the activity
//! classifier.

use serde::{Deserialize, Serialize};

use crate::activity::median_of_sorted;
use crate::error::Result;
use crate::types::{round_to, validate_step_history, Horizon, STEP_HISTORY_DAYS};

/// Default sedentary cut-off: a day below this many steps counts as sedentary
pub const DEFAULT_SEDENTARY_THRESHOLD: u32 = 5000;

const VERY_ACTIVE_THRESHOLD: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Days strictly below this count as sedentary
    pub sedentary_threshold: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            sedentary_threshold: DEFAULT_SEDENTARY_THRESHOLD,
        }
    }
}

/// Projected steps for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureStepsProjection {
    pub horizon: Horizon,
    pub horizon_days: usize,
    pub projected_steps: Vec<u32>,
    pub sedentary_day_count: usize,
}

/// All three horizon projections for one history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityForecast {
    /// Mean of the raw 28-day history, two decimals
    pub avg_daily_steps: f64,
    pub projections: Vec<FutureStepsProjection>,
}

impl ActivityForecast {
    pub fn projection(&self, horizon: Horizon) -> Option<&FutureStepsProjection> {
        self.projections.iter().find(|p| p.horizon == horizon)
    }

    pub fn sedentary_days(&self, horizon: Horizon) -> usize {
        self.projection(horizon)
            .map(|p| p.sedentary_day_count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FutureActivityProjector {
    settings: ForecastSettings,
}

impl FutureActivityProjector {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    pub fn sedentary_threshold(&self) -> u32 {
        self.settings.sedentary_threshold
    }

    /// Tile `steps` over `horizon`; `steps` must hold exactly 28 values
    pub fn project(&self, steps: &[u32], horizon: Horizon) -> Result<FutureStepsProjection> {
        validate_step_history(steps)?;

        let projected_steps: Vec<u32> = steps.iter().copied().cycle().take(horizon.days()).collect();
        let sedentary_day_count = projected_steps
            .iter()
            .filter(|&&s| s < self.settings.sedentary_threshold)
            .count();

        Ok(FutureStepsProjection {
            horizon,
            horizon_days: horizon.days(),
            projected_steps,
            sedentary_day_count,
        })
    }

    /// Project every horizon
    pub fn forecast(&self, steps: &[u32]) -> Result<ActivityForecast> {
        let projections = Horizon::ALL
            .iter()
            .map(|&h| self.project(steps, h))
            .collect::<Result<Vec<_>>>()?;

        Ok(ActivityForecast {
            avg_daily_steps: round_to(mean(steps), 2),
            projections,
        })
    }
}

/// Project with the default sedentary threshold
pub fn project_future(steps: &[u32], horizon: Horizon) -> Result<FutureStepsProjection> {
    FutureActivityProjector::default().project(steps, horizon)
}

/// Descriptive statistics of a raw 28-day history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub mean_steps: f64,
    pub median_steps: f64,
    pub min_steps: u32,
    pub max_steps: u32,
    /// Population standard deviation
    pub std_steps: f64,
    pub days_below_5000: usize,
    pub days_above_10000: usize,
    pub total_steps_28_days: u64,
}

impl StepSummary {
    pub fn from_steps(steps: &[u32]) -> Result<Self> {
        validate_step_history(steps)?;

        let mut sorted = steps.to_vec();
        sorted.sort_unstable();

        let mean = mean(steps);
        let variance = steps
            .iter()
            .map(|&s| (f64::from(s) - mean).powi(2))
            .sum::<f64>()
            / STEP_HISTORY_DAYS as f64;

        Ok(Self {
            mean_steps: round_to(mean, 2),
            median_steps: round_to(median_of_sorted(&sorted), 2),
            min_steps: sorted[0],
            max_steps: sorted[sorted.len() - 1],
            std_steps: round_to(variance.sqrt(), 2),
            days_below_5000: steps.iter().filter(|&&s| s < DEFAULT_SEDENTARY_THRESHOLD).count(),
            days_above_10000: steps.iter().filter(|&&s| s >= VERY_ACTIVE_THRESHOLD).count(),
            total_steps_28_days: steps.iter().map(|&s| u64::from(s)).sum(),
        })
    }
}

fn mean(steps: &[u32]) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    steps.iter().map(|&s| f64::from(s)).sum::<f64>() / steps.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample_history() -> Vec<u32> {
        vec![
            8500, 7200, 9100, 6800, 7500, 8900, 10200, //
            7800, 6500, 8200, 7900, 8600, 9300, 11000, //
            7100, 6900, 8800, 7600, 8100, 9500, 10800, //
            8300, 7000, 8900, 7400, 7700, 8700, 9600,
        ]
    }

    #[test]
    fn test_projection_lengths() {
        let steps = sample_history();
        for horizon in Horizon::ALL {
            let projection = project_future(&steps, horizon).unwrap();
            assert_eq!(projection.projected_steps.len(), horizon.days());
            assert_eq!(projection.horizon_days, horizon.days());
        }
    }

    #[test]
    fn test_cyclic_tiling_by_index() {
        let steps: Vec<u32> = (1..=28).map(|d| d * 1000).collect();
        let projection = project_future(&steps, Horizon::ThreeMonths).unwrap();

        assert_eq!(&projection.projected_steps[0..28], steps.as_slice());
        assert_eq!(&projection.projected_steps[28..56], steps.as_slice());
        assert_eq!(&projection.projected_steps[56..84], steps.as_slice());
        assert_eq!(&projection.projected_steps[84..90], &steps[0..6]);
    }

    #[test]
    fn test_sedentary_count_is_strict() {
        let mut steps = vec![8000; 28];
        steps[0] = 4999;
        steps[1] = 5000;
        // 30 = 28 + 2, so day 0 (4999) appears twice and day 1 (5000) never counts
        let projection = project_future(&steps, Horizon::OneMonth).unwrap();
        assert_eq!(projection.sedentary_day_count, 2);
    }

    #[test]
    fn test_all_sedentary_history() {
        let forecast = FutureActivityProjector::default().forecast(&[3500; 28]).unwrap();
        assert_eq!(forecast.sedentary_days(Horizon::OneMonth), 30);
        assert_eq!(forecast.sedentary_days(Horizon::ThreeMonths), 90);
        assert_eq!(forecast.sedentary_days(Horizon::SixMonths), 180);
        assert_eq!(forecast.avg_daily_steps, 3500.0);
    }

    #[test]
    fn test_custom_threshold() {
        let projector = FutureActivityProjector::new(ForecastSettings {
            sedentary_threshold: 8000,
        });
        let projection = projector.project(&sample_history(), Horizon::OneMonth).unwrap();
        let expected = sample_history()
            .iter()
            .cycle()
            .take(30)
            .filter(|&&s| s < 8000)
            .count();
        assert_eq!(projection.sedentary_day_count, expected);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = project_future(&[8000; 27], Horizon::OneMonth).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_raw_series_is_not_filtered() {
        let mut steps = vec![8000; 28];
        steps[5] = 0;
        let projection = project_future(&steps, Horizon::OneMonth).unwrap();
        assert_eq!(projection.projected_steps[5], 0);
        assert_eq!(projection.sedentary_day_count, 1);
    }

    #[test]
    fn test_step_summary() {
        let mut steps = vec![4000; 14];
        steps.extend(vec![12000; 14]);
        let summary = StepSummary::from_steps(&steps).unwrap();

        assert_eq!(summary.mean_steps, 8000.0);
        assert_eq!(summary.median_steps, 8000.0);
        assert_eq!(summary.std_steps, 4000.0);
        assert_eq!(summary.days_below_5000, 14);
        assert_eq!(summary.days_above_10000, 14);
        assert_eq!(summary.total_steps_28_days, 224_000);
        assert_eq!((summary.min_steps, summary.max_steps), (4000, 12000));
    }
}
