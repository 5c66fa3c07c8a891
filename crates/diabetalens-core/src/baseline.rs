//! Baseline Risk Estimator
//!
//! Maps age to a lifetime diabetes prevalence percentage by piecewise-linear
//! interpolation over age-bucketed population data (Australian Bureau of
//! Statistics, 2022; male/female average per bucket, placed at the bucket
//! midpoint).
//!
//! Below the first control point the curve is flat. Above the last one it
//! continues with the slope of the final segment, capped at the value it
//! reaches at age 120.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{round_to, validate_age, MAX_AGE};

/// A single (age, prevalence) control point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub age: f64,
    pub prevalence: f64,
}

/// Prevalence for one source bucket, by sex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketPrevalence {
    pub male: f64,
    pub female: f64,
    pub average: f64,
}

/// Source buckets: label, lower age bound, prevalence
const AGE_BUCKETS: [(&str, u32, BucketPrevalence); 5] = [
    ("0-44", 0, BucketPrevalence { male: 1.2, female: 1.0, average: 1.1 }),
    ("45-54", 45, BucketPrevalence { male: 6.1, female: 5.2, average: 5.65 }),
    ("55-64", 55, BucketPrevalence { male: 11.8, female: 10.5, average: 11.15 }),
    ("65-74", 65, BucketPrevalence { male: 17.1, female: 10.5, average: 13.8 }),
    ("75+", 75, BucketPrevalence { male: 20.7, female: 17.2, average: 18.95 }),
];

/// Bucket midpoints; the open-ended buckets use 22 and 80
const CONTROL_POINTS: [ControlPoint; 5] = [
    ControlPoint { age: 22.0, prevalence: 1.1 },
    ControlPoint { age: 49.5, prevalence: 5.65 },
    ControlPoint { age: 59.5, prevalence: 11.15 },
    ControlPoint { age: 69.5, prevalence: 13.8 },
    ControlPoint { age: 80.0, prevalence: 18.95 },
];

/// Coarse reading of a baseline percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaselineCategory {
    Low,
    Moderate,
    High,
}

impl BaselineCategory {
    /// Below 3 % low, below 10 % moderate, otherwise high
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 3.0 {
            BaselineCategory::Low
        } else if percentage < 10.0 {
            BaselineCategory::Moderate
        } else {
            BaselineCategory::High
        }
    }
}

/// Baseline risk plus the source bucket an age falls into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupInfo {
    pub age: u32,
    pub risk_percentage: f64,
    pub risk_category: BaselineCategory,
    pub age_group: String,
    pub age_group_data: BucketPrevalence,
}

/// Interpolating estimator over ordered control points
#[derive(Debug, Clone)]
pub struct BaselineRiskEstimator {
    points: Vec<ControlPoint>,
}

impl Default for BaselineRiskEstimator {
    fn default() -> Self {
        Self {
            points: CONTROL_POINTS.to_vec(),
        }
    }
}

impl BaselineRiskEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Age of the first control point; the curve is flat below it
    pub fn plateau_age(&self) -> f64 {
        self.points[0].age
    }

    /// Baseline risk percentage for `age`, rounded to one decimal
    pub fn estimate(&self, age: u32) -> Result<f64> {
        validate_age(age)?;
        Ok(round_to(self.raw_estimate(f64::from(age)), 1))
    }

    /// Upper bound of the curve: the extrapolated value at age 120
    pub fn ceiling(&self) -> f64 {
        self.extrapolate(f64::from(MAX_AGE))
    }

    fn raw_estimate(&self, age: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        let risk = if age < first.age {
            first.prevalence
        } else if age <= last.age {
            self.interpolate(age)
        } else {
            self.extrapolate(age)
        };

        risk.min(self.ceiling())
    }

    fn interpolate(&self, age: f64) -> f64 {
        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if age <= hi.age {
                let t = (age - lo.age) / (hi.age - lo.age);
                return lo.prevalence + t * (hi.prevalence - lo.prevalence);
            }
        }
        self.points[self.points.len() - 1].prevalence
    }

    fn extrapolate(&self, age: f64) -> f64 {
        let n = self.points.len();
        let (prev, last) = (self.points[n - 2], self.points[n - 1]);
        let slope = (last.prevalence - prev.prevalence) / (last.age - prev.age);
        last.prevalence + slope * (age - last.age)
    }

    /// Baseline plus bucket details for `age`
    pub fn age_group_info(&self, age: u32) -> Result<AgeGroupInfo> {
        let risk = self.estimate(age)?;
        let (label, _, prevalence) = AGE_BUCKETS
            .iter()
            .rev()
            .find(|(_, lower, _)| age >= *lower)
            .copied()
            .unwrap_or(AGE_BUCKETS[0]);

        Ok(AgeGroupInfo {
            age,
            risk_percentage: risk,
            risk_category: BaselineCategory::from_percentage(risk),
            age_group: label.to_string(),
            age_group_data: prevalence,
        })
    }
}

/// Baseline risk percentage for `age` using the default population table
pub fn estimate_baseline(age: u32) -> Result<f64> {
    BaselineRiskEstimator::default().estimate(age)
}
