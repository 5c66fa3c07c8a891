//! Decision-ensemble classifier
//!
//! Evaluates a random-forest style model exported as JSON: standard-scaled
//! age and BMI, one-hot activity, and a list of binary trees whose leaves
//! hold class-1 probabilities. The ensemble probability is the mean leaf
//! value across trees.
//!
//! Models are validated once on load and are immutable afterwards, so a
//! single instance can serve every request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use super::{RiskClassifier, RiskFeatures};
use crate::error::{DiabetaError, Result};
use crate::types::ActivityCategory;

const REFERENCE_MODEL_JSON: &str = include_str!("../../models/reference_forest.json");

static REFERENCE_MODEL: OnceLock<std::result::Result<Arc<ForestClassifier>, String>> =
    OnceLock::new();

/// Standard-scaler parameters for one numerical feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: f64,
    pub scale: f64,
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `features[feature] <= threshold`, else to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Children must point forward, which rules out cycles
    fn validate(&self, tree_index: usize, feature_count: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree_index));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() || !(0.0..=1.0).contains(value) {
                        return Err(format!(
                            "tree {} node {}: leaf value {} outside [0, 1]",
                            tree_index, i, value
                        ));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return Err(format!(
                            "tree {} node {}: feature index {} out of range",
                            tree_index, i, feature
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {} node {}: non-finite threshold", tree_index, i));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!(
                                "tree {} node {}: child index {} must be in ({}, {})",
                                tree_index,
                                i,
                                child,
                                i,
                                self.nodes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Serialized ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub name: String,
    pub version: String,
    /// Column order of the feature vector
    pub features: Vec<String>,
    /// Scaling for numerical columns, keyed by feature name
    #[serde(default)]
    pub scaler: BTreeMap<String, ScalerParams>,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    const KNOWN_FEATURES: [&'static str; 5] = [
        "age",
        "bmi",
        "activity_high",
        "activity_low",
        "activity_moderate",
    ];

    pub fn validate(&self) -> Result<()> {
        self.check().map_err(|reason| {
            DiabetaError::classifier(format!("model '{}' rejected: {}", self.name, reason))
        })
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for name in &self.features {
            if !Self::KNOWN_FEATURES.contains(&name.as_str()) {
                return Err(format!("unknown feature '{}'", name));
            }
        }
        for (name, params) in &self.scaler {
            if !self.features.contains(name) {
                return Err(format!("scaler for absent feature '{}'", name));
            }
            if !params.mean.is_finite() || !params.scale.is_finite() || params.scale == 0.0 {
                return Err(format!("invalid scaler for '{}'", name));
            }
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.features.len())?;
        }
        Ok(())
    }

    /// Encode features in model column order
    fn encode(&self, input: &RiskFeatures) -> Vec<f64> {
        self.features
            .iter()
            .map(|name| {
                let raw = match name.as_str() {
                    "age" => f64::from(input.age),
                    "bmi" => input.bmi,
                    "activity_high" => one_hot(input.activity == ActivityCategory::High),
                    "activity_low" => one_hot(input.activity == ActivityCategory::Low),
                    "activity_moderate" => one_hot(input.activity == ActivityCategory::Moderate),
                    _ => 0.0,
                };
                match self.scaler.get(name) {
                    Some(params) => (raw - params.mean) / params.scale,
                    None => raw,
                }
            })
            .collect()
    }

    pub fn predict(&self, input: &RiskFeatures) -> f64 {
        let encoded = self.encode(input);
        let total: f64 = self.trees.iter().map(|tree| tree.evaluate(&encoded)).sum();
        total / self.trees.len() as f64
    }
}

fn one_hot(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// [`RiskClassifier`] backed by a validated [`ForestModel`]
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    label: String,
    model: ForestModel,
}

impl ForestClassifier {
    pub fn new(model: ForestModel) -> Result<Self> {
        model.validate()?;
        Ok(Self {
            label: format!("{}@{}", model.name, model.version),
            model,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: ForestModel = serde_json::from_str(json)
            .map_err(|e| DiabetaError::classifier(format!("unreadable model document: {}", e)))?;
        Self::new(model)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiabetaError::classifier(format!("cannot read model {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Built-in reference ensemble, parsed at most once per process
    pub fn reference() -> Result<Arc<Self>> {
        REFERENCE_MODEL
            .get_or_init(|| {
                Self::from_json(REFERENCE_MODEL_JSON)
                    .map(Arc::new)
                    .map_err(|e| e.to_string())
            })
            .clone()
            .map_err(DiabetaError::ClassifierUnavailable)
    }

    pub fn model(&self) -> &ForestModel {
        &self.model
    }
}

#[async_trait]
impl RiskClassifier for ForestClassifier {
    fn name(&self) -> &str {
        &self.label
    }

    async fn predict_probability(&self, features: &RiskFeatures) -> Result<f64> {
        Ok(self.model.predict(features))
    }
}
