//! Batch assessment
//!
//! Runs the pipeline for up to [`MAX_BATCH_SIZE`] patients concurrently.
//! A failing patient becomes a `failed` entry; it never aborts the batch.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DiabetaError, ErrorKind, Result};
use crate::orchestrator::{RiskOrchestrator, RiskResult};
use crate::types::PatientProfile;

/// Largest number of patients accepted in one batch
pub const MAX_BATCH_SIZE: usize = 10;

/// One patient of a batch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPatient {
    /// Caller-supplied identifier; `patient_<n>` (1-based) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(flatten)]
    pub profile: PatientProfile,
}

impl BatchPatient {
    pub fn new(profile: PatientProfile) -> Self {
        Self {
            patient_id: None,
            profile,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.patient_id = Some(id.into());
        self
    }
}

/// Per-patient outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    Assessed {
        patient_id: String,
        result: RiskResult,
    },
    Failed {
        patient_id: String,
        kind: ErrorKind,
        error: String,
    },
}

impl BatchEntry {
    pub fn patient_id(&self) -> &str {
        match self {
            BatchEntry::Assessed { patient_id, .. } | BatchEntry::Failed { patient_id, .. } => {
                patient_id
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchEntry::Assessed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub processed_at: DateTime<Utc>,
    /// Same order as the request
    pub entries: Vec<BatchEntry>,
    pub summary: BatchSummary,
}

impl RiskOrchestrator {
    /// Assess every patient concurrently
    pub async fn assess_batch(&self, patients: &[BatchPatient]) -> Result<BatchReport> {
        if patients.is_empty() {
            return Err(DiabetaError::invalid("batch must contain at least one patient"));
        }
        if patients.len() > MAX_BATCH_SIZE {
            return Err(DiabetaError::invalid(format!(
                "batch holds {} patients, the limit is {}",
                patients.len(),
                MAX_BATCH_SIZE
            )));
        }

        let batch_id = Uuid::new_v4();
        let runs = patients.iter().enumerate().map(|(i, patient)| async move {
            let patient_id = patient
                .patient_id
                .clone()
                .unwrap_or_else(|| format!("patient_{}", i + 1));
            match self.assess(&patient.profile).await {
                Ok(result) => BatchEntry::Assessed { patient_id, result },
                Err(e) => BatchEntry::Failed {
                    patient_id,
                    kind: e.kind(),
                    error: e.to_string(),
                },
            }
        });
        let entries = join_all(runs).await;

        let successful = entries.iter().filter(|e| e.is_success()).count();
        let summary = BatchSummary {
            total: entries.len(),
            successful,
            failed: entries.len() - successful,
        };
        tracing::debug!(
            batch_id = %batch_id,
            total = summary.total,
            failed = summary.failed,
            "batch assessed"
        );

        Ok(BatchReport {
            batch_id,
            processed_at: Utc::now(),
            entries,
            summary,
        })
    }
}
