use serde::{Deserialize, Serialize};

use crate::enrollment::Enrollment;
use crate::ids::UnitId;
use crate::progress::WatchSample;

/// One buffered sample in an offline-sync flush
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub unit_id: UnitId,
    pub sample: WatchSample,
}

/// Per-item outcome; a failed item never aborts the rest of the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub unit_id: UnitId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn success(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            ok: true,
            error: None,
        }
    }

    pub fn failure(unit_id: UnitId, error: impl Into<String>) -> Self {
        Self {
            unit_id,
            ok: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// Enrollment state after the single post-batch recompute, if it ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<Enrollment>,
}

impl BatchOutcome {
    pub fn from_results(results: Vec<BatchItemResult>) -> Self {
        let succeeded = results.iter().filter(|result| result.ok).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
            enrollment: None,
        }
    }
}
