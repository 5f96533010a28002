//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::batch::BatchItem;
use crate::ids::{CourseId, UnitId};
use crate::progress::WatchSample;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
        }
    }
}

/// Body of `POST /api/v1/progress/record`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordProgressRequest {
    pub course_id: CourseId,
    pub unit_id: UnitId,
    pub sample: WatchSample,
}

/// Body of `POST /api/v1/progress/batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProgressRequest {
    pub course_id: CourseId,
    #[serde(default)]
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveResponse {
    pub archived: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let value = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(value, serde_json::json!({"status": "success", "data": 3}));
    }

    #[test]
    fn batch_request_defaults_to_no_items() {
        let request: BatchProgressRequest =
            serde_json::from_value(serde_json::json!({"course_id": "c1"})).unwrap();
        assert!(request.items.is_empty());
    }
}
