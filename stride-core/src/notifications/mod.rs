//! Course-completion notifications for the certificate service.
//!
//! Delivery is best effort: callers log failures and carry on.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stride_model::{CourseId, LearnerId};
use tracing::info;

use crate::error::{ProgressError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    async fn on_course_completed(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        completion_date: DateTime<Utc>,
    ) -> Result<()>;
}

/// Logs completions only; used when no webhook is configured
#[derive(Debug, Clone, Default)]
pub struct LoggingCertificateIssuer;

#[async_trait]
impl CertificateIssuer for LoggingCertificateIssuer {
    async fn on_course_completed(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        completion_date: DateTime<Utc>,
    ) -> Result<()> {
        info!(
            learner_id = %learner_id,
            course_id = %course_id,
            completion_date = %completion_date,
            "course completed; no certificate webhook configured"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CourseCompletedPayload<'a> {
    event: &'static str,
    learner_id: &'a LearnerId,
    course_id: &'a CourseId,
    completion_date: DateTime<Utc>,
}

/// POSTs a JSON completion event to the certificate service
#[derive(Debug, Clone)]
pub struct WebhookCertificateIssuer {
    http_client: reqwest::Client,
    endpoint: String,
}

impl WebhookCertificateIssuer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProgressError::Notification(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CertificateIssuer for WebhookCertificateIssuer {
    async fn on_course_completed(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        completion_date: DateTime<Utc>,
    ) -> Result<()> {
        let payload = CourseCompletedPayload {
            event: "course.completed",
            learner_id,
            course_id,
            completion_date,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProgressError::Notification(format!("webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProgressError::Notification(format!(
                "webhook responded with {status}"
            )));
        }

        info!(
            learner_id = %learner_id,
            course_id = %course_id,
            "certificate issuance requested"
        );
        Ok(())
    }
}
