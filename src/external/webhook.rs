//! The observability webhook. The executor fires it once per created
//! alert; failures are logged but never fail the invocation — the alert is
//! already durably persisted by the time this runs.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub alert_id: Uuid,
    pub test_suite_id: Uuid,
    pub execution_id: Uuid,
    pub organization_id: Uuid,
    pub message: String,
}

#[async_trait]
pub trait AlertWebhook: Send + Sync {
    async fn notify(&self, alert: &AlertPayload) -> AppResult<()>;
}

pub struct HttpAlertWebhook {
    url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpAlertWebhook {
    pub fn new(url: String, http: reqwest::Client, timeout: Duration) -> Self {
        Self { url, http, timeout }
    }
}

/// Used when no webhook base URL is configured — alerts are still
/// persisted by `Storage::insert_alert`, this just skips the broadcast.
pub struct NoopAlertWebhook;

#[async_trait]
impl AlertWebhook for NoopAlertWebhook {
    async fn notify(&self, _alert: &AlertPayload) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AlertWebhook for HttpAlertWebhook {
    async fn notify(&self, alert: &AlertPayload) -> AppResult<()> {
        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(alert)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "alert webhook returned non-success status");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "alert webhook delivery failed");
                Ok(())
            }
        }
    }
}
