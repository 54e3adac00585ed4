use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::core::config::NotifierConfig;
use crate::core::error::{AppError, Result};

/// Delivery channels fanned out by the gateway for one dispatch notice
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Push,
    InApp,
    Email,
}

/// Payload delivered to a matched provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchNotice {
    pub request_id: Uuid,
    pub service_id: String,
    pub requester_latitude: f64,
    pub requester_longitude: f64,
    pub distance_km: f64,
    pub channels: Vec<NotificationChannel>,
}

impl DispatchNotice {
    /// Emergency notices go out on every channel the platform supports
    pub fn all_channels() -> Vec<NotificationChannel> {
        vec![
            NotificationChannel::Push,
            NotificationChannel::InApp,
            NotificationChannel::Email,
        ]
    }
}

/// Consumed contract of the external notification gateway.
///
/// The dispatch path only decides membership; delivery (device push,
/// in-app inbox, email) is owned by the gateway.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify_dispatch(&self, provider_id: &str, notice: &DispatchNotice) -> Result<()>;
}

/// HTTP client for the platform notification gateway
pub struct HttpNotificationGateway {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl HttpNotificationGateway {
    pub fn new(config: NotifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Internal(format!("Failed to build notification client: {}", e))
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl NotificationGateway for HttpNotificationGateway {
    async fn notify_dispatch(&self, provider_id: &str, notice: &DispatchNotice) -> Result<()> {
        let url = format!(
            "{}/v1/providers/{}/notifications",
            self.config.base_url, provider_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(notice)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Notification gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Notification gateway rejected dispatch notice: HTTP {}",
                response.status()
            )));
        }

        tracing::debug!(
            "Dispatch notice delivered to provider {} for request {}",
            provider_id,
            notice.request_id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_serializes_with_snake_case_channels() {
        let notice = DispatchNotice {
            request_id: Uuid::nil(),
            service_id: "plumbing".to_string(),
            requester_latitude: 38.8,
            requester_longitude: -9.1,
            distance_km: 8.9,
            channels: DispatchNotice::all_channels(),
        };

        let value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value["serviceId"], "plumbing");
        assert_eq!(value["channels"][0], "push");
        assert_eq!(value["channels"][1], "in_app");
        assert_eq!(value["channels"][2], "email");
    }
}
