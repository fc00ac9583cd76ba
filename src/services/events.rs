// src/services/events.rs
use async_trait::async_trait;

use crate::errors::{DispatchError as AppError, DispatchResult};
use crate::models::events::DispatchEvent;

/// Outbound channel towards connected customer/driver sessions. The concrete
/// transport (websocket hub, push gateway) lives outside this crate; the core
/// only writes logical events into the sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &DispatchEvent) -> DispatchResult<()>;
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
}

/// Posts every event as JSON to a configured endpoint, typically the realtime
/// gateway that fans out to driver apps.
pub struct WebhookEventSink {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookEventSink {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EventSink for WebhookEventSink {
    async fn deliver(&self, event: &DispatchEvent) -> DispatchResult<()> {
        tracing::debug!("Delivering {} event to {}", event.kind(), self.config.url);

        let body = serde_json::json!({
            "channel": event.kind(),
            "payload": event,
        });

        let response = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::NetworkConnection(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Event webhook request failed: {}", error_text);
            return Err(AppError::EventDeliveryFailed(error_text));
        }

        tracing::debug!("Event delivered successfully");
        Ok(())
    }
}

// No-op sink for development and testing
#[derive(Debug, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn deliver(&self, event: &DispatchEvent) -> DispatchResult<()> {
        tracing::info!("[NOOP] Would deliver {} event", event.kind());
        Ok(())
    }
}
