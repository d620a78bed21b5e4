// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push-notification channel (OneSignal-style REST API).

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::json;

/// One push notification as the dispatcher assembles it.
#[derive(Debug, Clone, PartialEq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub subtitle: Option<String>,
    pub url: String,
    pub audience_segment: String,
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn send(&self, notification: &PushNotification) -> Result<(), AppError>;
}

/// Push provider client.
#[derive(Clone)]
pub struct PushClient {
    http: reqwest::Client,
    api_url: String,
    app_id: String,
    api_key: String,
}

impl PushClient {
    pub fn new(app_id: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: "https://onesignal.com/api/v1/notifications".to_string(),
            app_id,
            api_key,
        }
    }
}

#[async_trait]
impl PushChannel for PushClient {
    async fn send(&self, notification: &PushNotification) -> Result<(), AppError> {
        let mut payload = json!({
            "app_id": self.app_id,
            "headings": { "en": notification.title },
            "contents": { "en": notification.body },
            "url": notification.url,
            "included_segments": [notification.audience_segment],
        });
        if let Some(subtitle) = &notification.subtitle {
            payload["subtitle"] = json!({ "en": subtitle });
        }

        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("Basic {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Channel(format!("Push send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Channel(format!("Push HTTP {}: {}", status, body)));
        }

        tracing::info!(audience = %notification.audience_segment, "Push notification sent");
        Ok(())
    }
}
