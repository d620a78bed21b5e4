// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Discord webhook channel.

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

/// Webhook-backed chat channel, addressed by a logical channel key.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send(&self, channel_key: &str, text: &str, mention_role: bool) -> Result<(), AppError>;
}

/// Discord webhook client.
///
/// Webhook URLs are keyed by logical channel name so the dispatcher never
/// sees raw URLs.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    webhooks: HashMap<String, String>,
    mention_role: Option<String>,
}

impl DiscordClient {
    pub fn new(webhooks: HashMap<String, String>, mention_role: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhooks,
            mention_role,
        }
    }
}

#[async_trait]
impl ChatChannel for DiscordClient {
    async fn send(&self, channel_key: &str, text: &str, mention_role: bool) -> Result<(), AppError> {
        let url = self
            .webhooks
            .get(channel_key)
            .ok_or_else(|| AppError::Channel(format!("Unknown Discord channel key: {}", channel_key)))?;

        let content = match (&self.mention_role, mention_role) {
            (Some(role), true) => format!("<@&{}> {}", role, text),
            _ => text.to_string(),
        };

        let payload = json!({
            "content": content,
            "allowed_mentions": { "parse": ["roles"] },
        });

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Channel(format!("Discord send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Channel(format!(
                "Discord HTTP {}: {}",
                status, body
            )));
        }

        tracing::info!(channel = channel_key, "Discord message sent");
        Ok(())
    }
}
