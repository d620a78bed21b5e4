// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Operator attention side channel (dashboard/mobile webhook).

use async_trait::async_trait;
use serde::Serialize;

/// Fire-and-forget operator notifications. Failures are logged and
/// swallowed; an alert outage must never abort a pipeline pass.
#[async_trait]
pub trait OperatorNotifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str);
}

#[derive(Serialize)]
struct AlertPayload<'a> {
    title: &'a str,
    message: &'a str,
}

/// Webhook-backed operator alerts.
#[derive(Clone)]
pub struct OperatorAlerts {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl OperatorAlerts {
    /// With no webhook configured, alerts only land in the logs.
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl OperatorNotifier for OperatorAlerts {
    async fn notify(&self, title: &str, message: &str) {
        tracing::info!(title, message, "Operator alert");

        let Some(url) = &self.webhook_url else {
            return;
        };

        let result = self
            .http
            .post(url)
            .json(&AlertPayload { title, message })
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    status = %response.status(),
                    title,
                    "Operator alert webhook rejected"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, title, "Operator alert webhook failed");
            }
            Ok(_) => {}
        }
    }
}
