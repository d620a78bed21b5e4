// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Full drops refresh pass.
//!
//! Handles the core workflow:
//! 1. Fetch the upstream campaign feed
//! 2. Normalize campaigns into drop records
//! 3. Reconcile against the persisted store (two-phase write)
//! 4. Alert the operator on new/updated and newly-active drops
//! 5. Dispatch due notifications, then persist mutated delivery flags

use crate::db::DropStore;
use crate::error::Result;
use crate::services::alerts::OperatorNotifier;
use crate::services::discord::ChatChannel;
use crate::services::feed::{normalize_campaign, DropsFeed};
use crate::services::notify::{DispatchSummary, NotificationDispatcher};
use crate::services::push::PushChannel;
use crate::services::reconcile::reconcile;
use crate::services::twitter::ThreadChannel;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Result of one full refresh pass.
#[derive(Debug)]
pub struct RefreshSummary {
    pub campaigns_fetched: usize,
    pub new_drops: usize,
    pub updated_drops: usize,
    pub dispatch: DispatchSummary,
}

/// Orchestrates one scheduled refresh pass end to end.
///
/// Every collaborator comes in through the constructor (store handle,
/// channel clients) and the clock comes in through `refresh_all`, so a
/// pass is fully deterministic under test fakes.
pub struct DropsRefreshService {
    feed: Arc<dyn DropsFeed>,
    store: Arc<dyn DropStore>,
    twitter: Arc<dyn ThreadChannel>,
    chat: Arc<dyn ChatChannel>,
    push: Arc<dyn PushChannel>,
    alerts: Arc<dyn OperatorNotifier>,
    drops_link: String,
    push_audience: String,
}

impl DropsRefreshService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: Arc<dyn DropsFeed>,
        store: Arc<dyn DropStore>,
        twitter: Arc<dyn ThreadChannel>,
        chat: Arc<dyn ChatChannel>,
        push: Arc<dyn PushChannel>,
        alerts: Arc<dyn OperatorNotifier>,
        drops_link: String,
        push_audience: String,
    ) -> Self {
        Self {
            feed,
            store,
            twitter,
            chat,
            push,
            alerts,
            drops_link,
            push_audience,
        }
    }

    /// Run one refresh pass at the given instant.
    ///
    /// Only a feed failure is fatal (the scheduler retries the run);
    /// everything downstream degrades per-drop and self-heals next pass.
    pub async fn refresh_all(&self, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let campaigns = self.feed.fetch_campaigns().await?;
        tracing::info!(count = campaigns.len(), "Fetched drop campaigns");

        let normalized = campaigns
            .iter()
            .map(|c| normalize_campaign(c, now))
            .collect();

        let outcome = reconcile(self.store.as_ref(), self.alerts.as_ref(), normalized, now).await?;

        if outcome.any_changed {
            self.alerts
                .notify(
                    "Twitch drops changed",
                    &format!(
                        "{} new, {} updated drop(s) this pass. Records are flagged for review.",
                        outcome.new_count, outcome.updated_count
                    ),
                )
                .await;
        }
        if outcome.any_went_active {
            self.alerts
                .notify("Twitch drop now active", "A drop campaign went live this pass.")
                .await;
        }

        let mut records = outcome.records;

        let dispatcher = NotificationDispatcher {
            twitter: self.twitter.as_ref(),
            chat: self.chat.as_ref(),
            push: self.push.as_ref(),
            link: &self.drops_link,
            push_audience: &self.push_audience,
        };
        let dispatch = dispatcher.dispatch_all(&mut records, now).await;

        // Second bulk pass: persist every flag mutated during dispatch,
        // including for drops that came after a failed one. Losing a flag
        // for a delivered send would break at-most-once on the next run.
        if let Err(e) = self.store.update_sent_flags(&records).await {
            tracing::error!(error = %e, "Failed to persist notification flags");
        }

        tracing::info!(
            fetched = campaigns.len(),
            new = outcome.new_count,
            updated = outcome.updated_count,
            tweets = dispatch.tweets_posted,
            chat = dispatch.chat_messages,
            push = dispatch.push_messages,
            failed = dispatch.failed_drops,
            "Drops refresh pass complete"
        );

        Ok(RefreshSummary {
            campaigns_fetched: campaigns.len(),
            new_drops: outcome.new_count,
            updated_drops: outcome.updated_count,
            dispatch,
        })
    }
}
