// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification dispatcher.
//!
//! Walks reconciled drop records and decides, per drop, per reward group
//! and per channel, whether a notification is due. Delivery flags are the
//! sole gate: a flag set true means that (group, channel, phase) has been
//! announced and will never be re-sent, except through an explicit
//! correction. Flags are only flipped after a successful send, so a failed
//! run retries exactly the outstanding sends on the next pass.
//!
//! A channel failure aborts only the failing drop's phase; the batch
//! continues with the next drop. The caller persists mutated flags after
//! the batch in a second bulk-update pass.

use crate::error::AppError;
use crate::models::{DropRecord, DropStatus, RewardGroup};
use crate::services::compose::{
    compose_single_body, compose_thread, substitute_absolute, substitute_discord, ComposeContext,
    NotificationPhase, SingleBody, ThreadSegment,
};
use crate::services::discord::ChatChannel;
use crate::services::push::{PushChannel, PushNotification};
use crate::services::rewards::align_rewards;
use crate::services::twitter::ThreadChannel;
use chrono::{DateTime, Utc};

/// Logical Discord channel the dispatcher posts to.
pub const DISCORD_DROPS_CHANNEL: &str = "drops";

/// Tally of one dispatch batch.
#[derive(Debug, Default, Clone)]
pub struct DispatchSummary {
    pub drops_examined: usize,
    pub tweets_posted: usize,
    pub chat_messages: usize,
    pub push_messages: usize,
    pub failed_drops: usize,
}

/// Per-batch notification dispatcher over borrowed channel handles.
pub struct NotificationDispatcher<'a> {
    pub twitter: &'a dyn ThreadChannel,
    pub chat: &'a dyn ChatChannel,
    pub push: &'a dyn PushChannel,
    /// Public drops page link (pre-shortened width)
    pub link: &'a str,
    pub push_audience: &'a str,
}

impl<'a> NotificationDispatcher<'a> {
    /// Dispatch every due notification for the batch, mutating delivery
    /// flags in place. Failures are contained per drop.
    pub async fn dispatch_all(
        &self,
        records: &mut [DropRecord],
        now: DateTime<Utc>,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for record in records.iter_mut() {
            summary.drops_examined += 1;
            if let Err(e) = self.dispatch_drop(record, now, &mut summary).await {
                summary.failed_drops += 1;
                tracing::error!(
                    drop_id = %record.drop_id,
                    error = %e,
                    "Notification dispatch failed; continuing with next drop"
                );
            }
        }

        summary
    }

    async fn dispatch_drop(
        &self,
        record: &mut DropRecord,
        now: DateTime<Utc>,
        summary: &mut DispatchSummary,
    ) -> Result<(), AppError> {
        // Correction owed on an already-announced upcoming drop. Does not
        // re-arm any delivery flag; it is a one-shot extra send.
        if record.send_correction
            && record.upcoming_notifications_sent
            && record.status == DropStatus::Upcoming
        {
            self.send_drop_phase(record, NotificationPhase::Correction, summary)
                .await?;
            record.send_correction = false;
            tracing::info!(drop_id = %record.drop_id, "Correction sent");
        }

        match record.status {
            // Upcoming announcements wait for a human to confirm the new
            // record (live announcements cannot, they are time-critical).
            DropStatus::Upcoming
                if !record.upcoming_notifications_sent
                    && !record.needs_review
                    && !record.reward_groups.is_empty() =>
            {
                self.send_drop_phase(record, NotificationPhase::Upcoming, summary)
                    .await?;
                record.upcoming_notifications_sent = true;
                tracing::info!(drop_id = %record.drop_id, "Upcoming announcement sent");
            }
            DropStatus::Active => {
                self.send_active(record, now, summary).await?;
            }
            _ => {}
        }

        Ok(())
    }

    /// One announcement covering the whole drop: a single Twitter thread
    /// across all groups, plus one chat/push message per group. Used for
    /// the upcoming phase and for corrections.
    async fn send_drop_phase(
        &self,
        record: &DropRecord,
        phase: NotificationPhase,
        summary: &mut DispatchSummary,
    ) -> Result<(), AppError> {
        let aligned = align_rewards(record);
        let mut reply_to: Option<String> = None;

        for (group, rewards) in record.reward_groups.iter().zip(aligned.iter()) {
            let ctx = ComposeContext {
                drop: record,
                group,
                rewards,
                link: self.link,
                phase,
            };
            let segments = compose_thread(&ctx);
            let content = compose_single_body(&ctx);

            reply_to = self.post_segments(&segments, reply_to, summary).await?;
            self.send_chat_and_push(record, group, &content, false, summary)
                .await?;
        }

        Ok(())
    }

    /// Live-drop dispatch: every group whose start has passed, gated per
    /// channel by its own flag. `notifs_sent` is derived afterwards and
    /// has no gating role of its own.
    async fn send_active(
        &self,
        record: &mut DropRecord,
        now: DateTime<Utc>,
        summary: &mut DispatchSummary,
    ) -> Result<(), AppError> {
        let aligned = align_rewards(record);

        for idx in 0..record.reward_groups.len() {
            let group = &record.reward_groups[idx];
            if group.start > now {
                continue;
            }
            let send_twitter = !group.active_twitter_notifs_sent;
            let send_chat = !group.active_discord_notifs_sent;
            if !send_twitter && !send_chat {
                continue;
            }

            let ctx = ComposeContext {
                drop: record,
                group,
                rewards: &aligned[idx],
                link: self.link,
                phase: NotificationPhase::Active,
            };
            let segments = send_twitter.then(|| compose_thread(&ctx));
            let content = send_chat.then(|| compose_single_body(&ctx));

            if let Some(segments) = segments {
                self.post_segments(&segments, None, summary).await?;
                record.reward_groups[idx].active_twitter_notifs_sent = true;
            }
            if let Some(content) = content {
                let group = &record.reward_groups[idx];
                self.send_chat_and_push(record, group, &content, true, summary)
                    .await?;
                record.reward_groups[idx].active_discord_notifs_sent = true;
            }
        }

        let eligible: Vec<&RewardGroup> = record
            .reward_groups
            .iter()
            .filter(|g| g.start <= now)
            .collect();
        record.notifs_sent = !eligible.is_empty()
            && eligible
                .iter()
                .all(|g| g.active_twitter_notifs_sent && g.active_discord_notifs_sent);

        Ok(())
    }

    /// Post thread segments in order, chaining reply IDs. Images upload
    /// one at a time ahead of their segment.
    async fn post_segments(
        &self,
        segments: &[ThreadSegment],
        mut reply_to: Option<String>,
        summary: &mut DispatchSummary,
    ) -> Result<Option<String>, AppError> {
        for segment in segments {
            let mut media_ids = Vec::with_capacity(segment.image_urls.len());
            for url in &segment.image_urls {
                media_ids.push(self.twitter.upload_image(url).await?);
            }
            let id = self
                .twitter
                .create_post(&segment.text, reply_to.as_deref(), &media_ids)
                .await?;
            summary.tweets_posted += 1;
            reply_to = Some(id);
        }
        Ok(reply_to)
    }

    /// Send the single-body content to Discord and push, substituting the
    /// date placeholders per channel.
    async fn send_chat_and_push(
        &self,
        record: &DropRecord,
        group: &RewardGroup,
        content: &SingleBody,
        mention_role: bool,
        summary: &mut DispatchSummary,
    ) -> Result<(), AppError> {
        let chat_text = format!(
            "**{}**\n{}",
            content.header,
            substitute_discord(&content.body, group.start, group.end)
        );
        self.chat
            .send(DISCORD_DROPS_CHANNEL, &chat_text, mention_role)
            .await?;
        summary.chat_messages += 1;

        let notification = PushNotification {
            title: content.header.clone(),
            body: substitute_absolute(&content.body, group.start, group.end),
            subtitle: Some(record.campaign_name.clone()),
            url: self.link.to_string(),
            audience_segment: self.push_audience.to_string(),
        };
        self.push.send(&notification).await?;
        summary.push_messages += 1;

        Ok(())
    }
}
