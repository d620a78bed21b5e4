// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drop reconciliation: merges normalized upstream campaigns into the
//! persisted records.
//!
//! The merge itself is pure (`merge_upstream`); `reconcile` wraps it with
//! store IO and the two-phase write (bulk record upsert, then per-drop
//! reward-reference relation replacement).

use crate::db::DropStore;
use crate::error::AppError;
use crate::models::drop::reward_groups_equal;
use crate::models::{DropField, DropRecord, DropStatus};
use crate::services::alerts::OperatorNotifier;
use crate::services::rewards::resolve_references;
use chrono::{DateTime, Utc};

/// Result of merging one upstream campaign into the persisted state.
#[derive(Debug)]
pub struct MergeResult {
    pub record: DropRecord,
    /// Any field applied (or the record is brand new)
    pub changed: bool,
    /// The record transitioned to ACTIVE in this merge
    pub went_active: bool,
    /// Reward groups were replaced; references must be re-resolved
    pub groups_changed: bool,
    /// First sighting of this drop_id
    pub is_new: bool,
}

/// Merge one normalized upstream record into its persisted counterpart.
///
/// Pure: all clock input comes through `now`. Status never regresses;
/// notification-affecting changes mark the record for review and, when the
/// drop was already announced, for correction.
pub fn merge_upstream(
    existing: Option<DropRecord>,
    upstream: DropRecord,
    now: DateTime<Utc>,
) -> MergeResult {
    let Some(mut record) = existing else {
        let went_active = upstream.status == DropStatus::Active;
        let mut record = upstream;
        record.needs_review = true;
        record.updated_fields = vec!["new".to_string()];
        record.first_seen_at = now;
        record.updated_at = now;
        return MergeResult {
            record,
            changed: true,
            went_active,
            groups_changed: true,
            is_new: true,
        };
    };

    let mut changed_fields: Vec<DropField> = Vec::new();
    let mut went_active = false;
    let mut groups_changed = false;

    if record.campaign_start != upstream.campaign_start {
        record.campaign_start = upstream.campaign_start;
        changed_fields.push(DropField::CampaignStart);
    }
    if record.campaign_end != upstream.campaign_end {
        record.campaign_end = upstream.campaign_end;
        changed_fields.push(DropField::CampaignEnd);
    }
    if record.campaign_name != upstream.campaign_name {
        record.campaign_name = upstream.campaign_name.clone();
        changed_fields.push(DropField::CampaignName);
    }
    if record.game != upstream.game {
        record.game = upstream.game.clone();
        changed_fields.push(DropField::Game);
    }
    if record.allowed_channels != upstream.allowed_channels {
        record.allowed_channels = upstream.allowed_channels.clone();
        changed_fields.push(DropField::AllowedChannels);
    }

    if !reward_groups_equal(&record.reward_groups, &upstream.reward_groups) {
        // Carry per-group sent flags across the replacement by matching
        // groups on reward-set content, so an unrelated tier change does
        // not re-trigger notifications for unaffected tiers.
        let mut new_groups = upstream.reward_groups.clone();
        for group in &mut new_groups {
            if let Some(old) = record.reward_groups.iter().find(|g| g.same_rewards(group)) {
                group.active_twitter_notifs_sent = old.active_twitter_notifs_sent;
                group.active_discord_notifs_sent = old.active_discord_notifs_sent;
            }
        }
        record.reward_groups = new_groups;
        changed_fields.push(DropField::RewardGroups);
        groups_changed = true;
    }

    // Status only ever moves forward; EXPIRED is terminal.
    if upstream.status.rank() > record.status.rank() {
        record.status = upstream.status;
        changed_fields.push(DropField::Status);
        if upstream.status == DropStatus::Active {
            went_active = true;
        }
    }

    let changed = !changed_fields.is_empty();
    if changed {
        let already_notified = record.notifs_sent || record.upcoming_notifications_sent;
        for field in &changed_fields {
            let name = field.name().to_string();
            if !record.updated_fields.contains(&name) {
                record.updated_fields.push(name);
            }
            if field.affects_notifications() {
                record.needs_review = true;
                if already_notified {
                    record.send_correction = true;
                }
            }
        }
        record.updated_at = now;
    }

    MergeResult {
        record,
        changed,
        went_active,
        groups_changed,
        is_new: false,
    }
}

/// Result of one reconciliation pass over the full feed.
pub struct ReconcileOutcome {
    pub records: Vec<DropRecord>,
    pub any_changed: bool,
    pub any_went_active: bool,
    pub new_count: usize,
    pub updated_count: usize,
}

/// Reconcile the normalized upstream list against the store.
///
/// Reads persisted records by upstream drop_id, merges each campaign,
/// re-resolves reward references where needed, then persists: bulk upsert
/// first, relation replacement second. A relation write failure is logged
/// and skipped; the empty-reference check on the next pass self-heals it.
pub async fn reconcile(
    store: &dyn DropStore,
    alerts: &dyn OperatorNotifier,
    upstream: Vec<DropRecord>,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, AppError> {
    let ids: Vec<String> = upstream.iter().map(|d| d.drop_id.clone()).collect();
    let persisted = store.get_drops_by_ids(&ids).await?;

    let mut records = Vec::with_capacity(upstream.len());
    let mut needs_reference_write = Vec::new();
    let mut any_changed = false;
    let mut any_went_active = false;
    let mut new_count = 0;
    let mut updated_count = 0;

    for normalized in upstream {
        let existing = persisted
            .iter()
            .find(|p| p.drop_id == normalized.drop_id)
            .cloned();

        let merged = merge_upstream(existing, normalized, now);
        let mut record = merged.record;

        if merged.is_new {
            new_count += 1;
        } else if merged.changed {
            updated_count += 1;
        }
        any_changed |= merged.changed;
        any_went_active |= merged.went_active;

        if merged.groups_changed || record.reward_references.is_empty() {
            record.reward_references = resolve_references(store, alerts, &record).await?;
            needs_reference_write.push(record.drop_id.clone());
        }

        records.push(record);
    }

    // Phase one: bulk upsert the records themselves. Not retried within
    // the run; the next scheduled pass re-diffs from the same feed.
    if let Err(e) = store.upsert_drops(&records).await {
        tracing::error!(error = %e, "Bulk drop upsert failed");
    }

    // Phase two: replace the reference relations. Eventually consistent;
    // failures are logged and left for the next pass.
    for record in records
        .iter()
        .filter(|r| needs_reference_write.contains(&r.drop_id))
    {
        if let Err(e) = store
            .replace_reward_references(&record.drop_id, &record.reward_references)
            .await
        {
            tracing::warn!(
                drop_id = %record.drop_id,
                error = %e,
                "Failed to replace reward references; will retry next pass"
            );
        }
    }

    tracing::info!(
        total = records.len(),
        new = new_count,
        updated = updated_count,
        "Reconciliation pass complete"
    );

    Ok(ReconcileOutcome {
        records,
        any_changed,
        any_went_active,
        new_count,
        updated_count,
    })
}
