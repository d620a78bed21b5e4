// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Twitch Drop campaign records as persisted in Firestore.

use crate::models::reward::RewardDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Campaign lifecycle status.
///
/// Transitions only move forward (UPCOMING → ACTIVE → EXPIRED). EXPIRED is
/// derived locally from `campaign_end` and never regresses, even if the
/// upstream feed still reports the campaign as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DropStatus {
    Upcoming,
    Active,
    Expired,
}

impl DropStatus {
    /// Position in the forward-only lifecycle.
    pub fn rank(self) -> u8 {
        match self {
            DropStatus::Upcoming => 0,
            DropStatus::Active => 1,
            DropStatus::Expired => 2,
        }
    }

    /// Parse an upstream status string, defaulting to UPCOMING on anything
    /// unrecognized (partial records are tolerated downstream).
    pub fn parse_upstream(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "ACTIVE" | "LIVE" => DropStatus::Active,
            "EXPIRED" => DropStatus::Expired,
            _ => DropStatus::Upcoming,
        }
    }
}

/// A Twitch channel where a drop can be earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel URL
    pub url: String,
    /// Channel display name
    pub display_name: String,
}

/// Raw reward identifiers as reported by the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawReward {
    /// Upstream reward name
    pub name: String,
    /// Stable reward code (matches a definition's waypoint_id)
    pub code: String,
}

/// A time-boxed reward tier within a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardGroup {
    /// When this tier becomes claimable
    pub start: DateTime<Utc>,
    /// When this tier closes
    pub end: DateTime<Utc>,
    /// Watch time required to earn the tier
    pub required_minutes_watched: u32,
    /// Rewards granted by this tier
    pub rewards: Vec<RawReward>,
    /// Live announcement already sent on Twitter for this tier
    #[serde(default)]
    pub active_twitter_notifs_sent: bool,
    /// Live announcement already sent on Discord/push for this tier
    #[serde(default)]
    pub active_discord_notifs_sent: bool,
}

impl RewardGroup {
    /// Set-equality of the reward lists, ignoring order and duplicates.
    pub fn same_rewards(&self, other: &RewardGroup) -> bool {
        let a: HashSet<&RawReward> = self.rewards.iter().collect();
        let b: HashSet<&RawReward> = other.rewards.iter().collect();
        a == b
    }

    /// Content equality: same reward set plus exact start/end/watch-minutes.
    pub fn content_eq(&self, other: &RewardGroup) -> bool {
        self.same_rewards(other)
            && self.start == other.start
            && self.end == other.end
            && self.required_minutes_watched == other.required_minutes_watched
    }
}

/// Order-independent equality of two reward-group lists.
///
/// Groups are matched by content, not index: every group on one side must
/// pair off with a distinct, content-equal group on the other.
pub fn reward_groups_equal(a: &[RewardGroup], b: &[RewardGroup]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut unmatched: Vec<&RewardGroup> = b.iter().collect();
    for group in a {
        match unmatched.iter().position(|g| group.content_eq(g)) {
            Some(idx) => {
                unmatched.swap_remove(idx);
            }
            None => return false,
        }
    }
    true
}

/// Fields the reconciler compares, with their persisted names.
///
/// Typed stand-in for the field-name dictionaries the CMS used; the
/// persisted names keep the original camelCase spelling so historical
/// review tooling continues to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropField {
    CampaignStart,
    CampaignEnd,
    CampaignName,
    AllowedChannels,
    RewardGroups,
    Status,
    Game,
}

impl DropField {
    /// Persisted field name recorded in `updated_fields`.
    pub fn name(self) -> &'static str {
        match self {
            DropField::CampaignStart => "campaignStart",
            DropField::CampaignEnd => "campaignEnd",
            DropField::CampaignName => "campaignName",
            DropField::AllowedChannels => "allowedChannels",
            DropField::RewardGroups => "rewardGroups",
            DropField::Status => "status",
            DropField::Game => "game",
        }
    }

    /// Whether a change to this field invalidates already-sent notifications.
    pub fn affects_notifications(self) -> bool {
        matches!(
            self,
            DropField::CampaignStart
                | DropField::CampaignEnd
                | DropField::RewardGroups
                | DropField::AllowedChannels
        )
    }
}

/// Persisted drop-campaign record.
///
/// Document ID is `drop_id`. Records are never deleted; expired campaigns
/// remain for historical display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropRecord {
    /// Stable upstream campaign identifier (also the document ID)
    pub drop_id: String,
    /// Display name(s) of the game(s) the campaign spans
    pub game: String,
    /// Campaign display name
    pub campaign_name: String,
    /// Campaign start
    pub campaign_start: DateTime<Utc>,
    /// Campaign end
    pub campaign_end: DateTime<Utc>,
    /// Lifecycle status (forward-only)
    pub status: DropStatus,
    /// Channels where the drop can be earned; empty means "pending"
    pub allowed_channels: Vec<ChannelRef>,
    /// Reward tiers
    pub reward_groups: Vec<RewardGroup>,
    /// Resolved reward definitions, order-aligned to the flattened reward
    /// list across all groups. Stored as a separate relation document and
    /// stitched in on read, so it is skipped when the record serializes.
    #[serde(skip_serializing, default)]
    pub reward_references: Vec<RewardDefinition>,
    /// True until a human has confirmed the latest update
    #[serde(default)]
    pub needs_review: bool,
    /// Field names changed by the most recent reconciliation pass
    #[serde(default)]
    pub updated_fields: Vec<String>,
    /// All live announcements delivered on every channel
    #[serde(default)]
    pub notifs_sent: bool,
    /// Upcoming announcement delivered
    #[serde(default)]
    pub upcoming_notifications_sent: bool,
    /// A previously announced detail changed; correction messages are owed
    #[serde(default)]
    pub send_correction: bool,
    /// When this record was first created
    pub first_seen_at: DateTime<Utc>,
    /// Last reconciliation that touched this record
    pub updated_at: DateTime<Utc>,
}

impl DropRecord {
    /// Total reward count across all groups (flattened).
    pub fn total_reward_count(&self) -> usize {
        self.reward_groups.iter().map(|g| g.rewards.len()).sum()
    }

    /// Whether `reward_references` lines up with the flattened reward list.
    /// A mismatch forces raw-name fallback rendering downstream.
    pub fn references_aligned(&self) -> bool {
        !self.reward_references.is_empty()
            && self.reward_references.len() == self.total_reward_count()
    }
}
