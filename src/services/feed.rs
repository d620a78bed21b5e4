// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upstream Twitch drops feed client and campaign normalizer.
//!
//! Handles:
//! - Fetching the raw campaign list
//! - Both accepted feed shapes (flat campaign array, nested GraphQL response)
//! - Normalization into the internal drop record (pure, best-effort)

use crate::error::AppError;
use crate::models::{ChannelRef, DropRecord, DropStatus, RawReward, RewardGroup};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Assumed campaign length when the feed omits an end date.
const DEFAULT_CAMPAIGN_DAYS: i64 = 14;

// ─── Wire shapes ─────────────────────────────────────────────────────────────

/// One campaign as reported by the feed. The nested GraphQL envelope is the
/// canonical shape; the flat campaign array parses into the same type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCampaign {
    pub id: String,
    pub name: String,
    pub status: String,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub game: Option<RawGame>,
    /// Flat shape variant: a campaign spanning several games
    pub games: Vec<RawGame>,
    pub allow: Option<RawAllow>,
    pub time_based_drops: Vec<RawTimeBasedDrop>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGame {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAllow {
    pub channels: Vec<RawChannel>,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawChannel {
    pub name: String,
    pub display_name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTimeBasedDrop {
    pub id: String,
    pub name: String,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub required_minutes_watched: u32,
    pub benefit_edges: Vec<RawBenefitEdge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBenefitEdge {
    pub benefit: RawBenefit,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBenefit {
    pub id: String,
    pub name: String,
}

/// The two accepted response envelopes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedEnvelope {
    Graphql { data: GraphqlData },
    Flat(Vec<RawCampaign>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlData {
    current_user: GraphqlUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlUser {
    drop_campaigns: Vec<RawCampaign>,
}

/// Parse a feed response body in either accepted shape.
pub fn parse_feed(body: &str) -> Result<Vec<RawCampaign>, AppError> {
    let envelope: FeedEnvelope = serde_json::from_str(body)
        .map_err(|e| AppError::Upstream(format!("Unrecognized feed shape: {}", e)))?;

    Ok(match envelope {
        FeedEnvelope::Graphql { data } => data.current_user.drop_campaigns,
        FeedEnvelope::Flat(campaigns) => campaigns,
    })
}

// ─── Normalization ───────────────────────────────────────────────────────────

/// Map one raw campaign into a draft drop record.
///
/// Pure and best-effort: missing fields get defaults, never an error.
/// `status` is forced to EXPIRED once the campaign end has passed,
/// regardless of what the feed reports.
pub fn normalize_campaign(raw: &RawCampaign, now: DateTime<Utc>) -> DropRecord {
    let campaign_start = raw.start_at.unwrap_or(now);
    let campaign_end = raw
        .end_at
        .unwrap_or(campaign_start + Duration::days(DEFAULT_CAMPAIGN_DAYS));

    let status = if campaign_end < now {
        DropStatus::Expired
    } else {
        DropStatus::parse_upstream(&raw.status)
    };

    let game = if !raw.games.is_empty() {
        raw.games
            .iter()
            .map(|g| g.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        raw.game
            .as_ref()
            .map(|g| g.display_name.clone())
            .unwrap_or_else(|| "Unknown game".to_string())
    };

    let allowed_channels = raw
        .allow
        .as_ref()
        .map(|allow| {
            allow
                .channels
                .iter()
                .map(|ch| ChannelRef {
                    url: ch
                        .url
                        .clone()
                        .unwrap_or_else(|| format!("https://twitch.tv/{}", ch.name)),
                    display_name: if ch.display_name.is_empty() {
                        ch.name.clone()
                    } else {
                        ch.display_name.clone()
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    let reward_groups = raw
        .time_based_drops
        .iter()
        .map(|tier| RewardGroup {
            start: tier.start_at.unwrap_or(campaign_start),
            end: tier.end_at.unwrap_or(campaign_end),
            required_minutes_watched: tier.required_minutes_watched,
            rewards: tier
                .benefit_edges
                .iter()
                .map(|edge| RawReward {
                    name: edge.benefit.name.clone(),
                    code: edge.benefit.id.clone(),
                })
                .collect(),
            active_twitter_notifs_sent: false,
            active_discord_notifs_sent: false,
        })
        .collect();

    DropRecord {
        drop_id: raw.id.clone(),
        game,
        campaign_name: raw.name.clone(),
        campaign_start,
        campaign_end,
        status,
        allowed_channels,
        reward_groups,
        reward_references: Vec::new(),
        needs_review: false,
        updated_fields: Vec::new(),
        notifs_sent: false,
        upcoming_notifications_sent: false,
        send_correction: false,
        first_seen_at: now,
        updated_at: now,
    }
}

// ─── Feed client ─────────────────────────────────────────────────────────────

/// Source of upstream campaigns. Production uses [`DropsFeedClient`];
/// tests supply a canned feed.
#[async_trait]
pub trait DropsFeed: Send + Sync {
    async fn fetch_campaigns(&self) -> Result<Vec<RawCampaign>, AppError>;
}

/// HTTP client for the upstream drops feed.
#[derive(Clone)]
pub struct DropsFeedClient {
    http: reqwest::Client,
    feed_url: String,
}

impl DropsFeedClient {
    pub fn new(feed_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            feed_url,
        }
    }
}

#[async_trait]
impl DropsFeed for DropsFeedClient {
    async fn fetch_campaigns(&self) -> Result<Vec<RawCampaign>, AppError> {
        let response = self
            .http
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let campaigns = parse_feed(&body)?;

        for campaign in &campaigns {
            if campaign.id.is_empty() {
                tracing::warn!(
                    name = %campaign.name,
                    "Feed campaign is missing an id; record will not reconcile cleanly"
                );
            }
        }

        Ok(campaigns)
    }
}
