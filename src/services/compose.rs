// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification content composer.
//!
//! Builds two parallel content forms for one reward group:
//! - Thread-style segments for Twitter, budgeted to 280 characters with a
//!   fixed link reservation and at most 4 images per post
//! - A single header + body for Discord/push, with `$(startTime)` /
//!   `$(endTime)` placeholders substituted per channel
//!
//! Everything in this module is pure; the dispatcher owns all IO.

use crate::models::{DropRecord, RewardGroup};
use crate::services::rewards::ResolvedReward;
use crate::time_utils;
use chrono::{DateTime, Utc};

/// Hard per-post character budget (Twitter).
const TWEET_CHAR_BUDGET: usize = 280;
/// Characters reserved for the link in every segment, regardless of the
/// actual URL length (URLs are pre-shortened to t.co width).
const RESERVED_LINK_CHARS: usize = 24;
/// Maximum media attachments per post.
const MAX_IMAGES_PER_POST: usize = 4;

/// Which lifecycle moment a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Active,
    Upcoming,
    Correction,
}

/// Everything the composer needs for one reward group.
pub struct ComposeContext<'a> {
    pub drop: &'a DropRecord,
    pub group: &'a RewardGroup,
    pub rewards: &'a [ResolvedReward],
    pub link: &'a str,
    pub phase: NotificationPhase,
}

/// One post in a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSegment {
    /// Ready-to-post text, link included
    pub text: String,
    /// Up to four image URLs to attach
    pub image_urls: Vec<String>,
}

/// Chat/push content with placeholders still in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleBody {
    pub header: String,
    pub body: String,
}

// ─── Shared phrasing ─────────────────────────────────────────────────────────

/// NEW / RETURNING / NEW AND RETURNING / NEW OR RETURNING.
///
/// NEW OR RETURNING is the honest label when resolution is degraded and no
/// reward's status is known at all.
pub fn freshness_label(rewards: &[ResolvedReward]) -> &'static str {
    let known: Vec<bool> = rewards.iter().filter_map(|r| r.is_new()).collect();
    if known.is_empty() {
        return "NEW OR RETURNING";
    }
    let any_new = known.iter().any(|&n| n);
    let any_returning = known.iter().any(|&n| !n);
    match (any_new, any_returning) {
        (true, false) => "NEW",
        (false, true) => "RETURNING",
        _ => "NEW AND RETURNING",
    }
}

/// "30 minutes", "1 hour", "2 hours"; hours only when evenly divisible.
pub fn watch_time_phrase(minutes: u32) -> Option<String> {
    match minutes {
        0 => None,
        m if m % 60 == 0 => {
            let hours = m / 60;
            Some(if hours == 1 {
                "1 hour".to_string()
            } else {
                format!("{} hours", hours)
            })
        }
        1 => Some("1 minute".to_string()),
        m => Some(format!("{} minutes", m)),
    }
}

fn header_line(ctx: &ComposeContext) -> String {
    let label = freshness_label(ctx.rewards);
    match ctx.phase {
        NotificationPhase::Active => {
            format!("{} {} Twitch Drop is LIVE!", label, ctx.drop.game)
        }
        NotificationPhase::Upcoming => {
            format!("{} {} Twitch Drop coming up!", label, ctx.drop.game)
        }
        NotificationPhase::Correction => format!(
            "CORRECTION: updated details for the {} Twitch Drop:",
            ctx.drop.game
        ),
    }
}

fn channels_line(drop: &DropRecord) -> String {
    if drop.allowed_channels.is_empty() {
        "Participating channels: TBA".to_string()
    } else {
        let names: Vec<&str> = drop
            .allowed_channels
            .iter()
            .map(|c| c.display_name.as_str())
            .collect();
        format!("Watch on: {}", names.join(", "))
    }
}

/// A group is composable in full only when it carries rewards at all.
fn is_bare_group(group: &RewardGroup) -> bool {
    group.rewards.is_empty()
}

// ─── Thread composition ──────────────────────────────────────────────────────

/// Compose the thread segments for one reward group.
///
/// Text lines are packed greedily; a segment is closed as soon as adding
/// the next line would blow the budget (280 minus the link reservation).
/// Images attach four per segment, with extra "Part N" segments synthesized
/// when there are more images than text segments can carry.
pub fn compose_thread(ctx: &ComposeContext) -> Vec<ThreadSegment> {
    if is_bare_group(ctx.group) {
        return vec![ThreadSegment {
            text: format!(
                "{} Twitch Drop is live: {}\n{}",
                ctx.drop.game, ctx.drop.campaign_name, ctx.link
            ),
            image_urls: Vec::new(),
        }];
    }

    let mut lines = vec![header_line(ctx)];

    match watch_time_phrase(ctx.group.required_minutes_watched) {
        Some(phrase) => lines.push(format!("Watch for {} to earn:", phrase)),
        None => lines.push("Earn:".to_string()),
    }
    for reward in ctx.rewards {
        lines.push(format!("- {}", reward.display_name()));
    }

    if ctx.phase != NotificationPhase::Active {
        lines.push(format!(
            "Runs {} - {} (UTC)",
            time_utils::format_short_date(ctx.group.start),
            time_utils::format_short_date(ctx.group.end),
        ));
    }
    lines.push(channels_line(ctx.drop));

    let mut texts = pack_lines(lines, ctx.link);

    // Attach images; overflow past the text segments gets bare "Part N"
    // continuation posts.
    let images = collect_images(ctx.rewards);
    let segments_for_images = images.len().div_ceil(MAX_IMAGES_PER_POST);
    while texts.len() < segments_for_images {
        let part = texts.len() + 1;
        texts.push(format!("Part {}\n{}", part, ctx.link));
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| ThreadSegment {
            text,
            image_urls: images
                .iter()
                .skip(i * MAX_IMAGES_PER_POST)
                .take(MAX_IMAGES_PER_POST)
                .cloned()
                .collect(),
        })
        .collect()
}

/// Greedy line packing under the per-segment budget; the link is appended
/// to every segment.
fn pack_lines(lines: Vec<String>, link: &str) -> Vec<String> {
    // One newline joins the body to the link.
    let budget = TWEET_CHAR_BUDGET - RESERVED_LINK_CHARS - 1;

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in lines {
        // A single oversized line is truncated rather than overflowing.
        let line: String = line.chars().take(budget).collect();

        let candidate = if current.is_empty() {
            line.chars().count()
        } else {
            current.chars().count() + 1 + line.chars().count()
        };

        if !current.is_empty() && candidate > budget {
            segments.push(current);
            current = line;
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(&line);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
        .into_iter()
        .map(|body| format!("{}\n{}", body, link))
        .collect()
}

/// Ordered, de-duplicated image URLs across the resolved rewards.
fn collect_images(rewards: &[ResolvedReward]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut images = Vec::new();
    for reward in rewards {
        for url in reward.images() {
            if seen.insert(url.clone()) {
                images.push(url.clone());
            }
        }
    }
    images
}

// ─── Single-body composition ─────────────────────────────────────────────────

/// Compose the chat/push content for one reward group.
///
/// Upcoming (and correction) bodies carry literal `$(startTime)` /
/// `$(endTime)` tokens; substitute per channel before sending.
pub fn compose_single_body(ctx: &ComposeContext) -> SingleBody {
    if is_bare_group(ctx.group) {
        return SingleBody {
            header: format!("{} Twitch Drop is live!", ctx.drop.game),
            body: format!("{}\n{}", ctx.drop.campaign_name, ctx.link),
        };
    }

    let mut body_lines = Vec::new();

    match watch_time_phrase(ctx.group.required_minutes_watched) {
        Some(phrase) => body_lines.push(format!("Watch for {} to earn:", phrase)),
        None => body_lines.push("Earn:".to_string()),
    }
    for reward in ctx.rewards {
        body_lines.push(format!("- {}", reward.display_name()));
    }

    if ctx.phase != NotificationPhase::Active {
        body_lines.push("Starts $(startTime), ends $(endTime).".to_string());
    }
    body_lines.push(channels_line(ctx.drop));
    body_lines.push(ctx.link.to_string());

    SingleBody {
        header: header_line(ctx),
        body: body_lines.join("\n"),
    }
}

/// Substitute placeholders with absolute UTC date strings (push).
pub fn substitute_absolute(text: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    text.replace("$(startTime)", &time_utils::format_absolute(start))
        .replace("$(endTime)", &time_utils::format_absolute(end))
}

/// Substitute placeholders with Discord dynamic-timestamp markup.
pub fn substitute_discord(text: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    text.replace("$(startTime)", &time_utils::discord_timestamp(start))
        .replace("$(endTime)", &time_utils::discord_timestamp(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DropStatus, RawReward, RewardDefinition};
    use chrono::{Duration, TimeZone};

    // Exactly RESERVED_LINK_CHARS wide, so total segment length can be
    // asserted directly against the budget.
    const LINK: &str = "https://t.co/abcde123456";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
    }

    fn resolved(name: &str, is_new: bool, images: usize) -> ResolvedReward {
        ResolvedReward::Resolved(RewardDefinition {
            waypoint_id: name.to_lowercase(),
            title: name.to_string(),
            notification_text: name.to_string(),
            image_set: (0..images)
                .map(|i| format!("https://img.test/{}-{}.png", name.to_lowercase(), i))
                .collect(),
            reward_is_new: is_new,
        })
    }

    fn unresolved(name: &str) -> ResolvedReward {
        ResolvedReward::Unresolved(RawReward {
            name: name.to_string(),
            code: "raw".to_string(),
        })
    }

    fn drop_record() -> DropRecord {
        DropRecord {
            drop_id: "D1".to_string(),
            game: "Halo Infinite".to_string(),
            campaign_name: "Season Launch".to_string(),
            campaign_start: now(),
            campaign_end: now() + Duration::days(7),
            status: DropStatus::Active,
            allowed_channels: vec![],
            reward_groups: vec![group(1)],
            reward_references: Vec::new(),
            needs_review: false,
            updated_fields: vec![],
            notifs_sent: false,
            upcoming_notifications_sent: false,
            send_correction: false,
            first_seen_at: now(),
            updated_at: now(),
        }
    }

    fn group(reward_count: usize) -> RewardGroup {
        RewardGroup {
            start: now(),
            end: now() + Duration::days(7),
            required_minutes_watched: 30,
            rewards: (0..reward_count)
                .map(|i| RawReward {
                    name: format!("Reward {}", i),
                    code: format!("x{}", i),
                })
                .collect(),
            active_twitter_notifs_sent: false,
            active_discord_notifs_sent: false,
        }
    }

    fn ctx<'a>(
        drop: &'a DropRecord,
        grp: &'a RewardGroup,
        rewards: &'a [ResolvedReward],
        phase: NotificationPhase,
    ) -> ComposeContext<'a> {
        ComposeContext {
            drop,
            group: grp,
            rewards,
            link: LINK,
            phase,
        }
    }

    #[test]
    fn test_freshness_labels() {
        assert_eq!(freshness_label(&[resolved("A", true, 0)]), "NEW");
        assert_eq!(freshness_label(&[resolved("A", false, 0)]), "RETURNING");
        assert_eq!(
            freshness_label(&[resolved("A", true, 0), resolved("B", false, 0)]),
            "NEW AND RETURNING"
        );
        assert_eq!(freshness_label(&[unresolved("A")]), "NEW OR RETURNING");
        assert_eq!(freshness_label(&[]), "NEW OR RETURNING");
    }

    #[test]
    fn test_partially_known_freshness_uses_known_statuses() {
        let rewards = [resolved("A", true, 0), unresolved("B")];
        assert_eq!(freshness_label(&rewards), "NEW");
    }

    #[test]
    fn test_watch_time_phrasing() {
        assert_eq!(watch_time_phrase(0), None);
        assert_eq!(watch_time_phrase(1).unwrap(), "1 minute");
        assert_eq!(watch_time_phrase(30).unwrap(), "30 minutes");
        assert_eq!(watch_time_phrase(60).unwrap(), "1 hour");
        assert_eq!(watch_time_phrase(120).unwrap(), "2 hours");
        assert_eq!(watch_time_phrase(90).unwrap(), "90 minutes");
    }

    #[test]
    fn test_single_segment_thread_fits_budget() {
        let drop = drop_record();
        let grp = group(2);
        let rewards = vec![resolved("Emblem", true, 0), resolved("Coating", true, 0)];
        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));

        assert_eq!(segments.len(), 1);
        assert!(segments[0].text.chars().count() <= TWEET_CHAR_BUDGET);
        assert!(segments[0].text.contains("NEW Halo Infinite Twitch Drop is LIVE!"));
        assert!(segments[0].text.contains("- Emblem"));
        assert!(segments[0].text.ends_with(LINK));
    }

    #[test]
    fn test_long_reward_list_splits_into_budgeted_segments() {
        let drop = drop_record();
        let grp = group(20);
        let rewards: Vec<ResolvedReward> = (0..20)
            .map(|i| resolved(&format!("Commemorative Weapon Coating Number {:02}", i), true, 0))
            .collect();

        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));

        assert!(segments.len() >= 2, "expected a split, got {}", segments.len());
        for segment in &segments {
            assert!(
                segment.text.chars().count() <= TWEET_CHAR_BUDGET,
                "segment over budget: {} chars",
                segment.text.chars().count()
            );
            assert!(segment.text.ends_with(LINK));
        }
        // No reward line lost in the split.
        let all_text: String = segments.iter().map(|s| s.text.as_str()).collect();
        for i in 0..20 {
            assert!(all_text.contains(&format!("Number {:02}", i)));
        }
    }

    #[test]
    fn test_upcoming_thread_includes_dates() {
        let drop = drop_record();
        let grp = group(1);
        let rewards = vec![resolved("Emblem", false, 0)];
        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Upcoming));

        assert!(segments[0].text.contains("coming up"));
        assert!(segments[0].text.contains("Runs Jan 10 - Jan 17 (UTC)"));
    }

    #[test]
    fn test_active_thread_omits_dates() {
        let drop = drop_record();
        let grp = group(1);
        let rewards = vec![resolved("Emblem", false, 0)];
        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));
        assert!(!segments[0].text.contains("Runs "));
    }

    #[test]
    fn test_images_capped_at_four_per_segment() {
        let drop = drop_record();
        let grp = group(2);
        let rewards = vec![resolved("A", true, 3), resolved("B", true, 3)];
        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));

        // 6 images over a single text segment: one Part 2 continuation.
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].image_urls.len(), 4);
        assert_eq!(segments[1].image_urls.len(), 2);
        assert!(segments[1].text.starts_with("Part 2"));
        assert!(segments[1].text.ends_with(LINK));
    }

    #[test]
    fn test_duplicate_images_attach_once() {
        let drop = drop_record();
        let grp = group(2);
        // Same definition twice: same image set.
        let rewards = vec![resolved("A", true, 2), resolved("A", true, 2)];
        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));
        let total: usize = segments.iter().map(|s| s.image_urls.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_bare_group_composes_minimal_segment() {
        let drop = drop_record();
        let grp = group(0);
        let segments = compose_thread(&ctx(&drop, &grp, &[], NotificationPhase::Active));

        assert_eq!(segments.len(), 1);
        assert!(segments[0].text.contains("Halo Infinite"));
        assert!(segments[0].text.contains("Season Launch"));
        assert!(segments[0].text.ends_with(LINK));
        assert!(!segments[0].text.contains("Watch for"));
        assert!(!segments[0].text.contains("Participating channels"));
    }

    #[test]
    fn test_correction_thread_is_labeled() {
        let drop = drop_record();
        let grp = group(1);
        let rewards = vec![resolved("Emblem", true, 0)];
        let segments = compose_thread(&ctx(&drop, &grp, &rewards, NotificationPhase::Correction));
        assert!(segments[0].text.starts_with("CORRECTION:"));
    }

    #[test]
    fn test_single_body_upcoming_has_placeholders() {
        let drop = drop_record();
        let grp = group(1);
        let rewards = vec![resolved("Emblem", true, 0)];
        let content = compose_single_body(&ctx(&drop, &grp, &rewards, NotificationPhase::Upcoming));

        assert!(content.body.contains("$(startTime)"));
        assert!(content.body.contains("$(endTime)"));
        assert!(content.header.contains("coming up"));
    }

    #[test]
    fn test_single_body_active_has_no_placeholders() {
        let drop = drop_record();
        let grp = group(1);
        let rewards = vec![resolved("Emblem", true, 0)];
        let content = compose_single_body(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));
        assert!(!content.body.contains("$(startTime)"));
    }

    #[test]
    fn test_substitution_per_channel() {
        let start = now();
        let end = now() + Duration::days(7);
        let text = "Starts $(startTime), ends $(endTime).";

        let push = substitute_absolute(text, start, end);
        assert_eq!(push, "Starts Jan 10, 2026 12:00 PM UTC, ends Jan 17, 2026 12:00 PM UTC.");

        let discord = substitute_discord(text, start, end);
        assert_eq!(
            discord,
            format!("Starts <t:{}:f>, ends <t:{}:f>.", start.timestamp(), end.timestamp())
        );
    }

    #[test]
    fn test_channels_line_lists_names() {
        let mut drop = drop_record();
        drop.allowed_channels = vec![
            crate::models::ChannelRef {
                url: "https://twitch.tv/halo".to_string(),
                display_name: "Halo".to_string(),
            },
            crate::models::ChannelRef {
                url: "https://twitch.tv/xbox".to_string(),
                display_name: "Xbox".to_string(),
            },
        ];
        let grp = group(1);
        let rewards = vec![resolved("Emblem", true, 0)];
        let content = compose_single_body(&ctx(&drop, &grp, &rewards, NotificationPhase::Active));
        assert!(content.body.contains("Watch on: Halo, Xbox"));
    }
}
