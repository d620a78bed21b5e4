// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Canonical reward definitions, curated by the site operators.

use serde::{Deserialize, Serialize};

/// Curated reward definition looked up during reconciliation.
///
/// Document ID is `waypoint_id`, which matches the `code` the upstream feed
/// attaches to a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDefinition {
    /// Stable reward identifier
    pub waypoint_id: String,
    /// Canonical reward name
    pub title: String,
    /// Human-readable display string used in notifications
    pub notification_text: String,
    /// Ordered image references for attachments
    #[serde(default)]
    pub image_set: Vec<String>,
    /// Whether this reward is new (vs. returning from an earlier campaign)
    #[serde(default)]
    pub reward_is_new: bool,
}
