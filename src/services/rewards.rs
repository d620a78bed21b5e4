// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward resolution: binds raw upstream rewards to curated definitions.
//!
//! Resolution is best-effort and non-fatal. A reward that cannot be bound
//! unambiguously is left out of the reference list and the operator is
//! alerted; downstream composition falls back to the raw upstream name for
//! that entry.

use crate::db::DropStore;
use crate::error::AppError;
use crate::models::{DropRecord, RawReward, RewardDefinition};
use crate::services::alerts::OperatorNotifier;

/// One reward as the composer sees it: either bound to a curated
/// definition or carried through with its raw upstream identifiers.
#[derive(Debug, Clone)]
pub enum ResolvedReward {
    Resolved(RewardDefinition),
    Unresolved(RawReward),
}

impl ResolvedReward {
    /// Display name used in notification bodies.
    pub fn display_name(&self) -> &str {
        match self {
            ResolvedReward::Resolved(def) => &def.notification_text,
            ResolvedReward::Unresolved(raw) => &raw.name,
        }
    }

    /// New/returning status, when known.
    pub fn is_new(&self) -> Option<bool> {
        match self {
            ResolvedReward::Resolved(def) => Some(def.reward_is_new),
            ResolvedReward::Unresolved(_) => None,
        }
    }

    /// Attachment images, when known.
    pub fn images(&self) -> &[String] {
        match self {
            ResolvedReward::Resolved(def) => &def.image_set,
            ResolvedReward::Unresolved(_) => &[],
        }
    }
}

/// Resolve the flattened reward list of one drop against the definition
/// store. Lookup is by exact code first, then fuzzy name containment.
///
/// Returns the resolved definitions in flattened-reward order; unresolved
/// rewards are excluded (which downstream detects as a count mismatch and
/// renders with raw names).
pub async fn resolve_references(
    store: &dyn DropStore,
    alerts: &dyn OperatorNotifier,
    record: &DropRecord,
) -> Result<Vec<RewardDefinition>, AppError> {
    let mut references = Vec::new();

    for group in &record.reward_groups {
        for reward in &group.rewards {
            match lookup_reward(store, reward).await? {
                LookupOutcome::One(def) => references.push(def),
                LookupOutcome::None => {
                    alerts
                        .notify(
                            "Unknown Twitch drop reward",
                            &format!(
                                "No reward definition matches \"{}\" (code {}) on drop {}. \
                                 Add one so notifications can render it.",
                                reward.name, reward.code, record.drop_id
                            ),
                        )
                        .await;
                }
                LookupOutcome::Many(count) => {
                    alerts
                        .notify(
                            "Ambiguous Twitch drop reward",
                            &format!(
                                "{} reward definitions match \"{}\" (code {}) on drop {}. \
                                 Manual disambiguation needed.",
                                count, reward.name, reward.code, record.drop_id
                            ),
                        )
                        .await;
                }
            }
        }
    }

    Ok(references)
}

enum LookupOutcome {
    One(RewardDefinition),
    None,
    Many(usize),
}

async fn lookup_reward(
    store: &dyn DropStore,
    reward: &RawReward,
) -> Result<LookupOutcome, AppError> {
    let mut matches = store.find_rewards_by_code(&reward.code).await?;

    // Code misses happen when upstream reuses or rotates codes; the name
    // is the more stable handle in practice.
    if matches.is_empty() {
        matches = store.find_rewards_by_name(&reward.name).await?;
    }

    Ok(match matches.len() {
        1 => LookupOutcome::One(matches.remove(0)),
        0 => LookupOutcome::None,
        n => LookupOutcome::Many(n),
    })
}

/// Pair every raw reward with its definition, per group.
///
/// When the stored references line up with the flattened reward list they
/// are applied positionally; otherwise each reward is re-matched by code,
/// and anything that cannot be matched is carried through unresolved.
pub fn align_rewards(record: &DropRecord) -> Vec<Vec<ResolvedReward>> {
    if record.references_aligned() {
        let mut refs = record.reward_references.iter().cloned();
        record
            .reward_groups
            .iter()
            .map(|group| {
                group
                    .rewards
                    .iter()
                    .map(|reward| {
                        refs.next()
                            .map(ResolvedReward::Resolved)
                            .unwrap_or_else(|| ResolvedReward::Unresolved(reward.clone()))
                    })
                    .collect()
            })
            .collect()
    } else {
        record
            .reward_groups
            .iter()
            .map(|group| {
                group
                    .rewards
                    .iter()
                    .map(|reward| {
                        record
                            .reward_references
                            .iter()
                            .find(|def| def.waypoint_id == reward.code)
                            .map(|def| ResolvedReward::Resolved(def.clone()))
                            .unwrap_or_else(|| ResolvedReward::Unresolved(reward.clone()))
                    })
                    .collect()
            })
            .collect()
    }
}
