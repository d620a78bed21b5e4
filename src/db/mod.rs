//! Database layer (Firestore).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemoryDropStore;

use crate::error::AppError;
use crate::models::{DropRecord, RewardDefinition};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const DROPS: &str = "drops";
    /// Reward-reference relation docs (keyed by drop_id)
    pub const DROP_REWARD_REFS: &str = "drop_reward_refs";
    /// Curated reward definitions (keyed by waypoint_id)
    pub const REWARD_DEFINITIONS: &str = "reward_definitions";
}

/// Persistence operations the reconciliation pipeline needs.
///
/// The production implementation is [`FirestoreDb`]; tests drive the
/// pipeline against [`InMemoryDropStore`].
#[async_trait]
pub trait DropStore: Send + Sync {
    /// Fetch persisted drop records for the given campaign IDs, with their
    /// reward-reference relations stitched in. Unknown IDs are skipped.
    async fn get_drops_by_ids(&self, ids: &[String]) -> Result<Vec<DropRecord>, AppError>;

    /// Bulk create-or-update drop records (reward references excluded).
    async fn upsert_drops(&self, drops: &[DropRecord]) -> Result<(), AppError>;

    /// Replace the reward-reference relation for one drop.
    async fn replace_reward_references(
        &self,
        drop_id: &str,
        references: &[RewardDefinition],
    ) -> Result<(), AppError>;

    /// Persist mutated notification flags after a dispatch pass.
    async fn update_sent_flags(&self, drops: &[DropRecord]) -> Result<(), AppError>;

    /// Look up reward definitions by exact code (waypoint_id).
    async fn find_rewards_by_code(&self, code: &str) -> Result<Vec<RewardDefinition>, AppError>;

    /// Fuzzy lookup by name containment (case-insensitive, both directions).
    async fn find_rewards_by_name(&self, name: &str) -> Result<Vec<RewardDefinition>, AppError>;
}
