// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Drop records (one document per campaign, keyed by drop_id)
//! - Reward-reference relations (separate docs so they can be replaced
//!   independently of the main record)
//! - Reward definitions (curated lookup collection)

use crate::db::{collections, DropStore};
use crate::error::AppError;
use crate::models::{DropRecord, RewardDefinition};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Relation document carrying a drop's resolved reward definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RewardRefsDoc {
    drop_id: String,
    references: Vec<RewardDefinition>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Safe document ID for a drop (upstream IDs are opaque strings).
    fn doc_id(drop_id: &str) -> String {
        urlencoding::encode(drop_id).into_owned()
    }

    /// Fetch one drop record without its reference relation.
    async fn get_drop(&self, drop_id: &str) -> Result<Option<DropRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DROPS)
            .obj()
            .one(&Self::doc_id(drop_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch the reward-reference relation for one drop.
    async fn get_reward_references(
        &self,
        drop_id: &str,
    ) -> Result<Vec<RewardDefinition>, AppError> {
        let doc: Option<RewardRefsDoc> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DROP_REWARD_REFS)
            .obj()
            .one(&Self::doc_id(drop_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(|d| d.references).unwrap_or_default())
    }
}

#[async_trait]
impl DropStore for FirestoreDb {
    async fn get_drops_by_ids(&self, ids: &[String]) -> Result<Vec<DropRecord>, AppError> {
        // Sequential reads keep ordering deterministic; the upstream feed
        // rarely carries more than a handful of campaigns at once.
        let mut records = Vec::new();
        for id in ids {
            if let Some(mut record) = self.get_drop(id).await? {
                record.reward_references = self.get_reward_references(id).await?;
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn upsert_drops(&self, drops: &[DropRecord]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(drops.to_vec())
            .map(|record| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::DROPS)
                    .document_id(Self::doc_id(&record.drop_id))
                    .object(&record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    async fn replace_reward_references(
        &self,
        drop_id: &str,
        references: &[RewardDefinition],
    ) -> Result<(), AppError> {
        let doc = RewardRefsDoc {
            drop_id: drop_id.to_string(),
            references: references.to_vec(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DROP_REWARD_REFS)
            .document_id(Self::doc_id(drop_id))
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_sent_flags(&self, drops: &[DropRecord]) -> Result<(), AppError> {
        // Flag updates rewrite the whole record; reward references live in
        // their own relation doc and are untouched here.
        self.upsert_drops(drops).await
    }

    async fn find_rewards_by_code(&self, code: &str) -> Result<Vec<RewardDefinition>, AppError> {
        let code = code.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REWARD_DEFINITIONS)
            .filter(move |q| q.for_all([q.field("waypoint_id").eq(code.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_rewards_by_name(&self, name: &str) -> Result<Vec<RewardDefinition>, AppError> {
        // Firestore has no substring queries; the curated definition
        // collection is small, so scan and filter in memory.
        let all: Vec<RewardDefinition> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REWARD_DEFINITIONS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let needle = name.to_lowercase();
        Ok(all
            .into_iter()
            .filter(|def| {
                let title = def.title.to_lowercase();
                title.contains(&needle) || needle.contains(&title)
            })
            .collect())
    }
}
