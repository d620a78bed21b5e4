// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`DropStore`] for deterministic pipeline tests.
//!
//! Mirrors the Firestore layout: drop records and their reward-reference
//! relations live in separate maps so the two-phase write behavior can be
//! observed (and made to fail) in tests.

use crate::db::DropStore;
use crate::error::AppError;
use crate::models::{DropRecord, RewardDefinition};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// In-memory document store used by the integration test suites.
#[derive(Default)]
pub struct InMemoryDropStore {
    drops: Mutex<HashMap<String, DropRecord>>,
    reward_refs: Mutex<HashMap<String, Vec<RewardDefinition>>>,
    definitions: Mutex<Vec<RewardDefinition>>,
    /// Test hook: make replace_reward_references fail (phase-two outage).
    fail_replace_references: AtomicBool,
    upsert_calls: AtomicU32,
}

impl InMemoryDropStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a curated reward definition.
    pub fn insert_definition(&self, def: RewardDefinition) {
        self.definitions.lock().unwrap().push(def);
    }

    /// Seed a persisted drop record (references included).
    pub fn insert_drop(&self, record: DropRecord) {
        let references = record.reward_references.clone();
        self.reward_refs
            .lock()
            .unwrap()
            .insert(record.drop_id.clone(), references);
        self.drops
            .lock()
            .unwrap()
            .insert(record.drop_id.clone(), record);
    }

    /// Read back one record with its references stitched in.
    pub fn get(&self, drop_id: &str) -> Option<DropRecord> {
        let mut record = self.drops.lock().unwrap().get(drop_id).cloned()?;
        record.reward_references = self
            .reward_refs
            .lock()
            .unwrap()
            .get(drop_id)
            .cloned()
            .unwrap_or_default();
        Some(record)
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.drops.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of upsert/flag-write batches executed.
    pub fn upsert_calls(&self) -> u32 {
        self.upsert_calls.load(Ordering::Relaxed)
    }

    /// Make subsequent replace_reward_references calls fail.
    pub fn set_fail_replace_references(&self, fail: bool) {
        self.fail_replace_references.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl DropStore for InMemoryDropStore {
    async fn get_drops_by_ids(&self, ids: &[String]) -> Result<Vec<DropRecord>, AppError> {
        Ok(ids.iter().filter_map(|id| self.get(id)).collect())
    }

    async fn upsert_drops(&self, drops: &[DropRecord]) -> Result<(), AppError> {
        self.upsert_calls.fetch_add(1, Ordering::Relaxed);
        let mut map = self.drops.lock().unwrap();
        for record in drops {
            map.insert(record.drop_id.clone(), record.clone());
        }
        Ok(())
    }

    async fn replace_reward_references(
        &self,
        drop_id: &str,
        references: &[RewardDefinition],
    ) -> Result<(), AppError> {
        if self.fail_replace_references.load(Ordering::Relaxed) {
            return Err(AppError::Database(
                "reference relation write failed (injected)".to_string(),
            ));
        }
        self.reward_refs
            .lock()
            .unwrap()
            .insert(drop_id.to_string(), references.to_vec());
        Ok(())
    }

    async fn update_sent_flags(&self, drops: &[DropRecord]) -> Result<(), AppError> {
        self.upsert_drops(drops).await
    }

    async fn find_rewards_by_code(&self, code: &str) -> Result<Vec<RewardDefinition>, AppError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .filter(|def| def.waypoint_id == code)
            .cloned()
            .collect())
    }

    async fn find_rewards_by_name(&self, name: &str) -> Result<Vec<RewardDefinition>, AppError> {
        let needle = name.to_lowercase();
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .filter(|def| {
                let title = def.title.to_lowercase();
                title.contains(&needle) || needle.contains(&title)
            })
            .cloned()
            .collect())
    }
}
