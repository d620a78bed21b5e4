// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod drop;
pub mod reward;

pub use drop::{ChannelRef, DropField, DropRecord, DropStatus, RawReward, RewardGroup};
pub use reward::RewardDefinition;
