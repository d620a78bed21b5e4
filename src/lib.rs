// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Waypoint-Drops: Twitch Drops tracking for the Halo community site
//!
//! This crate provides the backend job that reconciles the upstream Twitch
//! drops feed against the persisted drop catalog and announces campaigns
//! on Twitter, Discord and push.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::DropsRefreshService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub refresh_service: DropsRefreshService,
    /// Run-level single-flight guard: overlapping refresh triggers are
    /// skipped, not queued.
    pub refresh_lock: tokio::sync::Mutex<()>,
}
