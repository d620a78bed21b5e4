// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod alerts;
pub mod compose;
pub mod discord;
pub mod feed;
pub mod notify;
pub mod push;
pub mod reconcile;
pub mod refresh;
pub mod rewards;
pub mod twitter;

pub use alerts::{OperatorAlerts, OperatorNotifier};
pub use discord::{ChatChannel, DiscordClient};
pub use feed::{DropsFeed, DropsFeedClient};
pub use notify::NotificationDispatcher;
pub use push::{PushChannel, PushClient};
pub use refresh::DropsRefreshService;
pub use twitter::{ThreadChannel, TwitterClient};
