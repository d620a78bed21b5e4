// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: recording channel fakes, a canned feed, and a
//! fully-faked refresh service over the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use waypoint_drops::db::InMemoryDropStore;
use waypoint_drops::error::AppError;
use waypoint_drops::models::RewardDefinition;
use waypoint_drops::services::feed::{
    DropsFeed, RawBenefit, RawBenefitEdge, RawCampaign, RawGame, RawTimeBasedDrop,
};
use waypoint_drops::services::push::{PushChannel, PushNotification};
use waypoint_drops::services::{
    ChatChannel, DropsRefreshService, OperatorNotifier, ThreadChannel,
};

/// 24 characters: matches the composer's link reservation exactly.
#[allow(dead_code)]
pub const TEST_LINK: &str = "https://t.co/abcde123456";

/// Fixed "now" for deterministic runs.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn days(n: i64) -> Duration {
    Duration::days(n)
}

// ─── Channel fakes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub text: String,
    pub reply_to: Option<String>,
    pub media_ids: Vec<String>,
}

/// Recording Twitter fake. Can be made to fail globally or only for posts
/// containing a given substring (per-drop failure injection).
#[derive(Default)]
pub struct FakeTwitter {
    pub posts: Mutex<Vec<RecordedPost>>,
    pub uploads: Mutex<Vec<String>>,
    counter: AtomicU32,
    fail: AtomicBool,
    fail_contains: Mutex<Option<String>>,
}

impl FakeTwitter {
    #[allow(dead_code)]
    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub fn set_fail_contains(&self, needle: Option<&str>) {
        *self.fail_contains.lock().unwrap() = needle.map(String::from);
    }
}

#[async_trait]
impl ThreadChannel for FakeTwitter {
    async fn upload_image(&self, image_url: &str) -> Result<String, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(AppError::Channel("twitter down (injected)".to_string()));
        }
        self.uploads.lock().unwrap().push(image_url.to_string());
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(format!("media-{}", n))
    }

    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_ids: &[String],
    ) -> Result<String, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(AppError::Channel("twitter down (injected)".to_string()));
        }
        if let Some(needle) = self.fail_contains.lock().unwrap().as_deref() {
            if text.contains(needle) {
                return Err(AppError::Channel(format!(
                    "twitter rejected post containing {:?} (injected)",
                    needle
                )));
            }
        }
        self.posts.lock().unwrap().push(RecordedPost {
            text: text.to_string(),
            reply_to: reply_to.map(String::from),
            media_ids: media_ids.to_vec(),
        });
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(format!("post-{}", n))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub channel_key: String,
    pub text: String,
    pub mention_role: bool,
}

#[derive(Default)]
pub struct FakeChat {
    pub messages: Mutex<Vec<RecordedChat>>,
    fail: AtomicBool,
}

impl FakeChat {
    #[allow(dead_code)]
    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl ChatChannel for FakeChat {
    async fn send(&self, channel_key: &str, text: &str, mention_role: bool) -> Result<(), AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(AppError::Channel("discord down (injected)".to_string()));
        }
        self.messages.lock().unwrap().push(RecordedChat {
            channel_key: channel_key.to_string(),
            text: text.to_string(),
            mention_role,
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePush {
    pub sent: Mutex<Vec<PushNotification>>,
    fail: AtomicBool,
}

impl FakePush {
    #[allow(dead_code)]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl PushChannel for FakePush {
    async fn send(&self, notification: &PushNotification) -> Result<(), AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(AppError::Channel("push down (injected)".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAlerts {
    pub alerts: Mutex<Vec<(String, String)>>,
}

impl FakeAlerts {
    #[allow(dead_code)]
    pub fn titles(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    #[allow(dead_code)]
    pub fn has_title(&self, title: &str) -> bool {
        self.alerts.lock().unwrap().iter().any(|(t, _)| t == title)
    }
}

#[async_trait]
impl OperatorNotifier for FakeAlerts {
    async fn notify(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

/// Canned feed whose campaign list can be swapped between runs.
#[derive(Default)]
pub struct StaticFeed {
    campaigns: Mutex<Vec<RawCampaign>>,
    pub fetches: AtomicU32,
}

impl StaticFeed {
    #[allow(dead_code)]
    pub fn set_campaigns(&self, campaigns: Vec<RawCampaign>) {
        *self.campaigns.lock().unwrap() = campaigns;
    }

    #[allow(dead_code)]
    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DropsFeed for StaticFeed {
    async fn fetch_campaigns(&self) -> Result<Vec<RawCampaign>, AppError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.campaigns.lock().unwrap().clone())
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

/// Everything a pipeline test needs, with handles kept for assertions.
pub struct Harness {
    pub store: Arc<InMemoryDropStore>,
    pub feed: Arc<StaticFeed>,
    pub twitter: Arc<FakeTwitter>,
    pub chat: Arc<FakeChat>,
    pub push: Arc<FakePush>,
    pub alerts: Arc<FakeAlerts>,
    pub service: DropsRefreshService,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryDropStore::new());
    let feed = Arc::new(StaticFeed::default());
    let twitter = Arc::new(FakeTwitter::default());
    let chat = Arc::new(FakeChat::default());
    let push = Arc::new(FakePush::default());
    let alerts = Arc::new(FakeAlerts::default());

    let service = DropsRefreshService::new(
        feed.clone(),
        store.clone(),
        twitter.clone(),
        chat.clone(),
        push.clone(),
        alerts.clone(),
        TEST_LINK.to_string(),
        "Subscribed Users".to_string(),
    );

    Harness {
        store,
        feed,
        twitter,
        chat,
        push,
        alerts,
        service,
    }
}

/// Build a test app with fully faked dependencies (no GCP required).
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<waypoint_drops::AppState>, Arc<StaticFeed>) {
    use waypoint_drops::config::Config;
    use waypoint_drops::routes::create_router;
    use waypoint_drops::AppState;

    let h = harness();
    let feed = h.feed.clone();
    let state = Arc::new(AppState {
        config: Config::test_default(),
        refresh_service: h.service,
        refresh_lock: tokio::sync::Mutex::new(()),
    });

    (create_router(state.clone()), state, feed)
}

// ─── Builders ────────────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn definition(code: &str, title: &str, is_new: bool) -> RewardDefinition {
    RewardDefinition {
        waypoint_id: code.to_string(),
        title: title.to_string(),
        notification_text: title.to_string(),
        image_set: vec![format!("https://img.test/{}.png", code)],
        reward_is_new: is_new,
    }
}

#[allow(dead_code)]
pub fn tier(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    minutes: u32,
    rewards: &[(&str, &str)],
) -> RawTimeBasedDrop {
    RawTimeBasedDrop {
        id: format!("tier-{}", minutes),
        name: format!("Tier {}", minutes),
        start_at: Some(start),
        end_at: Some(end),
        required_minutes_watched: minutes,
        benefit_edges: rewards
            .iter()
            .map(|(name, code)| RawBenefitEdge {
                benefit: RawBenefit {
                    id: code.to_string(),
                    name: name.to_string(),
                },
            })
            .collect(),
    }
}

#[allow(dead_code)]
pub fn campaign(
    id: &str,
    name: &str,
    status: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    tiers: Vec<RawTimeBasedDrop>,
) -> RawCampaign {
    RawCampaign {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        start_at: Some(start),
        end_at: Some(end),
        game: Some(RawGame {
            id: "halo-infinite".to_string(),
            display_name: "Halo Infinite".to_string(),
        }),
        games: Vec::new(),
        allow: None,
        time_based_drops: tiers,
    }
}

/// Total outbound channel calls across all three channels.
#[allow(dead_code)]
pub fn total_channel_calls(h: &Harness) -> usize {
    h.twitter.post_count() + h.chat.message_count() + h.push.sent_count()
}
