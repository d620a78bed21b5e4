// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Waypoint-Drops API Server
//!
//! Keeps the Twitch Drops catalog of the Halo community site in sync with
//! the upstream feed and fans announcements out to Twitter, Discord and
//! push subscribers.

use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypoint_drops::{
    config::Config,
    db::FirestoreDb,
    services::{
        notify::DISCORD_DROPS_CHANNEL, DiscordClient, DropsFeedClient, DropsRefreshService,
        OperatorAlerts, PushClient, TwitterClient,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Waypoint-Drops API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Outbound channel clients
    let feed = DropsFeedClient::new(config.drops_feed_url.clone());
    let twitter = TwitterClient::new(config.twitter_bearer_token.clone());
    let discord = DiscordClient::new(
        HashMap::from([(
            DISCORD_DROPS_CHANNEL.to_string(),
            config.discord_webhook_url.clone(),
        )]),
        config.discord_mention_role.clone(),
    );
    let push = PushClient::new(config.push_app_id.clone(), config.push_api_key.clone());
    let alerts = OperatorAlerts::new(config.operator_alert_url.clone());
    tracing::info!("Notification channels initialized");

    let refresh_service = DropsRefreshService::new(
        Arc::new(feed),
        Arc::new(db),
        Arc::new(twitter),
        Arc::new(discord),
        Arc::new(push),
        Arc::new(alerts),
        config.drops_page_url.clone(),
        config.push_audience.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        refresh_service,
        refresh_lock: tokio::sync::Mutex::new(()),
    });

    // Build router
    let app = waypoint_drops::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("waypoint_drops=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
