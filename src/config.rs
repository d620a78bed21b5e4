//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by Cloud Run secret
//! bindings, so they are read once at startup and cached in memory.

use std::env;

/// Cloud Tasks queue that is allowed to invoke the /tasks endpoints.
pub const DROPS_QUEUE_NAME: &str = "drops-refresh";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Upstream Twitch drops feed endpoint
    pub drops_feed_url: String,
    /// Public drops page linked from every notification (pre-shortened)
    pub drops_page_url: String,
    /// Push audience segment to target
    pub push_audience: String,

    // --- Secrets (injected as env vars) ---
    /// Twitter API bearer token
    pub twitter_bearer_token: String,
    /// Discord webhook URL for the drops channel
    pub discord_webhook_url: String,
    /// Discord role ID to mention on live-drop announcements
    pub discord_mention_role: Option<String>,
    /// Push provider application ID
    pub push_app_id: String,
    /// Push provider REST API key
    pub push_api_key: String,
    /// Operator alert webhook (dashboard/mobile); optional
    pub operator_alert_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            drops_feed_url: env::var("DROPS_FEED_URL")
                .map_err(|_| ConfigError::Missing("DROPS_FEED_URL"))?,
            drops_page_url: env::var("DROPS_PAGE_URL")
                .unwrap_or_else(|_| "https://www.halowaypoint.com/drops".to_string()),
            push_audience: env::var("PUSH_AUDIENCE").unwrap_or_else(|_| "Subscribed Users".to_string()),

            twitter_bearer_token: env::var("TWITTER_BEARER_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TWITTER_BEARER_TOKEN"))?,
            discord_webhook_url: env::var("DISCORD_WEBHOOK_URL")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("DISCORD_WEBHOOK_URL"))?,
            discord_mention_role: env::var("DISCORD_MENTION_ROLE").ok(),
            push_app_id: env::var("PUSH_APP_ID")
                .map_err(|_| ConfigError::Missing("PUSH_APP_ID"))?,
            push_api_key: env::var("PUSH_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PUSH_API_KEY"))?,
            operator_alert_url: env::var("OPERATOR_ALERT_URL").ok(),
        })
    }

    /// Default config for offline tests only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            drops_feed_url: "http://localhost:9999/drops".to_string(),
            drops_page_url: "https://example.test/drops".to_string(),
            push_audience: "Subscribed Users".to_string(),
            twitter_bearer_token: "test_twitter_token".to_string(),
            discord_webhook_url: "http://localhost:9999/discord".to_string(),
            discord_mention_role: Some("1234567890".to_string()),
            push_app_id: "test_push_app".to_string(),
            push_api_key: "test_push_key".to_string(),
            operator_alert_url: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DROPS_FEED_URL", "http://feed.test/campaigns");
        env::set_var("TWITTER_BEARER_TOKEN", "tok");
        env::set_var("DISCORD_WEBHOOK_URL", "http://hook.test");
        env::set_var("PUSH_APP_ID", "app");
        env::set_var("PUSH_API_KEY", "key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.drops_feed_url, "http://feed.test/campaigns");
        assert_eq!(config.twitter_bearer_token, "tok");
        assert_eq!(config.port, 8080);
    }
}
