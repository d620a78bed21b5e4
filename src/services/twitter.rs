// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Twitter (thread-style) posting client.
//!
//! Handles:
//! - Posting tweets, threaded via reply IDs
//! - Media upload (fetch image, base64-encode, upload for a media ID)

use crate::error::AppError;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

/// Threaded short-message channel with image attachments.
#[async_trait]
pub trait ThreadChannel: Send + Sync {
    /// Upload one image by URL; returns the media ID to attach.
    async fn upload_image(&self, image_url: &str) -> Result<String, AppError>;

    /// Create a post, optionally as a reply, with up to four media IDs.
    /// Returns the new post's ID for threading.
    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_ids: &[String],
    ) -> Result<String, AppError>;
}

/// Twitter API client.
#[derive(Clone)]
pub struct TwitterClient {
    http: reqwest::Client,
    api_base: String,
    upload_base: String,
    bearer_token: String,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: "https://api.twitter.com/2".to_string(),
            upload_base: "https://upload.twitter.com/1.1".to_string(),
            bearer_token,
        }
    }

    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Twitter rate limit hit (429)");
        }
        Err(AppError::Channel(format!("Twitter HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl ThreadChannel for TwitterClient {
    async fn upload_image(&self, image_url: &str) -> Result<String, AppError> {
        // Fetch the image bytes first; the upload endpoint takes base64.
        let image = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(|e| AppError::Channel(format!("Image fetch failed: {}", e)))?;

        if !image.status().is_success() {
            return Err(AppError::Channel(format!(
                "Image fetch HTTP {}: {}",
                image.status(),
                image_url
            )));
        }

        let bytes = image
            .bytes()
            .await
            .map_err(|e| AppError::Channel(format!("Image read failed: {}", e)))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let response = self
            .http
            .post(format!("{}/media/upload.json", self.upload_base))
            .bearer_auth(&self.bearer_token)
            .form(&[("media_data", encoded.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Channel(format!("Media upload failed: {}", e)))?;

        let response = self.check_response(response).await?;
        let upload: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Channel(format!("Media upload parse error: {}", e)))?;

        Ok(upload.media_id_string)
    }

    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_ids: &[String],
    ) -> Result<String, AppError> {
        let mut payload = json!({ "text": text });
        if let Some(id) = reply_to {
            payload["reply"] = json!({ "in_reply_to_tweet_id": id });
        }
        if !media_ids.is_empty() {
            payload["media"] = json!({ "media_ids": media_ids });
        }

        let response = self
            .http
            .post(format!("{}/tweets", self.api_base))
            .bearer_auth(&self.bearer_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Channel(format!("Tweet create failed: {}", e)))?;

        let response = self.check_response(response).await?;
        let created: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| AppError::Channel(format!("Tweet create parse error: {}", e)))?;

        tracing::info!(tweet_id = %created.data.id, "Tweet posted");
        Ok(created.data.id)
    }
}
