//! Video platform client (Mux direct uploads and assets).

use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct DirectUpload {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadStatus {
    pub id: String,
    /// `waiting`, `asset_created`, `errored`, ...
    pub status: String,
    #[serde(default)]
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    #[serde(default)]
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    #[serde(default)]
    pub passthrough: Option<String>,
}

impl Asset {
    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some("ready")
    }

    /// Public playback id if there is one, else the first one.
    pub fn playback_id(&self) -> Option<&str> {
        self.playback_ids
            .iter()
            .find(|p| p.policy.as_deref() == Some("public"))
            .or_else(|| self.playback_ids.first())
            .map(|p| p.id.as_str())
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct MuxClient {
    http: reqwest::Client,
    base_url: String,
    token_id: String,
    token_secret: String,
}

impl MuxClient {
    pub fn new(
        base_url: &str,
        token_id: &str,
        token_secret: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            token_secret: token_secret.to_string(),
        })
    }

    /// Create a direct upload whose asset carries the lesson id as passthrough.
    pub async fn create_upload(&self, lesson_id: Uuid, cors_origin: &str) -> Result<DirectUpload, ApiError> {
        let body = json!({
            "cors_origin": cors_origin,
            "new_asset_settings": {
                "playback_policy": ["public"],
                "passthrough": lesson_id.to_string(),
            }
        });

        let request = self
            .http
            .post(format!("{}/video/v1/uploads", self.base_url))
            .json(&body);
        self.send(request).await
    }

    pub async fn get_upload(&self, upload_id: &str) -> Result<UploadStatus, ApiError> {
        let request = self
            .http
            .get(format!("{}/video/v1/uploads/{}", self.base_url, upload_id));
        self.send(request).await
    }

    pub async fn get_asset(&self, asset_id: &str) -> Result<Asset, ApiError> {
        let request = self
            .http
            .get(format!("{}/video/v1/assets/{}", self.base_url, asset_id));
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let envelope: Envelope<T> = request
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(format!("Video platform request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ApiError::ExternalService(format!("Video platform request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::ExternalService(format!("Invalid video platform response: {e}")))?;

        Ok(envelope.data)
    }
}
