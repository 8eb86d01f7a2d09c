//! HTTP record store implementation

use super::wire;
use crate::config::BackendConfig;
use crate::contract::RecordId;
use crate::domain::backend::{BackendError, Fields, Query, Record, RecordStore};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "X-Api-Key";
const SITE_KEY_HEADER: &str = "X-Site-Key";

/// Record store reached over HTTP with a fixed credential pair
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: Url,
    api_version: String,
    api_key: String,
    site_key: String,
}

impl HttpRecordStore {
    pub fn new(config: &BackendConfig, timeout: Duration) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid backend base_url '{}'", config.base_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_version: config.api_version.trim_matches('/').to_string(),
            api_key: config.api_key.clone(),
            site_key: config.site_key.clone(),
        })
    }

    fn endpoint(&self, entity: &str, action: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(&format!("{}/{}/{}", self.api_version, entity, action))
            .map_err(|e| BackendError::Transport(format!("invalid endpoint: {}", e)))
    }

    async fn post(&self, entity: &str, action: &str, body: Value) -> Result<Value, BackendError> {
        let url = self.endpoint(entity, action)?;
        tracing::debug!(%url, "Record store request");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(SITE_KEY_HEADER, &self.site_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let payload: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        if let Some(error) = wire::classify(status, &payload, &raw) {
            tracing::debug!(entity, action, status, error = %error, "Record store error");
            return Err(error);
        }
        if payload.is_null() {
            return Err(BackendError::Decode(format!(
                "response is not JSON: {}",
                raw.chars().take(200).collect::<String>()
            )));
        }
        Ok(payload)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn query(&self, query: &Query) -> Result<Vec<Record>, BackendError> {
        let payload = self
            .post(&query.entity, "get", wire::query_body(query))
            .await?;
        wire::records(payload)
    }

    async fn create(&self, entity: &str, fields: Fields) -> Result<RecordId, BackendError> {
        let payload = self.post(entity, "create", wire::create_body(fields)).await?;
        wire::created_id(payload)
    }
}
