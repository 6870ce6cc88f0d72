use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::{Method, Transport};
use crate::config::RedmineConfig;
use crate::error::{RedmineError, Result};

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// [`Transport`] backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
    config: RedmineConfig,
}

impl HttpTransport {
    pub fn new(config: RedmineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;
        Ok(Self { client, config })
    }

    fn url_for(&self, path: &str) -> Result<String> {
        let base = self.config.require_base_url()?;
        Ok(format!("{}{}", base, path))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url_for(path)?;
        let api_key = self.config.require_api_key()?;

        let mut req = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
        };
        req = req
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        }

        tracing::debug!(%method, %path, "redmine request");
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %path, "redmine request failed");
            return Err(RedmineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(json!({}));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&text)?)
    }
}
