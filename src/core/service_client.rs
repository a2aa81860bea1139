// src/core/service_client.rs
//! HTTP client for an OpenAI-compatible chat completions provider

use anyhow::{Context, Result};

use crate::app_log;
use crate::core::config_manager::AiSettings;
use crate::types::response::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ServiceClient {
    /// Create new service client with configuration
    pub fn new(base_url: String, api_key: String, model: String, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// Client for the configured provider, `None` when AI is not configured
    pub fn from_settings(settings: &AiSettings) -> Result<Option<Self>> {
        match (&settings.base_url, &settings.api_key) {
            (Some(base_url), Some(api_key)) => Ok(Some(Self::new(
                base_url.clone(),
                api_key.clone(),
                settings.model.clone(),
                settings.timeout_seconds,
            )?)),
            _ => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system + user exchange; returns the trimmed content of the first choice
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: 0.3,
        };

        let response: ChatCompletionResponse = self
            .post_json(CHAT_COMPLETIONS_ENDPOINT, &request)
            .await?;

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Provider returned no completion"))
    }

    /// Generic POST request with JSON
    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<R>
    where
        T: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        app_log!(debug, "Calling AI provider: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<R>()
                .await
                .context("Failed to parse JSON response")
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            app_log!(error, "AI provider error response: {}", error_text);
            anyhow::bail!("HTTP {} error: {}", status, error_text)
        }
    }
}
