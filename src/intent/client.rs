//! Client for the backend intent classifier

use crate::config::VoiceConfig;
use crate::intent::types::{IntentResponse, VoiceCommandRequest};
use crate::{Result, VoiceError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

/// Turns a spoken command into an intent
#[async_trait]
pub trait IntentClient: Send + Sync {
    /// Classify a single command
    ///
    /// One request, no retries. Transport failures, non-success statuses
    /// and bodies that are not an intent are all errors.
    async fn classify(&self, command: &str) -> Result<IntentResponse>;
}

/// `POST /voice_command` over HTTP
pub struct HttpIntentClient {
    client: Client,
    url: String,
}

impl HttpIntentClient {
    /// Create a client for the endpoint in `config`
    pub fn new(config: &VoiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.command_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IntentClient for HttpIntentClient {
    async fn classify(&self, command: &str) -> Result<IntentResponse> {
        debug!("POST {} command={:?}", self.url, command);

        let response = self
            .client
            .post(&self.url)
            .json(&VoiceCommandRequest {
                command: command.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Server error: {}", status);
            error!("Server response text: {}", body);
            return Err(VoiceError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let intent: IntentResponse = serde_json::from_str(&body)
            .map_err(|e| VoiceError::InvalidResponse(e.to_string()))?;

        info!("Received action from backend: {}", intent.action);
        Ok(intent)
    }
}
