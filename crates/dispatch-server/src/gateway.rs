use async_trait::async_trait;
use serde::Serialize;
use shared::models::Platform;
use shared::payload::PushPayload;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("gateway rejected push: status {status}")]
    Rejected { status: u16 },
}

/// Opaque push transport. Accepts a built payload plus a routing token
/// and reports success or failure for that one send.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(
        &self,
        platform: Platform,
        token: &str,
        payload: &PushPayload,
    ) -> Result<(), SendError>;
}

pub struct HttpPushGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SendBody<'a> {
    platform: Platform,
    token: &'a str,
    message: &'a PushPayload,
}

impl HttpPushGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        send_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(send_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(
        &self,
        platform: Platform,
        token: &str,
        payload: &PushPayload,
    ) -> Result<(), SendError> {
        let body = SendBody {
            platform,
            token,
            message: payload,
        };
        let mut request = self
            .client
            .post(format!("{}/v1/send", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SendError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
