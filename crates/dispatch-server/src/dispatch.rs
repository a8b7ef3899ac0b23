use crate::directory::TokenDirectory;
use crate::gateway::PushGateway;
use futures_util::future;
use shared::models::{CallInvite, CallRequest, Platform, SendOutcome};
use shared::payload;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing calleeId or uuid")]
    InvalidRequest,
    #[error("user not found")]
    UserNotFound,
    #[error("token directory error: {0}")]
    Directory(#[from] anyhow::Error),
}

/// Aggregated result of one dispatch. An empty outcome map means the
/// callee exists but had no registered device; the caller decides what
/// that means for the call.
#[derive(Debug, Default)]
pub struct DispatchResult {
    pub outcomes: HashMap<Platform, SendOutcome>,
}

/// Orchestrates token lookup, payload build and the concurrent sends
/// for one call invite. Send failures never abort the sibling send;
/// they land in the aggregated result instead.
pub struct DispatchService {
    directory: Arc<dyn TokenDirectory>,
    gateway: Arc<dyn PushGateway>,
    app_bundle_id: String,
}

impl DispatchService {
    pub fn new(
        directory: Arc<dyn TokenDirectory>,
        gateway: Arc<dyn PushGateway>,
        app_bundle_id: String,
    ) -> Self {
        Self {
            directory,
            gateway,
            app_bundle_id,
        }
    }

    pub async fn dispatch(&self, request: &CallRequest) -> Result<DispatchResult, DispatchError> {
        let invite = validate(request)?;

        let tokens = self
            .directory
            .lookup(&invite.callee_id)
            .await
            .map_err(DispatchError::Directory)?
            .ok_or(DispatchError::UserNotFound)?;

        let mut sends = Vec::new();
        if let Some(token) = tokens.messaging_token.as_deref() {
            sends.push(self.send_one(Platform::Android, token, &invite));
        }
        if let Some(token) = tokens.voice_token.as_deref() {
            sends.push(self.send_one(Platform::Ios, token, &invite));
        }

        // All sends settle before we return; no fire-and-forget.
        let settled = future::join_all(sends).await;
        let outcomes = settled.into_iter().collect();
        Ok(DispatchResult { outcomes })
    }

    async fn send_one(
        &self,
        platform: Platform,
        token: &str,
        invite: &CallInvite,
    ) -> (Platform, SendOutcome) {
        info!(user = %invite.callee_id, platform = %platform, "sending call push");
        let message = payload::build(platform, invite, &self.app_bundle_id);
        match self.gateway.send(platform, token, &message).await {
            Ok(()) => (platform, SendOutcome::Sent),
            Err(err) => {
                warn!(user = %invite.callee_id, platform = %platform, error = %err, "push send failed");
                (
                    platform,
                    SendOutcome::Failed {
                        reason: err.to_string(),
                    },
                )
            }
        }
    }
}

fn validate(request: &CallRequest) -> Result<CallInvite, DispatchError> {
    let callee_id = request
        .callee_id
        .as_deref()
        .filter(|raw| !raw.trim().is_empty());
    let call_id = request.uuid.as_deref().filter(|raw| !raw.trim().is_empty());

    match (callee_id, call_id) {
        (Some(callee_id), Some(call_id)) => Ok(CallInvite {
            call_id: call_id.to_string(),
            caller_name: request.caller_name.clone(),
            caller_id: request.caller_id.clone(),
            callee_id: callee_id.to_string(),
            has_video: request.has_video.unwrap_or(false),
        }),
        _ => Err(DispatchError::InvalidRequest),
    }
}
