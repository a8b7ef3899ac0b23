use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Inbound body for `POST /call`. All fields are optional at the wire
/// level; the dispatch service decides what is actually required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub callee_id: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub has_video: Option<bool>,
}

/// A validated call invite. Constructed once from a [`CallRequest`] and
/// consumed by a single dispatch; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CallInvite {
    pub call_id: String,
    pub caller_name: Option<String>,
    pub caller_id: Option<String>,
    pub callee_id: String,
    pub has_video: bool,
}

/// Push delivery targets for one user. Both tokens absent is a valid
/// (but unreachable) state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_token: Option<String>,
}

impl DeviceTokens {
    pub fn is_empty(&self) -> bool {
        self.messaging_token.is_none() && self.voice_token.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform result of one push send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendOutcome {
    Sent,
    Failed { reason: String },
}

/// Response body for `POST /call`. `outcomes` may be empty when the
/// callee exists but has no registered device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    pub success: bool,
    pub outcomes: HashMap<Platform, SendOutcome>,
}

/// Upsert body for `POST /tokens`. Absent fields leave the stored
/// token of that kind untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRegisterRequest {
    pub user_id: String,
    #[serde(default)]
    pub messaging_token: Option<String>,
    #[serde(default)]
    pub voice_token: Option<String>,
}
