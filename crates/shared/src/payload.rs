use crate::models::{CallInvite, Platform};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_CALLER_NAME: &str = "Unknown";
pub const DEFAULT_CALLER_HANDLE: &str = "000000";

const ANDROID_CALL_TYPE_TAG: &str = "voip_incoming";
const ANDROID_PRIORITY: &str = "high";
const APNS_PUSH_TYPE: &str = "voip";
const APNS_PRIORITY: &str = "10";
const APNS_VOIP_TOPIC_SUFFIX: &str = ".voip";
const APNS_ALERT_TITLE: &str = "Incoming Call";

/// A platform-shaped push message, ready to hand to the delivery
/// gateway. Built fresh per dispatch, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PushPayload {
    Android(AndroidPayload),
    Ios(ApnsPayload),
}

/// Data-only FCM message. No user-visible text; the client renders the
/// call screen itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidPayload {
    pub data: HashMap<String, String>,
    pub android: AndroidDeliveryHints,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidDeliveryHints {
    pub priority: String,
    /// Zero: deliver now or drop. A queued ring is worse than no ring.
    pub ttl: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsPayload {
    pub headers: ApnsHeaders,
    pub aps: Aps,
    #[serde(flatten)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsHeaders {
    #[serde(rename = "apns-push-type")]
    pub push_type: String,
    #[serde(rename = "apns-priority")]
    pub priority: String,
    #[serde(rename = "apns-topic")]
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aps {
    pub alert: ApsAlert,
    #[serde(rename = "content-available")]
    pub content_available: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApsAlert {
    pub title: String,
    pub body: String,
}

/// Builds the push message for one platform. Pure and total: missing
/// caller fields fall back to fixed placeholders, an absent video flag
/// means audio-only.
pub fn build(platform: Platform, invite: &CallInvite, app_bundle_id: &str) -> PushPayload {
    let name = invite
        .caller_name
        .clone()
        .unwrap_or_else(|| DEFAULT_CALLER_NAME.to_string());
    let handle = invite
        .caller_id
        .clone()
        .unwrap_or_else(|| DEFAULT_CALLER_HANDLE.to_string());

    match platform {
        Platform::Android => {
            let mut data = HashMap::new();
            data.insert("uuid".to_string(), invite.call_id.clone());
            data.insert("name".to_string(), name);
            data.insert("handle".to_string(), handle.clone());
            data.insert(
                "type".to_string(),
                if invite.has_video { "1" } else { "0" }.to_string(),
            );
            data.insert("userId".to_string(), handle);
            data.insert("callType".to_string(), ANDROID_CALL_TYPE_TAG.to_string());

            PushPayload::Android(AndroidPayload {
                data,
                android: AndroidDeliveryHints {
                    priority: ANDROID_PRIORITY.to_string(),
                    ttl: 0,
                },
            })
        }
        Platform::Ios => {
            let mut data = HashMap::new();
            data.insert("uuid".to_string(), invite.call_id.clone());
            data.insert("name".to_string(), name.clone());
            data.insert("handle".to_string(), handle);
            data.insert(
                "hasVideo".to_string(),
                if invite.has_video { "true" } else { "false" }.to_string(),
            );

            PushPayload::Ios(ApnsPayload {
                headers: ApnsHeaders {
                    push_type: APNS_PUSH_TYPE.to_string(),
                    priority: APNS_PRIORITY.to_string(),
                    topic: format!("{app_bundle_id}{APNS_VOIP_TOPIC_SUFFIX}"),
                },
                aps: Aps {
                    alert: ApsAlert {
                        title: APNS_ALERT_TITLE.to_string(),
                        body: format!("{name} is calling you"),
                    },
                    content_available: 1,
                },
                data,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = "com.example.voip_cross_platform";

    fn invite() -> CallInvite {
        CallInvite {
            call_id: "abc-123".to_string(),
            caller_name: Some("Alice".to_string()),
            caller_id: Some("u_alice".to_string()),
            callee_id: "u_bob".to_string(),
            has_video: true,
        }
    }

    #[test]
    fn android_payload_carries_video_flag_and_hints() {
        let PushPayload::Android(payload) = build(Platform::Android, &invite(), BUNDLE) else {
            panic!("expected android payload");
        };
        assert_eq!(payload.data["uuid"], "abc-123");
        assert_eq!(payload.data["name"], "Alice");
        assert_eq!(payload.data["handle"], "u_alice");
        assert_eq!(payload.data["type"], "1");
        assert_eq!(payload.data["callType"], "voip_incoming");
        assert_eq!(payload.android.priority, "high");
        assert_eq!(payload.android.ttl, 0);
    }

    #[test]
    fn ios_payload_carries_voip_headers_and_alert() {
        let PushPayload::Ios(payload) = build(Platform::Ios, &invite(), BUNDLE) else {
            panic!("expected ios payload");
        };
        assert_eq!(payload.headers.push_type, "voip");
        assert_eq!(payload.headers.priority, "10");
        assert_eq!(payload.headers.topic, "com.example.voip_cross_platform.voip");
        assert_eq!(payload.aps.alert.title, "Incoming Call");
        assert_eq!(payload.aps.alert.body, "Alice is calling you");
        assert_eq!(payload.aps.content_available, 1);
        assert_eq!(payload.data["hasVideo"], "true");
    }

    #[test]
    fn missing_caller_fields_fall_back_to_placeholders() {
        let invite = CallInvite {
            call_id: "abc-123".to_string(),
            caller_name: None,
            caller_id: None,
            callee_id: "u_bob".to_string(),
            has_video: false,
        };
        let PushPayload::Android(payload) = build(Platform::Android, &invite, BUNDLE) else {
            panic!("expected android payload");
        };
        assert_eq!(payload.data["name"], "Unknown");
        assert_eq!(payload.data["handle"], "000000");
        assert_eq!(payload.data["type"], "0");

        let PushPayload::Ios(payload) = build(Platform::Ios, &invite, BUNDLE) else {
            panic!("expected ios payload");
        };
        assert_eq!(payload.aps.alert.body, "Unknown is calling you");
        assert_eq!(payload.data["hasVideo"], "false");
    }

    #[test]
    fn builder_is_deterministic() {
        assert_eq!(
            build(Platform::Android, &invite(), BUNDLE),
            build(Platform::Android, &invite(), BUNDLE)
        );
        assert_eq!(
            build(Platform::Ios, &invite(), BUNDLE),
            build(Platform::Ios, &invite(), BUNDLE)
        );
    }

    #[test]
    fn ios_payload_serializes_with_apns_field_names() {
        let payload = build(Platform::Ios, &invite(), BUNDLE);
        let json = serde_json::to_value(&payload).expect("payload serializes");
        assert_eq!(json["headers"]["apns-push-type"], "voip");
        assert_eq!(json["headers"]["apns-topic"], "com.example.voip_cross_platform.voip");
        assert_eq!(json["aps"]["content-available"], 1);
        // custom fields are flattened next to aps
        assert_eq!(json["uuid"], "abc-123");
        assert_eq!(json["hasVideo"], "true");
    }
}
