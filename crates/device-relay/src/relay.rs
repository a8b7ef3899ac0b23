use crate::announcer::CallAnnouncer;
use serde_json::Value;
use shared::payload::{DEFAULT_CALLER_HANDLE, DEFAULT_CALLER_NAME};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

/// Events forwarded to the application layer.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// New platform voice token; to be persisted upstream into the
    /// token directory.
    VoipTokenUpdated { token: String },
    /// Raw decoded push fields for any additional UI handling.
    PushReceived { fields: Value },
}

/// Decoded incoming voip push. Converted straight into a call
/// announcement; not retained beyond the relay call.
#[derive(Debug, Clone)]
pub struct IncomingPush {
    pub call_id: String,
    pub caller_name: String,
    pub handle: String,
    pub has_video: bool,
    pub raw: Value,
}

impl IncomingPush {
    /// Total decode: a push with a missing or malformed call id gets a
    /// fresh random one — announcing with a best-effort id beats
    /// dropping the call.
    pub fn decode(raw: Value) -> Self {
        let field = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let call_id = field("uuid").unwrap_or_else(|| Uuid::new_v4().to_string());
        let caller_name = field("name").unwrap_or_else(|| DEFAULT_CALLER_NAME.to_string());
        let handle = field("handle").unwrap_or_else(|| DEFAULT_CALLER_HANDLE.to_string());

        // iOS payloads carry `hasVideo` ("true"/"false"), Android data
        // messages carry `type` ("0"/"1").
        let has_video = match raw.get("hasVideo") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(raw_flag)) => raw_flag == "true" || raw_flag == "1",
            _ => raw
                .get("type")
                .and_then(Value::as_str)
                .map(|raw_flag| raw_flag == "1")
                .unwrap_or(false),
        };

        Self {
            call_id,
            caller_name,
            handle,
            has_video,
            raw,
        }
    }
}

/// One-shot acknowledgement back to the OS push machinery. Consuming
/// `signal` makes firing twice impossible.
#[derive(Debug)]
pub struct OsCompletion(oneshot::Sender<()>);

impl OsCompletion {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    pub fn signal(self) {
        let _ = self.0.send(());
    }
}

/// Receiving-device half of the push pipeline: decodes an inbound
/// payload, announces the call, forwards the fields to the
/// application layer and acknowledges the OS.
pub struct PushRelay {
    announcer: Arc<dyn CallAnnouncer>,
    events: mpsc::UnboundedSender<RelayEvent>,
}

impl PushRelay {
    pub fn new(announcer: Arc<dyn CallAnnouncer>, events: mpsc::UnboundedSender<RelayEvent>) -> Self {
        Self { announcer, events }
    }

    /// Entry point for the OS push-delivery callback. The completion
    /// signal fires on every path, announcement failure included.
    pub async fn on_push_received(&self, raw: Value, completion: OsCompletion) {
        let push = IncomingPush::decode(raw);
        info!(call_id = %push.call_id, caller = %push.caller_name, "incoming voip push");

        // Announce first: the platform penalizes late acknowledgement
        // of a voip push.
        if let Err(err) = self
            .announcer
            .announce_incoming_call(&push.call_id, &push.caller_name, push.has_video)
            .await
        {
            warn!(call_id = %push.call_id, error = %err, "call announcement failed");
        }

        let _ = self.events.send(RelayEvent::PushReceived {
            fields: push.raw.clone(),
        });
        completion.signal();
    }

    /// Called when the OS hands out fresh voip push credentials.
    pub fn on_voip_token_updated(&self, credential: &[u8]) {
        let token = hex::encode(credential);
        info!(token = %token, "voip push credential updated");
        let _ = self.events.send(RelayEvent::VoipTokenUpdated { token });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcer::AnnounceError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAnnouncer {
        announced: Mutex<Vec<(String, String, bool)>>,
        fail: bool,
    }

    impl RecordingAnnouncer {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl CallAnnouncer for RecordingAnnouncer {
        async fn announce_incoming_call(
            &self,
            call_id: &str,
            handle: &str,
            has_video: bool,
        ) -> Result<(), AnnounceError> {
            self.announced
                .lock()
                .unwrap()
                .push((call_id.to_string(), handle.to_string(), has_video));
            if self.fail {
                return Err(AnnounceError("provider unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn relay(
        announcer: Arc<RecordingAnnouncer>,
    ) -> (PushRelay, mpsc::UnboundedReceiver<RelayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PushRelay::new(announcer, tx), rx)
    }

    #[tokio::test]
    async fn push_is_announced_then_forwarded_then_acknowledged() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let (relay, mut events) = relay(announcer.clone());
        let (completion, completed) = OsCompletion::new();

        relay
            .on_push_received(
                json!({ "uuid": "abc-123", "name": "Alice", "handle": "u_alice", "hasVideo": "true" }),
                completion,
            )
            .await;

        let announced = announcer.announced.lock().unwrap().clone();
        assert_eq!(
            announced,
            vec![("abc-123".to_string(), "Alice".to_string(), true)]
        );

        match events.try_recv().unwrap() {
            RelayEvent::PushReceived { fields } => assert_eq!(fields["uuid"], "abc-123"),
            other => panic!("unexpected event: {other:?}"),
        }
        completed.await.expect("completion signaled");
    }

    #[tokio::test]
    async fn completion_fires_even_when_the_announcer_fails() {
        let announcer = Arc::new(RecordingAnnouncer::failing());
        let (relay, mut events) = relay(announcer.clone());
        let (completion, completed) = OsCompletion::new();

        relay
            .on_push_received(json!({ "uuid": "abc-123", "name": "Alice" }), completion)
            .await;

        assert_eq!(announcer.announced.lock().unwrap().len(), 1);
        // the event still reaches the application layer
        assert!(matches!(
            events.try_recv().unwrap(),
            RelayEvent::PushReceived { .. }
        ));
        completed.await.expect("completion signaled");
    }

    #[tokio::test]
    async fn malformed_push_gets_a_synthesized_call_id() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let (relay, _events) = relay(announcer.clone());
        let (completion, completed) = OsCompletion::new();

        relay.on_push_received(json!({ "uuid": "" }), completion).await;

        let announced = announcer.announced.lock().unwrap().clone();
        assert_eq!(announced.len(), 1);
        assert!(!announced[0].0.is_empty());
        assert_eq!(announced[0].1, "Unknown");
        assert!(!announced[0].2);
        completed.await.expect("completion signaled");
    }

    #[test]
    fn decode_accepts_the_android_data_shape() {
        let push = IncomingPush::decode(json!({
            "uuid": "abc-123",
            "name": "Alice",
            "handle": "u_alice",
            "type": "1",
            "callType": "voip_incoming"
        }));
        assert_eq!(push.call_id, "abc-123");
        assert!(push.has_video);

        let audio = IncomingPush::decode(json!({ "uuid": "abc-123", "type": "0" }));
        assert!(!audio.has_video);
    }

    #[tokio::test]
    async fn credential_update_emits_a_hex_token() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let (relay, mut events) = relay(announcer);

        relay.on_voip_token_updated(&[0xab, 0x01, 0xff]);

        match events.try_recv().unwrap() {
            RelayEvent::VoipTokenUpdated { token } => assert_eq!(token, "ab01ff"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
