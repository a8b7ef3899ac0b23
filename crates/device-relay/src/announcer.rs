use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("call announcement failed: {0}")]
pub struct AnnounceError(pub String);

/// Native incoming-call presentation. One instance is constructed at
/// process start and handed to the relay; the relay never retries a
/// failed announcement.
#[async_trait]
pub trait CallAnnouncer: Send + Sync {
    async fn announce_incoming_call(
        &self,
        call_id: &str,
        handle: &str,
        has_video: bool,
    ) -> Result<(), AnnounceError>;
}
