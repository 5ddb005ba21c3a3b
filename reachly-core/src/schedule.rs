use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// Deferred-job collaborator for the post-verification re-check. The
/// eventual callback must tolerate the offer no longer existing or no
/// longer being pending.
#[async_trait]
pub trait RecheckScheduler: Send + Sync {
    async fn schedule(&self, offer_id: Uuid, delay: Duration);
}
