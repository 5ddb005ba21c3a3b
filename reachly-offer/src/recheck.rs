use crate::lifecycle::OfferService;
use async_trait::async_trait;
use reachly_core::schedule::RecheckScheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct RecheckJob {
    pub offer_id: Uuid,
    pub delay: Duration,
}

/// In-process scheduler handing re-check jobs to the worker over a
/// channel.
pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<RecheckJob>,
}

impl ChannelScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RecheckJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RecheckScheduler for ChannelScheduler {
    async fn schedule(&self, offer_id: Uuid, delay: Duration) {
        if self.tx.send(RecheckJob { offer_id, delay }).is_err() {
            warn!(%offer_id, "recheck worker gone, job dropped");
        }
    }
}

/// Worker loop draining scheduled re-checks. Each job sleeps out its delay
/// on its own task; the service tolerates offers that vanished or moved on
/// in the meantime.
pub async fn run_recheck_worker(
    mut rx: mpsc::UnboundedReceiver<RecheckJob>,
    service: Arc<OfferService>,
) {
    info!("recheck worker started");
    while let Some(job) = rx.recv().await {
        let service = service.clone();
        tokio::spawn(async move {
            tokio::time::sleep(job.delay).await;
            if let Err(e) = service.recheck(job.offer_id).await {
                error!(offer_id = %job.offer_id, error = %e, "recheck failed");
            }
        });
    }
    info!("recheck worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scheduler_hands_jobs_to_the_channel() {
        let (scheduler, mut rx) = ChannelScheduler::new();
        let offer_id = Uuid::new_v4();

        scheduler
            .schedule(offer_id, Duration::from_secs(86_400))
            .await;

        let job = rx.recv().await.expect("job queued");
        assert_eq!(job.offer_id, offer_id);
        assert_eq!(job.delay, Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn scheduling_after_worker_shutdown_is_harmless() {
        let (scheduler, rx) = ChannelScheduler::new();
        drop(rx);
        scheduler.schedule(Uuid::new_v4(), Duration::ZERO).await;
    }
}
