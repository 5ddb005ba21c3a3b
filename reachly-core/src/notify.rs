use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
    pub media_url: Option<String>,
}

/// Outcome of a notification attempt. Failures carry the reason for
/// logging; they are never raised across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Failed { reason: String },
}

impl NotifyOutcome {
    pub fn sent(&self) -> bool {
        matches!(self, NotifyOutcome::Sent)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &SmsMessage) -> NotifyOutcome;
}
