//! In-memory provider that captures messages instead of delivering them.

use super::EmailProvider;
use crate::error::{MailerError, MailerResult};
use crate::models::{OutgoingMessage, SentEmail};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Spy provider for tests and dry runs.
#[derive(Clone)]
pub struct RecordingProvider {
    name: &'static str,
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    failure: Option<String>,
    ready: bool,
    connected: bool,
}

impl RecordingProvider {
    /// A provider that accepts every message.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sent: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            ready: true,
            connected: true,
        }
    }

    /// A provider that rejects every message with `message`.
    pub fn failing(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            connected: false,
            ..Self::new(name)
        }
    }

    /// A provider the chain will skip.
    pub fn not_ready(name: &'static str) -> Self {
        Self {
            ready: false,
            ..Self::new(name)
        }
    }

    /// Override what `verify_connection` reports.
    pub fn with_connection(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// All captured messages, oldest first.
    pub async fn sent_messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent.lock().await.iter().any(|m| m.to() == email)
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl EmailProvider for RecordingProvider {
    async fn send(&self, message: &OutgoingMessage) -> MailerResult<SentEmail> {
        if let Some(failure) = &self.failure {
            return Err(MailerError::ProviderRejected {
                provider: self.name,
                status: 500,
                message: failure.clone(),
            });
        }

        let mut sent = self.sent.lock().await;
        sent.push(message.clone());

        Ok(SentEmail {
            provider: self.name,
            message_id: Some(format!("{}-{}", self.name.to_ascii_lowercase(), sent.len())),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn verify_connection(&self) -> MailerResult<bool> {
        if let Some(failure) = &self.failure {
            return Err(MailerError::NetworkFailure(failure.clone()));
        }
        Ok(self.connected)
    }
}
