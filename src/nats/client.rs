use anyhow::{Context, Result};
use async_nats::Client;
use tracing::info;

use super::messages::{ControlAction, RecognitionControlMessage};

/// Subject prefix the STT service publishes transcripts on
/// (`stt.text.partial` / `stt.text.final`)
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ask the STT service to start or stop streaming for this session
    pub async fn publish_control(&self, action: ControlAction, locale: &str) -> Result<()> {
        let subject = format!("stt.control.{}", self.session_id);

        let message = RecognitionControlMessage {
            session_id: self.session_id.clone(),
            action,
            locale: locale.to_string(),
            continuous: true,
            interim_results: true,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish recognition control")?;

        info!("Published {:?} to {} (locale={})", action, subject, locale);

        Ok(())
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // Partial and final transcripts for every session arrive here;
        // callers filter by session_id in the payload
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }
}
