use anyhow::{Context, Result};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::recognition::{RecognitionEngine, RecognitionEvent, RecognitionSegment};
use crate::nats::{ControlAction, NatsClient, TranscriptMessage};

/// Recognition engine fed by a remote STT service over NATS
///
/// The service publishes partial and final transcripts keyed by session id.
/// When the subscription ends the event stream is dropped, which the capture
/// channel treats as an unsolicited termination.
pub struct NatsRecognizer {
    url: String,
    session_id: String,
    locale: String,
    client: Option<Arc<NatsClient>>,
    task: Option<JoinHandle<()>>,
}

impl NatsRecognizer {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            locale: locale.into(),
            client: None,
            task: None,
        }
    }

    async fn client(&mut self) -> Result<Arc<NatsClient>> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(NatsClient::connect(&self.url, self.session_id.clone()).await?);
        self.client = Some(Arc::clone(&client));
        Ok(client)
    }
}

/// Map a transcript message to a stream event, if it belongs to `session_id`
pub fn transcript_event(message: TranscriptMessage, session_id: &str) -> Option<RecognitionEvent> {
    if message.session_id != session_id {
        return None;
    }
    if let Some(error) = message.error {
        return Some(RecognitionEvent::Error(error));
    }
    let segment = RecognitionSegment {
        text: message.text,
        is_final: !message.partial,
    };
    Some(RecognitionEvent::Results(vec![segment]))
}

#[async_trait::async_trait]
impl RecognitionEngine for NatsRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let client = self.client().await?;
        let mut subscriber = client
            .subscribe_transcripts()
            .await
            .context("Failed to start transcript stream")?;
        client.publish_control(ControlAction::Start, &self.locale).await?;

        let (tx, rx) = mpsc::channel(100);
        let session_id = self.session_id.clone();

        self.task = Some(tokio::spawn(async move {
            info!("Transcript receiving task started");

            while let Some(msg) = subscriber.next().await {
                let event = match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => transcript_event(transcript, &session_id),
                    Err(e) => Some(RecognitionEvent::Error(format!(
                        "Failed to parse transcript message: {}",
                        e
                    ))),
                };

                if let Some(event) = event {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            }

            info!("Transcript receiving task stopped");
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(client) = &self.client {
            if let Err(e) = client.publish_control(ControlAction::Stop, &self.locale).await {
                warn!("Failed to publish stop control: {}", e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
