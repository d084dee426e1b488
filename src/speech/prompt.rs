//! Text-to-speech prompts.
//!
//! [`PromptSpeaker::speak`] is fire-and-forget: playback runs on its own task
//! and [`PromptSpeaker::finished`] resolves once after it ends. Callers must
//! not speak again before the previous prompt finished.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Text-to-speech backend; `speak` resolves when playback has ended
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, locale: &str) -> Result<()>;

    /// Get synthesizer name for logging
    fn name(&self) -> &str;
}

/// Speaks prompts through a synthesizer in a fixed locale
pub struct PromptSpeaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    locale: String,
    pending: Option<oneshot::Receiver<()>>,
    task: Option<JoinHandle<()>>,
}

impl PromptSpeaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, locale: impl Into<String>) -> Self {
        Self {
            synthesizer,
            locale: locale.into(),
            pending: None,
            task: None,
        }
    }

    /// Start speaking `text`. Completion is observed through [`finished`](Self::finished).
    pub fn speak(&mut self, text: &str) {
        if self.pending.is_some() {
            warn!("Prompt started while another prompt is still playing");
        }

        let (done_tx, done_rx) = oneshot::channel();
        let synthesizer = Arc::clone(&self.synthesizer);
        let locale = self.locale.clone();
        let text = text.to_string();

        info!("Speaking prompt via {} ({} chars)", synthesizer.name(), text.chars().count());
        let task = tokio::spawn(async move {
            if let Err(e) = synthesizer.speak(&text, &locale).await {
                warn!("Prompt synthesis failed: {:#}", e);
            }
            let _ = done_tx.send(());
        });

        self.pending = Some(done_rx);
        self.task = Some(task);
    }

    pub fn is_speaking(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve once the in-flight prompt has ended.
    ///
    /// Never resolves while nothing is being spoken. Cancel safe.
    pub async fn finished(&mut self) {
        match self.pending.as_mut() {
            Some(done) => {
                let _ = done.await;
                self.pending = None;
                self.task = None;
            }
            None => std::future::pending().await,
        }
    }

    /// Mark the in-flight prompt as completed. Returns `false` if none was pending.
    pub fn acknowledge(&mut self) -> bool {
        self.task = None;
        self.pending.take().is_some()
    }

    /// Abort any in-flight prompt
    pub fn cancel(&mut self) {
        self.pending = None;
        if let Some(task) = self.task.take() {
            debug!("Cancelling prompt playback");
            task.abort();
        }
    }
}

/// Runs an external TTS program and waits for it to exit
///
/// Argument templates may contain `{text}`, `{locale}` (e.g. `ko-KR`) and
/// `{lang}` (e.g. `ko`).
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `espeak-ng -v <lang> <text>`
    pub fn espeak() -> Self {
        Self::new(
            "espeak-ng",
            vec!["-v".to_string(), "{lang}".to_string(), "{text}".to_string()],
        )
    }

    fn expand_args(&self, text: &str, locale: &str) -> Vec<String> {
        let lang = locale.split(['-', '_']).next().unwrap_or(locale).to_lowercase();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{locale}", locale)
                    .replace("{lang}", &lang)
                    .replace("{text}", text)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str, locale: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .args(self.expand_args(text, locale))
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}. Is it installed?", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Completes immediately without audio output
#[derive(Debug, Default, Clone)]
pub struct SilentSynthesizer;

#[async_trait::async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, text: &str, locale: &str) -> Result<()> {
        info!("[{}] {}", locale, text);
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}
