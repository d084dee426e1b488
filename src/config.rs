use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;

/// Environment variable prefix, e.g. `MOCK_INTERVIEW__SESSION__LOCALE=en-US`
pub const ENV_PREFIX: &str = "MOCK_INTERVIEW";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub session: SessionSettings,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Interview backend (question bank + history)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub planning_seconds: u64,
    pub locale: String,
    pub answer_placeholder: String,
    /// Offset used to display history timestamps (stored as UTC)
    pub display_utc_offset_hours: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    Nats,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerKind {
    Command,
    Silent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub recognizer: RecognizerKind,
    pub nats_url: String,
    pub synthesizer: SynthesizerKind,
    pub tts_program: String,
    pub tts_args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            recognizer: RecognizerKind::Nats,
            nats_url: "nats://localhost:4222".to_string(),
            synthesizer: SynthesizerKind::Command,
            tts_program: "espeak-ng".to_string(),
            tts_args: vec!["-v".to_string(), "{lang}".to_string(), "{text}".to_string()],
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate understands, extension
    /// optional) over built-in defaults, then apply environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let defaults = SessionConfig::default();
        let speech = SpeechConfig::default();

        let settings = config::Config::builder()
            .set_default("service.name", "mock-interview")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3030)?
            .set_default("api.base_url", "http://127.0.0.1:8000")?
            .set_default(
                "session.planning_seconds",
                defaults.planning_duration.as_secs() as i64,
            )?
            .set_default("session.locale", defaults.locale)?
            .set_default("session.answer_placeholder", defaults.answer_placeholder)?
            .set_default("session.display_utc_offset_hours", 9)?
            .set_default("speech.recognizer", "nats")?
            .set_default("speech.nats_url", speech.nats_url)?
            .set_default("speech.synthesizer", "command")?
            .set_default("speech.tts_program", speech.tts_program)?
            .set_default("speech.tts_args", speech.tts_args)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Settings for a new session with a fresh id
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            planning_duration: Duration::from_secs(self.session.planning_seconds),
            locale: self.session.locale.clone(),
            answer_placeholder: self.session.answer_placeholder.clone(),
            ..SessionConfig::default()
        }
    }
}
