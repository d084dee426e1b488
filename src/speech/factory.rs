use std::sync::Arc;

use super::nats_recognizer::NatsRecognizer;
use super::prompt::{CommandSynthesizer, SilentSynthesizer, SpeechSynthesizer};
use super::recognition::{RecognitionEngine, UnsupportedRecognizer};
use crate::config::{RecognizerKind, SpeechConfig, SynthesizerKind};

/// Builds the speech engines for a new session
pub trait EngineFactory: Send + Sync {
    fn recognizer(&self, session_id: &str, locale: &str) -> Box<dyn RecognitionEngine>;

    fn synthesizer(&self) -> Arc<dyn SpeechSynthesizer>;
}

/// Engines selected by the `[speech]` config section
pub struct ConfiguredEngines {
    config: SpeechConfig,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl ConfiguredEngines {
    pub fn new(config: SpeechConfig) -> Self {
        let synthesizer: Arc<dyn SpeechSynthesizer> = match config.synthesizer {
            SynthesizerKind::Command => Arc::new(CommandSynthesizer::new(
                config.tts_program.clone(),
                config.tts_args.clone(),
            )),
            SynthesizerKind::Silent => Arc::new(SilentSynthesizer),
        };
        Self {
            config,
            synthesizer,
        }
    }
}

impl EngineFactory for ConfiguredEngines {
    fn recognizer(&self, session_id: &str, locale: &str) -> Box<dyn RecognitionEngine> {
        match self.config.recognizer {
            RecognizerKind::Nats => Box::new(NatsRecognizer::new(
                self.config.nats_url.clone(),
                session_id,
                locale,
            )),
            RecognizerKind::None => Box::new(UnsupportedRecognizer),
        }
    }

    fn synthesizer(&self) -> Arc<dyn SpeechSynthesizer> {
        Arc::clone(&self.synthesizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_recognizer_is_unsupported() {
        let engines = ConfiguredEngines::new(SpeechConfig {
            recognizer: RecognizerKind::None,
            synthesizer: SynthesizerKind::Silent,
            ..SpeechConfig::default()
        });

        let recognizer = engines.recognizer("s1", "ko-KR");
        assert!(!recognizer.is_supported());
        assert_eq!(engines.synthesizer().name(), "silent");
    }

    #[test]
    fn default_engines_use_nats_and_espeak() {
        let engines = ConfiguredEngines::new(SpeechConfig::default());

        let recognizer = engines.recognizer("s1", "ko-KR");
        assert!(recognizer.is_supported());
        assert_eq!(recognizer.name(), "nats");
        assert_eq!(engines.synthesizer().name(), "espeak-ng");
    }
}
