//! Clients for the narration and translation collaborators.

use crate::audio::pcm::{self, NARRATION_FORMAT};
use crate::config::AppConfig;
use crate::error::{NarrationError, TranslationError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Speech synthesis: text plus voice identity in, base64 PCM out.
pub trait NarrationService {
    fn synthesize(&self, text: &str, voice: &str) -> Result<String, NarrationError>;
}

/// Single-word translation.
pub trait TranslationService {
    fn translate(&self, word: &str) -> Result<String, TranslationError>;
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

pub struct HttpNarrationService {
    client: Client,
    endpoint: String,
}

impl HttpNarrationService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(
            config.narration_endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[derive(Debug, Serialize)]
struct NarrationRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

#[derive(Debug, Deserialize)]
struct NarrationResponse {
    #[serde(default)]
    audio: Option<String>,
}

impl NarrationService for HttpNarrationService {
    fn synthesize(&self, text: &str, voice: &str) -> Result<String, NarrationError> {
        info!(
            endpoint = %self.endpoint,
            voice,
            chars = text.chars().count(),
            "Requesting narration"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&NarrationRequest { text, voice })
            .send()
            .map_err(|err| NarrationError::Generation(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Narration service rejected request");
            return Err(NarrationError::Generation(format!("status {status}")));
        }

        let body: NarrationResponse = response
            .json()
            .map_err(|err| NarrationError::Generation(format!("unreadable response: {err}")))?;
        match body.audio {
            Some(audio) if !audio.trim().is_empty() => {
                debug!(payload_len = audio.len(), "Narration payload received");
                Ok(audio)
            }
            _ => Err(NarrationError::Generation(
                "response carried no audio".to_string(),
            )),
        }
    }
}

pub struct HttpTranslationService {
    client: Client,
    endpoint: String,
    target_language: String,
}

impl HttpTranslationService {
    pub fn new(
        endpoint: impl Into<String>,
        target_language: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            target_language: target_language.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(
            config.translation_endpoint.clone(),
            config.translation_target_language.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslationRequest<'a> {
    word: &'a str,
    target_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    #[serde(default)]
    translation: Option<String>,
}

impl TranslationService for HttpTranslationService {
    fn translate(&self, word: &str) -> Result<String, TranslationError> {
        if self.endpoint.trim().is_empty() {
            return Err(TranslationError::NotConfigured);
        }
        debug!(endpoint = %self.endpoint, word, "Requesting translation");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TranslationRequest {
                word,
                target_language: &self.target_language,
            })
            .send()
            .map_err(|err| TranslationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Transport(format!("status {status}")));
        }
        let body: TranslationResponse = response
            .json()
            .map_err(|err| TranslationError::Transport(format!("unreadable response: {err}")))?;
        body.translation
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(TranslationError::Empty)
    }
}

/// Local stand-in for the narration service: a soft tone whose length grows
/// with the text, encoded exactly like the real payload.
#[derive(Debug, Clone)]
pub struct OfflineNarration {
    pub secs_per_word: f64,
    pub tone_hz: f64,
}

impl Default for OfflineNarration {
    fn default() -> Self {
        Self {
            secs_per_word: 0.4,
            tone_hz: 220.0,
        }
    }
}

impl NarrationService for OfflineNarration {
    fn synthesize(&self, text: &str, voice: &str) -> Result<String, NarrationError> {
        let words = text.split_whitespace().count();
        if words == 0 {
            return Err(NarrationError::Generation("nothing to narrate".to_string()));
        }
        let rate = f64::from(NARRATION_FORMAT.sample_rate);
        let frames = (words as f64 * self.secs_per_word * rate).round() as usize;
        let samples: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f64 / rate;
                (0.2 * (std::f64::consts::TAU * self.tone_hz * t).sin()) as f32
            })
            .collect();
        debug!(voice, words, frames, "Generated offline narration");
        Ok(pcm::encode_base64_pcm16le(&samples))
    }
}

/// Translation collaborator for sessions without a service configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTranslation;

impl TranslationService for UnconfiguredTranslation {
    fn translate(&self, _word: &str) -> Result<String, TranslationError> {
        Err(TranslationError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_narration_scales_with_word_count() {
        let service = OfflineNarration::default();
        let payload = service.synthesize("one two three", "Zephyr").expect("tone");
        let bytes = pcm::decode_base64(&payload).expect("base64");
        let asset = pcm::decode_pcm16le(&bytes, NARRATION_FORMAT).expect("pcm");
        assert!((asset.duration_secs() - 1.2).abs() < 1e-3);
        assert!(asset.samples().iter().all(|s| s.abs() <= 0.21));
    }

    #[test]
    fn offline_narration_rejects_blank_text() {
        let err = OfflineNarration::default()
            .synthesize("   ", "Zephyr")
            .expect_err("blank text");
        assert_eq!(err.kind(), "generation_failure");
    }

    #[test]
    fn unreachable_translation_endpoint_is_a_transport_error() {
        let service =
            HttpTranslationService::new("http://127.0.0.1:9/translate", "Portuguese", Duration::from_millis(200))
                .expect("client");
        assert!(matches!(
            service.translate("apple"),
            Err(TranslationError::Transport(_))
        ));
        let blank = HttpTranslationService::new(" ", "Portuguese", Duration::from_millis(200))
            .expect("client");
        assert_eq!(blank.translate("apple"), Err(TranslationError::NotConfigured));
    }

    #[test]
    fn unreachable_narration_endpoint_is_a_generation_error() {
        let service = HttpNarrationService::new("http://127.0.0.1:9/narration", Duration::from_millis(200))
            .expect("client");
        assert!(matches!(
            service.synthesize("Hello", "Zephyr"),
            Err(NarrationError::Generation(_))
        ));
    }
}
