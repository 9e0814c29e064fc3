use serde::{Deserialize, Serialize};

/// Presenter configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_standard_font_size")]
    pub standard_font_size: u32,
    #[serde(default = "crate::config::defaults::default_quick_font_size")]
    pub quick_font_size: u32,
    #[serde(default = "crate::config::defaults::default_font_step")]
    pub font_step: u32,
    #[serde(default = "crate::config::defaults::default_playback_rate")]
    pub playback_rate: f64,
    #[serde(default = "crate::config::defaults::default_narration_endpoint")]
    pub narration_endpoint: String,
    #[serde(default = "crate::config::defaults::default_translation_endpoint")]
    pub translation_endpoint: String,
    #[serde(default = "crate::config::defaults::default_translation_target_language")]
    pub translation_target_language: String,
    #[serde(default = "crate::config::defaults::default_voice")]
    pub default_voice: String,
    #[serde(default = "crate::config::defaults::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "crate::config::defaults::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            standard_font_size: crate::config::defaults::default_standard_font_size(),
            quick_font_size: crate::config::defaults::default_quick_font_size(),
            font_step: crate::config::defaults::default_font_step(),
            playback_rate: crate::config::defaults::default_playback_rate(),
            narration_endpoint: crate::config::defaults::default_narration_endpoint(),
            translation_endpoint: crate::config::defaults::default_translation_endpoint(),
            translation_target_language:
                crate::config::defaults::default_translation_target_language(),
            default_voice: crate::config::defaults::default_voice(),
            request_timeout_secs: crate::config::defaults::default_request_timeout_secs(),
            frame_interval_ms: crate::config::defaults::default_frame_interval_ms(),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
