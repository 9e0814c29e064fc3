pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}

pub(crate) fn default_standard_font_size() -> u32 {
    24
}

pub(crate) fn default_quick_font_size() -> u32 {
    28
}

pub(crate) fn default_font_step() -> u32 {
    2
}

pub(crate) fn default_playback_rate() -> f64 {
    1.0
}

pub(crate) fn default_narration_endpoint() -> String {
    "http://127.0.0.1:8787/narration".to_string()
}

pub(crate) fn default_translation_endpoint() -> String {
    "http://127.0.0.1:8787/translate".to_string()
}

pub(crate) fn default_translation_target_language() -> String {
    "Portuguese".to_string()
}

pub(crate) fn default_voice() -> String {
    "Zephyr".to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_frame_interval_ms() -> u64 {
    16
}
