//! Configuration loading for the presenter.
//!
//! Settings are read from `conf/config.toml` when present. Missing or invalid
//! entries fall back to defaults so a session can always start.

mod defaults;
mod models;

pub use models::{AppConfig, LogLevel};

use crate::narration::{MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
use crate::session::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            sanitize(cfg)
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

fn sanitize(mut config: AppConfig) -> AppConfig {
    config.standard_font_size = config.standard_font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    config.quick_font_size = config.quick_font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    config.font_step = config.font_step.max(1);
    config.playback_rate = if config.playback_rate.is_finite() && config.playback_rate > 0.0 {
        config
            .playback_rate
            .clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    } else {
        defaults::default_playback_rate()
    };
    config.frame_interval_ms = config.frame_interval_ms.max(1);
    config
}
