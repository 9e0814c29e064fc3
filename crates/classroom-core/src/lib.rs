pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod lesson;
pub mod narration;
pub mod polling;
pub mod services;
pub mod session;
pub mod slides;
pub mod text_utils;
pub mod translation;
