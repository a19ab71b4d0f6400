//! Configuration management for AdProof.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use adproof_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Recording for {} ms", config.settings().timing.recording_ms);
//!
//! config.settings_mut().timing.settle_ms = 1500;
//! config.update_section(ConfigSection::Timing).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CaptureMode, CaptureSettings, ConfigSection, LoggingSettings, PathSettings, Settings,
    TimingSettings,
};
