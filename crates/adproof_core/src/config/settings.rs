//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Fixed holds used by the batch pipeline.
    #[serde(default)]
    pub timing: TimingSettings,

    /// Capture and recording settings.
    #[serde(default)]
    pub capture: CaptureSettings,
}

/// Path configuration for proof output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Folder the proof-pack collaborator writes into.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_output_folder() -> String {
    "proof_output".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            logs_folder: default_logs_folder(),
            output_folder: default_output_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of recent lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Fixed wall-clock holds, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Hold after the creative signals ready.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Total visible countdown before recording.
    #[serde(default = "default_countdown_ms")]
    pub countdown_ms: u64,

    /// Length of one countdown tick.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Length of each recording.
    #[serde(default = "default_recording_ms")]
    pub recording_ms: u64,

    /// Hold between running compliance and reading its result.
    #[serde(default = "default_compliance_grace_ms")]
    pub compliance_grace_ms: u64,

    /// Per-item budget used for the ETA estimate.
    #[serde(default = "default_item_budget_ms")]
    pub item_budget_ms: u64,

    /// Run the countdown before every recording instead of only the first.
    #[serde(default)]
    pub countdown_every_item: bool,
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_countdown_ms() -> u64 {
    2000
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

fn default_recording_ms() -> u64 {
    3000
}

fn default_compliance_grace_ms() -> u64 {
    500
}

fn default_item_budget_ms() -> u64 {
    8000
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            countdown_ms: default_countdown_ms(),
            countdown_tick_ms: default_countdown_tick_ms(),
            recording_ms: default_recording_ms(),
            compliance_grace_ms: default_compliance_grace_ms(),
            item_budget_ms: default_item_budget_ms(),
            countdown_every_item: false,
        }
    }
}

/// Which stream gets recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Record the raw capture stream as-is.
    Raw,
    /// Record a derived stream cropped to the creative's rectangle.
    #[default]
    Clip,
}

/// Capture and recording configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Record video evidence. When false the run is compliance-only.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Raw or clipped recording.
    #[serde(default)]
    pub mode: CaptureMode,

    /// Frame rate of the derived stream and the capture poller.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// JPEG quality for the Motion-JPEG encoder (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Prefer a window whose title contains this text over the whole display.
    #[serde(default)]
    pub prefer_window_title: Option<String>,

    /// Ask the host to leave the tool's own surface out of the candidates.
    #[serde(default = "default_true")]
    pub exclude_own_surface: bool,
}

fn default_frame_rate() -> u32 {
    30
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CaptureMode::default(),
            frame_rate: default_frame_rate(),
            jpeg_quality: default_jpeg_quality(),
            prefer_window_title: None,
            exclude_own_surface: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Timing,
    Capture,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Timing => "timing",
            ConfigSection::Capture => "capture",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 4] {
        [
            ConfigSection::Paths,
            ConfigSection::Logging,
            ConfigSection::Timing,
            ConfigSection::Capture,
        ]
    }
}
