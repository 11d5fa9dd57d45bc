use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Caption typography
    #[serde(default)]
    pub style: StyleConfig,

    /// Resolution policy and workspace location
    #[serde(default)]
    pub render: RenderConfig,

    /// External encoder settings
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Input download and output upload settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Job scheduling
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Tunable typography constants for the style resolver
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleConfig {
    /// Font family name written into the style definition
    #[serde(default = "default_font_name")]
    pub font_name: String,

    /// Optional font file or directory copied into each job's font directory
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Smallest font size ever produced
    #[serde(default = "default_font_floor")]
    pub font_floor: u32,

    /// Font size as a fraction of canvas height
    #[serde(default = "default_font_ratio")]
    pub font_ratio: f64,

    /// Smallest vertical margin ever produced
    #[serde(default = "default_margin_floor")]
    pub margin_floor: u32,

    /// Vertical margin as a fraction of canvas height
    #[serde(default = "default_margin_ratio")]
    pub margin_ratio: f64,

    /// Horizontal margin as a fraction of canvas width
    #[serde(default = "default_margin_horizontal_ratio")]
    pub margin_horizontal_ratio: f64,

    /// Outline thickness in pixels
    #[serde(default = "default_outline_width")]
    pub outline_width: f64,

    /// Shadow depth in pixels
    #[serde(default)]
    pub shadow: f64,

    /// Inter-line gap size as a fraction of the font size
    #[serde(default = "default_spacer_ratio")]
    pub spacer_ratio: f64,

    /// Captions longer than this many characters get wrapped
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,

    /// Fill colour in ASS `&HAABBGGRR` notation
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,

    /// Outline colour in ASS notation
    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    /// Shadow colour in ASS notation
    #[serde(default = "default_back_colour")]
    pub back_colour: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: default_font_name(),
            font_path: None,
            font_floor: default_font_floor(),
            font_ratio: default_font_ratio(),
            margin_floor: default_margin_floor(),
            margin_ratio: default_margin_ratio(),
            margin_horizontal_ratio: default_margin_horizontal_ratio(),
            outline_width: default_outline_width(),
            shadow: 0.0,
            spacer_ratio: default_spacer_ratio(),
            max_line_chars: default_max_line_chars(),
            primary_colour: default_primary_colour(),
            outline_colour: default_outline_colour(),
            back_colour: default_back_colour(),
        }
    }
}

/// Resolution policy and workspace settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    /// Sources shorter than this are upscaled before burn-in
    #[serde(default = "default_min_height")]
    pub min_height: u32,

    /// Parent directory for per-job temporary workspaces
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_height: default_min_height(),
            work_root: default_work_root(),
        }
    }
}

/// Codec settings for one encode path
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CodecProfile {
    /// ffmpeg encoder name (e.g. "h264_nvenc", "libx264")
    pub codec: String,

    /// Extra encoder arguments placed after `-c:v <codec>`
    #[serde(default)]
    pub args: Vec<String>,
}

/// External encoder configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EncoderConfig {
    /// ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Try the accelerated path first
    #[serde(default = "default_true")]
    pub prefer_hardware: bool,

    /// Check `ffmpeg -encoders` before attempting the accelerated path
    #[serde(default = "default_true")]
    pub detect_hardware: bool,

    /// Concurrent accelerated encodes allowed on this host
    #[serde(default = "default_hardware_slots")]
    pub hardware_slots: usize,

    /// Accelerated codec profile
    #[serde(default = "default_accelerated_profile")]
    pub accelerated: CodecProfile,

    /// Portable fallback codec profile
    #[serde(default = "default_software_profile")]
    pub software: CodecProfile,

    /// Optional wall-clock limit for one ffmpeg/ffprobe invocation.
    /// Unset means no limit.
    #[serde(default)]
    pub process_timeout_secs: Option<u64>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            prefer_hardware: true,
            detect_hardware: true,
            hardware_slots: default_hardware_slots(),
            accelerated: default_accelerated_profile(),
            software: default_software_profile(),
            process_timeout_secs: None,
        }
    }
}

/// Storage collaborator configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Network timeout for downloads and uploads in seconds
    #[serde(default = "default_storage_timeout_secs")]
    pub timeout_secs: u64,

    /// Where renders go when the job names no destination
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_storage_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

/// Job scheduling settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobsConfig {
    /// Jobs run in parallel by `batch`
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_floor() -> u32 {
    30
}

fn default_font_ratio() -> f64 {
    0.055
}

fn default_margin_floor() -> u32 {
    24
}

fn default_margin_ratio() -> f64 {
    0.05
}

fn default_margin_horizontal_ratio() -> f64 {
    0.04
}

fn default_outline_width() -> f64 {
    3.0
}

fn default_spacer_ratio() -> f64 {
    0.25
}

fn default_max_line_chars() -> usize {
    42
}

fn default_primary_colour() -> String {
    "&H00FFFFFF".to_string()
}

fn default_outline_colour() -> String {
    "&H00000000".to_string()
}

fn default_back_colour() -> String {
    "&H00000000".to_string()
}

fn default_min_height() -> u32 {
    720
}

fn default_work_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("subburn")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("renders")
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_true() -> bool {
    true
}

fn default_hardware_slots() -> usize {
    1
}

fn default_accelerated_profile() -> CodecProfile {
    CodecProfile {
        codec: "h264_nvenc".to_string(),
        args: [
            "-preset", "p1", "-tune", "ll", "-rc", "cbr",
            "-b:v", "8M", "-maxrate", "8M", "-bufsize", "16M",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

fn default_software_profile() -> CodecProfile {
    CodecProfile {
        codec: "libx264".to_string(),
        args: ["-preset", "ultrafast", "-crf", "23"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn default_storage_timeout_secs() -> u64 {
    600
}

fn default_max_concurrent_jobs() -> usize {
    2
}

impl Config {
    /// Load configuration from a JSON file, creating a default one if missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let style = &self.style;

        if style.font_name.trim().is_empty() {
            return Err(anyhow!("style.font_name must not be empty"));
        }
        if style.font_floor == 0 {
            return Err(anyhow!("style.font_floor must be positive"));
        }
        for (name, value) in [
            ("style.font_ratio", style.font_ratio),
            ("style.margin_ratio", style.margin_ratio),
            ("style.spacer_ratio", style.spacer_ratio),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(anyhow!("{} must be a positive number, got {}", name, value));
            }
        }
        if !(style.margin_horizontal_ratio.is_finite() && style.margin_horizontal_ratio >= 0.0) {
            return Err(anyhow!("style.margin_horizontal_ratio must not be negative"));
        }
        if style.outline_width < 0.0 || style.shadow < 0.0 {
            return Err(anyhow!("style.outline_width and style.shadow must not be negative"));
        }
        if style.max_line_chars == 0 {
            return Err(anyhow!("style.max_line_chars must be positive"));
        }

        if self.render.min_height == 0 {
            return Err(anyhow!("render.min_height must be positive"));
        }

        if self.encoder.hardware_slots == 0 {
            return Err(anyhow!("encoder.hardware_slots must be at least 1"));
        }
        if self.encoder.hardware_slots > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(anyhow!(
                "encoder.hardware_slots must not exceed {}",
                tokio::sync::Semaphore::MAX_PERMITS
            ));
        }
        if self.encoder.accelerated.codec.is_empty() || self.encoder.software.codec.is_empty() {
            return Err(anyhow!("encoder codec names must not be empty"));
        }
        if self.encoder.process_timeout_secs == Some(0) {
            return Err(anyhow!("encoder.process_timeout_secs must be positive when set"));
        }

        if self.storage.timeout_secs == 0 {
            return Err(anyhow!("storage.timeout_secs must be positive"));
        }
        if self.jobs.max_concurrent_jobs == 0 {
            return Err(anyhow!("jobs.max_concurrent_jobs must be at least 1"));
        }

        Ok(())
    }
}
