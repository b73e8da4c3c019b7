//! Core configuration structures and loading logic

use crate::length::parse_length;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Target length carries no numeric component
    #[error("Invalid duration format: '{0}'")]
    InvalidDurationFormat(String),

    /// Target length must be a positive, finite number of seconds
    #[error("Invalid target length: {0}s (must be > 0)")]
    InvalidTargetLength(f64),

    /// Speed-up must be strictly positive
    #[error("Invalid speed-up factor: {0} (must be > 0)")]
    InvalidSpeedUpFactor(f64),

    /// Head:tail ratio must have a positive sum
    #[error("Invalid head:tail ratio {0}:{1} (parts must sum to > 0)")]
    InvalidRatio(u32, u32),

    /// Output dimensions must be non-zero
    #[error("Invalid output resolution {0}x{1}")]
    InvalidResolution(u32, u32),

    /// Stabilization parameters are out of the engine's accepted range
    #[error("Invalid stabilization settings: {0}")]
    InvalidStabilization(String),
}

/// Who the timelapse is about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KidInfo {
    #[serde(default = "default_kid_name")]
    pub name: String,
    /// Birthday the age captions are counted from
    #[serde(default = "default_birthday")]
    pub birthday: NaiveDate,
}

fn default_kid_name() -> String {
    "Jane Doe".to_string()
}

fn default_birthday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 3, 23).unwrap_or_default()
}

impl Default for KidInfo {
    fn default() -> Self {
        Self {
            name: default_kid_name(),
            birthday: default_birthday(),
        }
    }
}

/// Input, output and scratch locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Directories {
    #[serde(default = "default_input_videos")]
    pub input_videos: PathBuf,
    #[serde(default = "default_output_video")]
    pub output_video: PathBuf,
    /// Intermediate per-stage files; reused across runs
    #[serde(default = "default_scratch")]
    pub scratch: PathBuf,
}

fn default_input_videos() -> PathBuf {
    PathBuf::from("./functional_tests/input/")
}

fn default_output_video() -> PathBuf {
    PathBuf::from("./functional_tests/output/")
}

fn default_scratch() -> PathBuf {
    PathBuf::from("./functional_tests/scratch/")
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            input_videos: default_input_videos(),
            output_video: default_output_video(),
            scratch: default_scratch(),
        }
    }
}

/// Target length as written in the config file: either a number of seconds
/// or a duration string such as `"1m30s"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TargetLength {
    Seconds(f64),
    Text(String),
}

impl TargetLength {
    /// Resolve to seconds, parsing the string form when needed
    pub fn as_secs(&self) -> Result<f64, ConfigError> {
        match self {
            TargetLength::Seconds(secs) => Ok(*secs),
            TargetLength::Text(text) => parse_length(text),
        }
    }
}

impl std::fmt::Display for TargetLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLength::Seconds(secs) => write!(f, "{}s", secs),
            TargetLength::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Shape of the final video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelapseVideo {
    /// Total runtime of the compiled video
    #[serde(default = "default_length")]
    pub length: TargetLength,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    /// Centre-crop every clip to 9:16 portrait
    #[serde(default = "default_true")]
    pub instagram_style: bool,
}

fn default_length() -> TargetLength {
    TargetLength::Seconds(15.0)
}

fn default_max_width() -> u32 {
    1920
}

fn default_max_height() -> u32 {
    1080
}

fn default_true() -> bool {
    true
}

impl TimelapseVideo {
    pub fn length_in_seconds(&self) -> Result<f64, ConfigError> {
        self.length.as_secs()
    }
}

impl Default for TimelapseVideo {
    fn default() -> Self {
        Self {
            length: default_length(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            instagram_style: true,
        }
    }
}

/// How clips are cut and ordered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelapseOptions {
    /// Newest clip first in the final video
    #[serde(default)]
    pub reverse: bool,
    /// Caption at bottom-centre (true) or bottom-right (false)
    #[serde(default = "default_true")]
    pub list_weeks_centered: bool,
    /// How many times faster than real time clips play (7.5 = 7.5x)
    #[serde(default = "default_speed_up")]
    pub speed_up: f64,
    /// Relative share of the per-clip budget kept from the start and the end
    #[serde(default = "default_head_tail_ratio")]
    pub head_tail_ratio: (u32, u32),
    #[serde(default)]
    pub video_stabilization: bool,
}

fn default_speed_up() -> f64 {
    7.5
}

fn default_head_tail_ratio() -> (u32, u32) {
    (2, 1)
}

impl TimelapseOptions {
    /// Presentation-timestamp multiplier handed to the engine (`1 / speed_up`)
    pub fn speed_up_factor(&self) -> f64 {
        1.0 / self.speed_up
    }
}

impl Default for TimelapseOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            list_weeks_centered: true,
            speed_up: default_speed_up(),
            head_tail_ratio: default_head_tail_ratio(),
            video_stabilization: false,
        }
    }
}

/// vid.stab tuning, used only when stabilization is enabled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StabilizationOptions {
    /// 1 (little shake) to 10 (very shaky)
    #[serde(default = "default_shakiness")]
    pub shakiness: u32,
    /// Frames used for smoothing camera motion
    #[serde(default = "default_smoothing")]
    pub smoothing: u32,
}

fn default_shakiness() -> u32 {
    5
}

fn default_smoothing() -> u32 {
    10
}

impl Default for StabilizationOptions {
    fn default() -> Self {
        Self {
            shakiness: default_shakiness(),
            smoothing: default_smoothing(),
        }
    }
}

/// Reporting switches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerOptions {
    /// Log the age caption of every clip before compiling
    #[serde(default = "default_true")]
    pub list_weeks: bool,
    /// Log every ffmpeg command line at info level
    #[serde(default)]
    pub show_ffmpeg_commands: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            list_weeks: true,
            show_ffmpeg_commands: false,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub kid_info: KidInfo,
    #[serde(default)]
    pub directories: Directories,
    #[serde(default)]
    pub timelapse_video: TimelapseVideo,
    #[serde(default)]
    pub timelapse_options: TimelapseOptions,
    #[serde(default)]
    pub stabilization: StabilizationOptions,
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - TIMELAPSE_INPUT_DIR -> directories.input_videos
    /// - TIMELAPSE_OUTPUT_DIR -> directories.output_video
    /// - TIMELAPSE_SCRATCH_DIR -> directories.scratch
    /// - TIMELAPSE_LENGTH -> timelapse_video.length
    /// - TIMELAPSE_REVERSE -> timelapse_options.reverse
    /// - TIMELAPSE_STABILIZATION -> timelapse_options.video_stabilization
    /// - TIMELAPSE_SHOW_COMMANDS -> compiler_options.show_ffmpeg_commands
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("TIMELAPSE_INPUT_DIR") {
            if !val.is_empty() {
                self.directories.input_videos = PathBuf::from(val);
            }
        }

        if let Ok(val) = env::var("TIMELAPSE_OUTPUT_DIR") {
            if !val.is_empty() {
                self.directories.output_video = PathBuf::from(val);
            }
        }

        if let Ok(val) = env::var("TIMELAPSE_SCRATCH_DIR") {
            if !val.is_empty() {
                self.directories.scratch = PathBuf::from(val);
            }
        }

        // Only accepted when it parses, so a typo keeps the file's value
        if let Ok(val) = env::var("TIMELAPSE_LENGTH") {
            if parse_length(&val).is_ok() {
                self.timelapse_video.length = TargetLength::Text(val);
            }
        }

        if let Some(flag) = env_flag("TIMELAPSE_REVERSE") {
            self.timelapse_options.reverse = flag;
        }

        if let Some(flag) = env_flag("TIMELAPSE_STABILIZATION") {
            self.timelapse_options.video_stabilization = flag;
        }

        if let Some(flag) = env_flag("TIMELAPSE_SHOW_COMMANDS") {
            self.compiler_options.show_ffmpeg_commands = flag;
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the given file if there is one, otherwise start from defaults
    ///
    /// Environment overrides are applied in both cases.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Check every value the pipeline depends on before any work starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let length = self.timelapse_video.length_in_seconds()?;
        if !(length.is_finite() && length > 0.0) {
            return Err(ConfigError::InvalidTargetLength(length));
        }

        let speed_up = self.timelapse_options.speed_up;
        if !(speed_up.is_finite() && speed_up > 0.0) {
            return Err(ConfigError::InvalidSpeedUpFactor(speed_up));
        }

        let (head, tail) = self.timelapse_options.head_tail_ratio;
        if head as u64 + tail as u64 == 0 {
            return Err(ConfigError::InvalidRatio(head, tail));
        }

        let video = &self.timelapse_video;
        if video.max_width == 0 || video.max_height == 0 {
            return Err(ConfigError::InvalidResolution(video.max_width, video.max_height));
        }

        if self.timelapse_options.video_stabilization {
            let shakiness = self.stabilization.shakiness;
            if !(1..=10).contains(&shakiness) {
                return Err(ConfigError::InvalidStabilization(format!(
                    "shakiness {} is outside 1-10",
                    shakiness
                )));
            }
        }

        Ok(())
    }
}

/// Accept "true", "1", "yes" as true; "false", "0", "no" as false
fn env_flag(name: &str) -> Option<bool> {
    let val = env::var(name).ok()?;
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
