//! Configuration management for MCU Mirror
//!
//! Handles loading and parsing of the YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::midi::convert;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub profile: DecodingProfile,
    #[serde(default)]
    pub sysex: SysexConfig,
    #[serde(default)]
    pub meters: MeterConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

/// MIDI port configuration
///
/// Ports are matched by case-insensitive substring, so `"IAC Driver Bus 2"`
/// or just `"bus 2"` both work.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    #[serde(default = "default_port")]
    pub input_port: String,
    #[serde(default = "default_port")]
    pub output_port: String,
}

/// Decoding profile for fields where incompatible surface conventions exist
///
/// The correct hardware convention differs between surface firmwares, so both
/// the fader percent curve and the V-Pot speed width are selectable rather
/// than hardcoded.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DecodingProfile {
    #[serde(default)]
    pub fader_curve: FaderCurve,
    #[serde(default)]
    pub vpot_speed: VpotSpeedWidth,
}

/// Fader percent curve
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FaderCurve {
    /// Pitch-bend-centered curve (canonical): center detent reads 100%
    #[default]
    Centered,
    /// Linear curve over the raw 14-bit domain
    Legacy,
}

impl FaderCurve {
    /// Convert a raw 14-bit fader value to a 0-100 percent figure
    pub fn percent(self, value: u16) -> u8 {
        match self {
            FaderCurve::Centered => convert::centered_percent(value),
            FaderCurve::Legacy => convert::legacy_percent(value),
        }
    }

    /// Convert a 0-100 percent figure to a raw 14-bit fader value
    pub fn fader_value(self, percent: u8) -> u16 {
        match self {
            FaderCurve::Centered => convert::centered_fader_value(percent),
            FaderCurve::Legacy => convert::legacy_fader_value(percent),
        }
    }
}

/// V-Pot speed magnitude width
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VpotSpeedWidth {
    /// 6-bit magnitude (canonical, finer resolution)
    #[default]
    Six,
    /// 4-bit magnitude (coarser firmware variant)
    Four,
}

impl VpotSpeedWidth {
    /// Bit mask applied to the CC data byte to extract the speed magnitude
    pub fn mask(self) -> u8 {
        match self {
            VpotSpeedWidth::Six => 0x3F,
            VpotSpeedWidth::Four => 0x0F,
        }
    }
}

/// SysEx reassembly limits
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SysexConfig {
    /// An incomplete multi-fragment packet older than this is discarded
    #[serde(default = "default_sysex_timeout_ms")]
    pub timeout_ms: u64,
    /// Hard cap on the reassembly buffer
    #[serde(default = "default_sysex_max_bytes")]
    pub max_packet_bytes: usize,
}

/// Meter decoding configuration
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MeterConfig {
    /// Levels above this (0-127 domain) latch the clip flag
    #[serde(default = "default_clip_threshold")]
    pub clip_threshold: u8,
}

/// Connection health configuration
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct HealthConfig {
    /// State older than this is reported as stale
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
}

/// Snapshot push feed configuration
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_interval_ms")]
    pub interval_ms: u64,
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        Ok(config)
    }

    /// Load configuration from file, falling back to defaults if it is absent
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            tracing::warn!("Config file '{}' not found, using defaults", path);
            Ok(Self::default())
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            midi: MidiConfig::default(),
            profile: DecodingProfile::default(),
            sysex: SysexConfig::default(),
            meters: MeterConfig::default(),
            health: HealthConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: default_port(),
            output_port: default_port(),
        }
    }
}

impl Default for DecodingProfile {
    fn default() -> Self {
        Self {
            fader_curve: FaderCurve::default(),
            vpot_speed: VpotSpeedWidth::default(),
        }
    }
}

impl Default for SysexConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_sysex_timeout_ms(),
            max_packet_bytes: default_sysex_max_bytes(),
        }
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            clip_threshold: default_clip_threshold(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: default_stale_after_ms(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_feed_interval_ms(),
        }
    }
}

// Default value functions
fn default_port() -> String {
    "IAC Driver Bus 2".to_string()
}
fn default_sysex_timeout_ms() -> u64 {
    2000
}
fn default_sysex_max_bytes() -> usize {
    1024
}
fn default_clip_threshold() -> u8 {
    120
}
fn default_stale_after_ms() -> u64 {
    30_000
}
fn default_feed_interval_ms() -> u64 {
    1000
}
