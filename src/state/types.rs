//! Session state type definitions
//!
//! All types serialize with the wire field names consumers expect
//! (camelCase), so a snapshot can be handed to UI/API collaborators as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed channel-strip count of the mirrored bank window
pub const TRACK_COUNT: usize = 8;

/// Errors surfaced by the state store's read/write API
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid track number {0}: must be 1-8")]
    InvalidTrack(u8),
}

/// Validate a 1-based track number against the fixed bank window
pub(crate) fn validate_track(number: u8) -> Result<usize, StateError> {
    if (1..=TRACK_COUNT as u8).contains(&number) {
        Ok((number - 1) as usize)
    } else {
        Err(StateError::InvalidTrack(number))
    }
}

/// One channel strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub number: u8,
    pub name: String,
    /// Raw 14-bit fader value (0-16383)
    pub volume: u16,
    /// Derived 0-100 figure, never independently set
    pub volume_percent: u8,
    /// Pan position (0-127, 64 = center)
    pub pan: u8,
    pub mute: bool,
    pub solo: bool,
    pub record_arm: bool,
    pub select: bool,
    pub touch: bool,
    /// Milliseconds since epoch
    pub last_update: u64,
}

impl Track {
    pub fn new(number: u8, now: u64) -> Self {
        Self {
            number,
            name: Self::default_name(number),
            volume: 0,
            volume_percent: 0,
            pan: 64,
            mute: false,
            solo: false,
            record_arm: false,
            select: false,
            touch: false,
            last_update: now,
        }
    }

    pub fn default_name(number: u8) -> String {
        format!("Track {}", number)
    }

    /// Restore mutable fields to defaults, keeping identity and name
    pub(crate) fn reset(&mut self, now: u64) {
        self.volume = 0;
        self.volume_percent = 0;
        self.pan = 64;
        self.mute = false;
        self.solo = false;
        self.record_arm = false;
        self.select = false;
        self.touch = false;
        self.last_update = now;
    }
}

/// Master fader (channel index 8), tracked separately from the 8 strips
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterFader {
    pub volume: u16,
    pub volume_percent: u8,
    pub last_update: u64,
}

/// Transport position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportPosition {
    pub bars: u32,
    pub beats: u32,
    pub ticks: u32,
    pub smpte: String,
}

impl Default for TransportPosition {
    fn default() -> Self {
        Self {
            bars: 0,
            beats: 0,
            ticks: 0,
            smpte: "00:00:00:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { numerator: 4, denominator: 4 }
    }
}

/// Transport state
///
/// `stopped` is mutually constrained with `playing`/`recording`: it is
/// cleared whenever either becomes true, and stop forces both false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    pub playing: bool,
    pub recording: bool,
    pub stopped: bool,
    pub position: TransportPosition,
    pub tempo: f64,
    pub time_signature: TimeSignature,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            playing: false,
            recording: false,
            stopped: true,
            position: TransportPosition::default(),
            tempo: 120.0,
            time_signature: TimeSignature::default(),
        }
    }
}

/// LCD and timecode display state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    /// Upper LCD line per strip (mirrors track names)
    pub track_names: [String; TRACK_COUNT],
    /// Lower LCD line per strip
    pub lower_lines: [String; TRACK_COUNT],
    pub time_display: String,
    pub assignment: String,
    pub current_bank: u8,
}

impl Display {
    fn new() -> Self {
        Self {
            track_names: std::array::from_fn(|i| Track::default_name(i as u8 + 1)),
            lower_lines: std::array::from_fn(|_| String::new()),
            time_display: String::new(),
            assignment: String::new(),
            current_bank: 0,
        }
    }
}

/// Per-track level meter with a latching clip flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMeter {
    /// Last reported level (0-127)
    pub level: u8,
    /// Level recorded at the moment clip latched
    pub peak: u8,
    /// Latched on levels above the clip threshold; only `reset` clears it
    pub clip: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterMeter {
    pub left: u8,
    pub right: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meters {
    pub tracks: [TrackMeter; TRACK_COUNT],
    pub master: MasterMeter,
}

/// V-Pot assignment mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VPotMode {
    #[default]
    Pan,
    Send,
    Eq,
    Plugin,
}

/// Touch-sensitive rotary encoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VPot {
    /// Current value (pan proxy in pan mode)
    pub value: u8,
    pub mode: VPotMode,
    pub led_ring: u8,
}

impl Default for VPot {
    fn default() -> Self {
        Self { value: 64, mode: VPotMode::Pan, led_ring: 0 }
    }
}

/// Transport button mirror
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportButtons {
    pub play: bool,
    pub stop: bool,
    pub record: bool,
}

/// Per-track button mirror, decoupled from the logical Track fields for
/// consumers that want raw press semantics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackButtons {
    pub mute: bool,
    pub solo: bool,
    pub record: bool,
    pub select: bool,
    pub vpot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buttons {
    pub transport: TransportButtons,
    pub tracks: [TrackButtons; TRACK_COUNT],
}

/// Connection liveness as inferred from inbound traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    Timeout,
    Error,
}

/// Session bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub last_update: u64,
    pub connection_status: ConnectionStatus,
    pub bank_offset: u8,
    pub selected_track: u8,
}

/// Generic session-field setter argument for [`crate::state::SessionStore::touch_meta`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMeta {
    ConnectionStatus(ConnectionStatus),
    BankOffset(u8),
}

/// The full mutable aggregate owned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub tracks: [Track; TRACK_COUNT],
    pub master_fader: MasterFader,
    pub transport: Transport,
    pub display: Display,
    pub meters: Meters,
    pub buttons: Buttons,
    pub vpots: [VPot; TRACK_COUNT],
    pub session: Session,
}

impl SessionState {
    pub fn new(now: u64) -> Self {
        Self {
            tracks: std::array::from_fn(|i| Track::new(i as u8 + 1, now)),
            master_fader: MasterFader::default(),
            transport: Transport::default(),
            display: Display::new(),
            meters: Meters::default(),
            buttons: Buttons::default(),
            vpots: std::array::from_fn(|_| VPot::default()),
            session: Session {
                last_update: now,
                connection_status: ConnectionStatus::Disconnected,
                bank_offset: 0,
                selected_track: 1,
            },
        }
    }
}

/// Derived per-snapshot counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_tracks: usize,
    pub active_tracks: usize,
    pub muted_tracks: usize,
    pub soloed_tracks: usize,
    pub record_armed_tracks: usize,
    pub is_playing: bool,
    pub is_recording: bool,
    pub selected_track: u8,
    pub last_update: u64,
}

impl Summary {
    pub(crate) fn from_state(state: &SessionState) -> Self {
        Self {
            total_tracks: state.tracks.len(),
            active_tracks: state.tracks.iter().filter(|t| !t.mute).count(),
            muted_tracks: state.tracks.iter().filter(|t| t.mute).count(),
            soloed_tracks: state.tracks.iter().filter(|t| t.solo).count(),
            record_armed_tracks: state.tracks.iter().filter(|t| t.record_arm).count(),
            is_playing: state.transport.playing,
            is_recording: state.transport.recording,
            selected_track: state.session.selected_track,
            last_update: state.session.last_update,
        }
    }
}

/// Full aggregate plus the derived summary, as served to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteState {
    #[serde(flatten)]
    pub state: SessionState,
    pub summary: Summary,
}

/// Flattened per-track projection for simpler consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibleTrack {
    pub name: String,
    /// Percent, not the raw 14-bit value
    pub volume: u8,
    pub pan: u8,
    pub mute: bool,
    pub solo: bool,
    pub record_arm: bool,
    pub touch: bool,
    pub select: bool,
    pub last_update: u64,
}

impl From<&Track> for CompatibleTrack {
    fn from(track: &Track) -> Self {
        Self {
            name: track.name.clone(),
            volume: track.volume_percent,
            pan: track.pan,
            mute: track.mute,
            solo: track.solo,
            record_arm: track.record_arm,
            touch: track.touch,
            select: track.select,
            last_update: track.last_update,
        }
    }
}

/// Passive liveness report derived from `now - lastUpdate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub healthy: bool,
    pub connection: ConnectionStatus,
    pub last_update: u64,
    pub time_since_last_update: u64,
}
