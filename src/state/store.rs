//! SessionStore - the single shared session state with a narrow mutation API
//!
//! Decoders mutate through these setters only; every mutation is atomic per
//! message (one write-lock scope) and stamps the session's `lastUpdate`.

use super::types::{
    validate_track, CompatibleTrack, CompleteState, ConnectionStatus, Display, Health, Meters,
    Session, SessionMeta, SessionState, StateError, Summary, Track, Transport,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Shared handle to the session state
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionState>>,
    clip_threshold: u8,
    stale_after_ms: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_limits(120, 30_000)
    }

    /// Create a store with explicit clip and staleness thresholds
    pub fn with_limits(clip_threshold: u8, stale_after_ms: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::new(now_ms()))),
            clip_threshold,
            stale_after_ms,
        }
    }

    /// Run a mutation against one track, stamping session bookkeeping
    fn with_track<R>(
        &self,
        track: u8,
        f: impl FnOnce(&mut SessionState, usize, u64) -> R,
    ) -> Result<R, StateError> {
        let index = validate_track(track)?;
        let mut state = self.inner.write();
        let now = now_ms();
        state.session.last_update = now;
        state.session.connection_status = ConnectionStatus::Connected;
        Ok(f(&mut state, index, now))
    }

    /// Run a track-independent mutation, stamping session bookkeeping
    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState, u64) -> R) -> R {
        let mut state = self.inner.write();
        let now = now_ms();
        state.session.last_update = now;
        state.session.connection_status = ConnectionStatus::Connected;
        f(&mut state, now)
    }

    // --- fader ---

    pub fn apply_fader(&self, track: u8, value: u16, percent: u8) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            let t = &mut state.tracks[i];
            t.volume = value;
            t.volume_percent = percent;
            t.last_update = now;
        })
    }

    pub fn apply_master_fader(&self, value: u16, percent: u8) {
        self.with_state(|state, now| {
            state.master_fader.volume = value;
            state.master_fader.volume_percent = percent;
            state.master_fader.last_update = now;
        });
    }

    // --- buttons ---

    pub fn set_record_arm(&self, track: u8, armed: bool) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            state.tracks[i].record_arm = armed;
            state.tracks[i].last_update = now;
            state.buttons.tracks[i].record = armed;
        })
    }

    pub fn set_solo(&self, track: u8, solo: bool) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            state.tracks[i].solo = solo;
            state.tracks[i].last_update = now;
            state.buttons.tracks[i].solo = solo;
        })
    }

    pub fn set_mute(&self, track: u8, mute: bool) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            state.tracks[i].mute = mute;
            state.tracks[i].last_update = now;
            state.buttons.tracks[i].mute = mute;
        })
    }

    /// Exclusive select: at most one track is selected at any time.
    ///
    /// Press selects only the target; release clears it. `selectedTrack`
    /// falls back to track 1 when nothing is selected.
    pub fn select_track(&self, track: u8, pressed: bool) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            for t in state.tracks.iter_mut() {
                t.select = false;
            }
            for b in state.buttons.tracks.iter_mut() {
                b.select = false;
            }
            state.tracks[i].select = pressed;
            state.tracks[i].last_update = now;
            state.buttons.tracks[i].select = pressed;
            state.session.selected_track = if pressed { track } else { 1 };
        })
    }

    // --- transport ---

    /// Re-derive `stopped` from `playing`/`recording`
    fn sync_stopped(transport: &mut Transport) {
        transport.stopped = !transport.playing && !transport.recording;
    }

    pub fn set_transport_play(&self, pressed: bool) {
        self.with_state(|state, _| {
            state.transport.playing = pressed;
            Self::sync_stopped(&mut state.transport);
            state.buttons.transport.play = pressed;
        });
    }

    /// Stop forces playing and recording off, regardless of press/release
    pub fn set_transport_stop(&self, pressed: bool) {
        self.with_state(|state, _| {
            state.transport.playing = false;
            state.transport.recording = false;
            state.transport.stopped = true;
            state.buttons.transport.stop = pressed;
        });
    }

    pub fn set_transport_record(&self, pressed: bool) {
        self.with_state(|state, _| {
            state.transport.recording = pressed;
            Self::sync_stopped(&mut state.transport);
            state.buttons.transport.record = pressed;
        });
    }

    // --- rotary / touch ---

    /// Apply a relative V-Pot delta to the track's pan, clamped to [0,127].
    ///
    /// Returns the new pan value; the V-Pot mirror is updated in the same
    /// operation.
    pub fn nudge_pan(&self, track: u8, delta: i16) -> Result<u8, StateError> {
        self.with_track(track, |state, i, now| {
            let pan = (state.tracks[i].pan as i16 + delta).clamp(0, 127) as u8;
            state.tracks[i].pan = pan;
            state.tracks[i].last_update = now;
            state.vpots[i].value = pan;
            pan
        })
    }

    pub fn set_fader_touch(&self, track: u8, touched: bool) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            state.tracks[i].touch = touched;
            state.tracks[i].last_update = now;
            state.buttons.tracks[i].vpot = touched;
        })
    }

    // --- display / sysex fields ---

    /// Set the track name and upper LCD line; empty text restores the default
    pub fn set_track_name(&self, track: u8, name: &str) -> Result<(), StateError> {
        self.with_track(track, |state, i, now| {
            let effective = if name.is_empty() {
                Track::default_name(track)
            } else {
                name.to_string()
            };
            state.tracks[i].name = effective.clone();
            state.tracks[i].last_update = now;
            state.display.track_names[i] = effective;
        })
    }

    pub fn set_lower_line(&self, track: u8, text: &str) -> Result<(), StateError> {
        self.with_track(track, |state, i, _| {
            state.display.lower_lines[i] = text.to_string();
        })
    }

    /// Store the timecode string on both the display and the transport SMPTE
    pub fn set_time_display(&self, time: &str) {
        self.with_state(|state, _| {
            state.display.time_display = time.to_string();
            state.transport.position.smpte = time.to_string();
        });
    }

    pub fn set_position(&self, bars: u32, beats: u32, ticks: u32) {
        self.with_state(|state, _| {
            state.transport.position.bars = bars;
            state.transport.position.beats = beats;
            state.transport.position.ticks = ticks;
        });
    }

    // --- meters ---

    /// Record a meter level; levels above the clip threshold latch `clip`
    /// and record the peak. The latch never auto-clears.
    pub fn set_meter_level(&self, track: u8, level: u8) -> Result<(), StateError> {
        self.with_track(track, |state, i, _| {
            let meter = &mut state.meters.tracks[i];
            meter.level = level;
            if level > self.clip_threshold {
                meter.clip = true;
                meter.peak = level;
            }
        })
    }

    /// Stereo master meter; no inbound message carries it, so this is fed by
    /// external collaborators that know the master bus levels
    pub fn set_master_meter(&self, left: u8, right: u8) {
        self.with_state(|state, _| {
            state.meters.master.left = left;
            state.meters.master.right = right;
        });
    }

    // --- session ---

    /// Generic session-field setter; also stamps `lastUpdate`
    pub fn touch_meta(&self, meta: SessionMeta) {
        let mut state = self.inner.write();
        match meta {
            SessionMeta::ConnectionStatus(status) => {
                state.session.connection_status = status;
            }
            SessionMeta::BankOffset(offset) => {
                state.session.bank_offset = offset;
            }
        }
        state.session.last_update = now_ms();
    }

    /// Reinitialize all mutable per-track fields, transport, buttons, meters,
    /// and V-Pots to defaults. Track identity and names are preserved.
    /// Idempotent apart from the `lastUpdate` stamp.
    pub fn reset(&self) {
        let mut state = self.inner.write();
        let now = now_ms();
        for track in state.tracks.iter_mut() {
            track.reset(now);
        }
        state.master_fader = super::types::MasterFader::default();
        state.transport = Transport::default();
        state.buttons = super::types::Buttons::default();
        state.meters = Meters::default();
        for vpot in state.vpots.iter_mut() {
            *vpot = super::types::VPot::default();
        }
        state.session.selected_track = 1;
        state.session.last_update = now;
    }

    // --- read surface ---

    pub fn track(&self, track: u8) -> Result<Track, StateError> {
        let index = validate_track(track)?;
        Ok(self.inner.read().tracks[index].clone())
    }

    pub fn transport(&self) -> Transport {
        self.inner.read().transport.clone()
    }

    pub fn display(&self) -> Display {
        self.inner.read().display.clone()
    }

    pub fn meters(&self) -> Meters {
        self.inner.read().meters.clone()
    }

    pub fn session(&self) -> Session {
        self.inner.read().session.clone()
    }

    /// Full aggregate plus the derived summary
    pub fn complete_state(&self) -> CompleteState {
        let state = self.inner.read().clone();
        let summary = Summary::from_state(&state);
        CompleteState { state, summary }
    }

    /// Flattened `"Track N"`-keyed projection for simpler consumers
    pub fn compatible_view(&self) -> BTreeMap<String, CompatibleTrack> {
        let state = self.inner.read();
        state
            .tracks
            .iter()
            .map(|t| (format!("Track {}", t.number), CompatibleTrack::from(t)))
            .collect()
    }

    /// Passive liveness: healthy iff the last update is fresher than the
    /// staleness threshold. No active heartbeat.
    pub fn health(&self) -> Health {
        let state = self.inner.read();
        let elapsed = now_ms().saturating_sub(state.session.last_update);
        Health {
            healthy: elapsed < self.stale_after_ms,
            connection: state.session.connection_status,
            last_update: state.session.last_update,
            time_since_last_update: elapsed,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
