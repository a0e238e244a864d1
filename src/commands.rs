//! Outbound command encoding
//!
//! Builds the raw messages a DAW-side peer expects for mixer moves: pitch
//! bend for faders, note-on for buttons and transport. Encoding is pure;
//! callers hand the bytes to a [`SurfaceDriver`](crate::surface::SurfaceDriver).

use crate::config::FaderCurve;
use crate::mcu::addresses::{
    MUTE_BASE, REC_ARM_BASE, SELECT_BASE, SOLO_BASE, TRANSPORT_PLAY, TRANSPORT_RECORD,
    TRANSPORT_STOP,
};
use crate::midi::MidiMessage;
use crate::state::StateError;

fn validate_track(track: u8) -> Result<(), StateError> {
    if (1..=8).contains(&track) {
        Ok(())
    } else {
        Err(StateError::InvalidTrack(track))
    }
}

/// Fader move for one track, percent on the configured curve
pub fn set_volume(track: u8, percent: u8, curve: FaderCurve) -> Result<MidiMessage, StateError> {
    validate_track(track)?;
    let value = curve.fader_value(percent.min(100));
    Ok(MidiMessage::PitchBend { channel: track - 1, value })
}

/// Master fader move
pub fn set_master_volume(percent: u8, curve: FaderCurve) -> MidiMessage {
    let value = curve.fader_value(percent.min(100));
    MidiMessage::PitchBend { channel: 8, value }
}

fn button(note: u8, on: bool) -> MidiMessage {
    MidiMessage::NoteOn {
        channel: 0,
        note,
        velocity: if on { 127 } else { 0 },
    }
}

pub fn set_mute(track: u8, on: bool) -> Result<MidiMessage, StateError> {
    validate_track(track)?;
    Ok(button(MUTE_BASE + track - 1, on))
}

pub fn set_solo(track: u8, on: bool) -> Result<MidiMessage, StateError> {
    validate_track(track)?;
    Ok(button(SOLO_BASE + track - 1, on))
}

pub fn set_record_arm(track: u8, on: bool) -> Result<MidiMessage, StateError> {
    validate_track(track)?;
    Ok(button(REC_ARM_BASE + track - 1, on))
}

pub fn select(track: u8) -> Result<MidiMessage, StateError> {
    validate_track(track)?;
    Ok(button(SELECT_BASE + track - 1, true))
}

pub fn transport_play() -> MidiMessage {
    button(TRANSPORT_PLAY, true)
}

pub fn transport_stop() -> MidiMessage {
    button(TRANSPORT_STOP, true)
}

pub fn transport_record() -> MidiMessage {
    button(TRANSPORT_RECORD, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_volume_encodes_pitch_bend() {
        let msg = set_volume(4, 100, FaderCurve::Centered).unwrap();
        assert_eq!(msg, MidiMessage::PitchBend { channel: 3, value: 8192 });
        assert_eq!(msg.encode(), vec![0xE3, 0x00, 0x40]);
    }

    #[test]
    fn test_set_volume_legacy_extremes() {
        let low = set_volume(1, 0, FaderCurve::Legacy).unwrap();
        assert_eq!(low.encode(), vec![0xE0, 0x00, 0x00]);
        let high = set_volume(1, 100, FaderCurve::Legacy).unwrap();
        assert_eq!(high.encode(), vec![0xE0, 0x7F, 0x7F]);
    }

    #[test]
    fn test_set_volume_clamps_percent() {
        let msg = set_volume(1, 250, FaderCurve::Legacy).unwrap();
        assert_eq!(msg.encode(), vec![0xE0, 0x7F, 0x7F]);
    }

    #[test]
    fn test_track_bounds() {
        assert_eq!(set_volume(0, 50, FaderCurve::Centered), Err(StateError::InvalidTrack(0)));
        assert_eq!(set_mute(9, true), Err(StateError::InvalidTrack(9)));
        assert_eq!(select(12), Err(StateError::InvalidTrack(12)));
    }

    #[test]
    fn test_button_notes() {
        assert_eq!(set_mute(3, true).unwrap().encode(), vec![0x90, 0x12, 0x7F]);
        assert_eq!(set_solo(1, false).unwrap().encode(), vec![0x90, 0x08, 0x00]);
        assert_eq!(set_record_arm(8, true).unwrap().encode(), vec![0x90, 0x07, 0x7F]);
        assert_eq!(select(5).unwrap().encode(), vec![0x90, 0x1C, 0x7F]);
    }

    #[test]
    fn test_transport() {
        assert_eq!(transport_play().encode(), vec![0x90, 0x5E, 0x7F]);
        assert_eq!(transport_stop().encode(), vec![0x90, 0x5D, 0x7F]);
        assert_eq!(transport_record().encode(), vec![0x90, 0x5F, 0x7F]);
    }

    #[test]
    fn test_master_volume() {
        let msg = set_master_volume(100, FaderCurve::Centered);
        assert_eq!(msg.encode(), vec![0xE8, 0x00, 0x40]);
    }
}
