//! MIDI utilities and message types
//!
//! Provides parsing, encoding, and value conversions for the MIDI subset
//! the MCU protocol actually uses: notes, control changes, pitch bend, SysEx.

use std::fmt;

/// SysEx start marker
pub const SYSEX_START: u8 = 0xF0;
/// SysEx end marker
pub const SYSEX_END: u8 = 0xF7;

/// MIDI message types understood by the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Pitch Bend: channel (0-15), value (0-16383, 14-bit)
    PitchBend { channel: u8, value: u16 },

    /// System Exclusive: data bytes between the start/end markers
    SysEx { data: Vec<u8> },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    ///
    /// Returns `None` for truncated messages and for status bytes outside
    /// the MCU subset (clock, active sensing, running status, ...).
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let status = data[0];

        // Running status (data byte first) is not maintained here
        if status < 0x80 {
            return None;
        }

        if status == SYSEX_START {
            // Complete SysEx only; fragment reassembly lives in mcu::sysex
            let end = data.iter().position(|&b| b == SYSEX_END)?;
            return Some(MidiMessage::SysEx {
                data: data[1..end].to_vec(),
            });
        }

        if status >= 0xF0 {
            return None;
        }

        let message_type = status & 0xF0;
        let channel = status & 0x0F;

        match message_type {
            0x80 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::NoteOff {
                    channel,
                    note: data[1] & 0x7F,
                    velocity: data[2] & 0x7F,
                })
            }
            0x90 => {
                // Note On with velocity 0 = Note Off
                if data.len() < 3 {
                    return None;
                }
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;

                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(MidiMessage::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::ControlChange {
                    channel,
                    cc: data[1] & 0x7F,
                    value: data[2] & 0x7F,
                })
            }
            0xE0 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::PitchBend {
                    channel,
                    value: join_14bit(data[1], data[2]),
                })
            }
            _ => None,
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::PitchBend { channel, value } => {
                let (lsb, msb) = split_14bit(value);
                vec![0xE0 | (channel & 0x0F), lsb, msb]
            }
            MidiMessage::SysEx { ref data } => {
                let mut result = vec![SYSEX_START];
                result.extend_from_slice(data);
                result.push(SYSEX_END);
                result
            }
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "PitchBend ch:{} v:{}", channel + 1, value)
            }
            MidiMessage::SysEx { ref data } => {
                write!(f, "SysEx {} bytes", data.len())
            }
        }
    }
}

/// Join two 7-bit data bytes into a 14-bit value (LSB first, pitch-bend order)
pub fn join_14bit(lsb: u8, msb: u8) -> u16 {
    (((msb & 0x7F) as u16) << 7) | ((lsb & 0x7F) as u16)
}

/// Split a 14-bit value into (LSB, MSB) data bytes
pub fn split_14bit(value: u16) -> (u8, u8) {
    ((value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8)
}

/// Fader value conversions
///
/// Two incompatible percent curves exist on real surfaces and hosts. The
/// centered curve treats the 14-bit value as a pitch-bend-style excursion and
/// saturates at full scale; the legacy curve maps the raw domain linearly.
/// Which one is active is a [`crate::config::DecodingProfile`] choice.
pub mod convert {
    /// Centered curve: `round((value + 8192) / 16384 * 100)`, saturating at 100.
    ///
    /// Center-detent value 8192 reads as 100%.
    pub fn centered_percent(value: u16) -> u8 {
        let pct = ((value as f64 + 8192.0) / 16384.0 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Inverse of [`centered_percent`], clamped to the 14-bit domain
    pub fn centered_fader_value(percent: u8) -> u16 {
        let raw = (percent.min(100) as f64 / 100.0 * 16384.0 - 8192.0).round();
        raw.clamp(0.0, 16383.0) as u16
    }

    /// Legacy linear curve: `round(value / 16383 * 100)`
    pub fn legacy_percent(value: u16) -> u8 {
        ((value.min(16383) as f64 / 16383.0) * 100.0).round() as u8
    }

    /// Inverse of [`legacy_percent`]
    pub fn legacy_fader_value(percent: u8) -> u16 {
        ((percent.min(100) as f64 / 100.0) * 16383.0).round() as u16
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
