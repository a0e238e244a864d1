//! SysEx reassembly and field decoding
//!
//! The transport can split one logical SysEx packet across several
//! deliveries. `SysexReassembler` concatenates fragments between the start
//! and end markers; the field decoder then dispatches on the packet's
//! sub-identifier to update LCD text, meters, or the time display.

use thiserror::Error;
use tracing::{debug, trace};

use super::addresses::{
    LCD_CELL_WIDTH, LCD_ROW_WIDTH, MCU_MANUFACTURER, SUB_ID_LCD, SUB_ID_METER_BANK, SUB_ID_TIME,
    TIME_DISPLAY_BYTES,
};
use crate::events::McuEvent;
use crate::midi::{SYSEX_END, SYSEX_START};
use crate::state::TRACK_COUNT;

/// Reassembly failures; the buffered fragments are discarded in every case
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SysexError {
    #[error("incomplete packet discarded after {elapsed_ms}ms (limit {timeout_ms}ms)")]
    Timeout { elapsed_ms: u64, timeout_ms: u64 },

    #[error("packet of {len} bytes exceeds the {max}-byte cap")]
    Overflow { len: usize, max: usize },
}

/// Two-state fragment collector: Idle until a start marker arrives, then
/// Collecting until a fragment carries the end marker.
///
/// An unbounded collect is a hang waiting to happen, so a stuck buffer is
/// bounded both by age and by size; expiry surfaces as a malformed-packet
/// error instead of silence.
pub struct SysexReassembler {
    buffer: Vec<u8>,
    collecting: bool,
    started_at_ms: u64,
    timeout_ms: u64,
    max_len: usize,
}

impl SysexReassembler {
    pub fn new(timeout_ms: u64, max_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            collecting: false,
            started_at_ms: 0,
            timeout_ms,
            max_len,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Start a new packet from a fragment beginning with the start marker
    ///
    /// Returns the complete packet immediately when the fragment also
    /// carries the end marker.
    pub fn begin(&mut self, fragment: &[u8], ts: u64) -> Result<Option<Vec<u8>>, SysexError> {
        debug_assert_eq!(fragment.first(), Some(&SYSEX_START));
        self.discard();

        if fragment.len() > self.max_len {
            return Err(SysexError::Overflow { len: fragment.len(), max: self.max_len });
        }

        self.buffer.extend_from_slice(fragment);
        self.started_at_ms = ts;

        if fragment.contains(&SYSEX_END) {
            Ok(Some(self.complete()))
        } else {
            self.collecting = true;
            Ok(None)
        }
    }

    /// Append a continuation fragment while collecting
    pub fn append(&mut self, fragment: &[u8], ts: u64) -> Result<Option<Vec<u8>>, SysexError> {
        let elapsed_ms = ts.saturating_sub(self.started_at_ms);
        if elapsed_ms > self.timeout_ms {
            self.discard();
            return Err(SysexError::Timeout { elapsed_ms, timeout_ms: self.timeout_ms });
        }

        let len = self.buffer.len() + fragment.len();
        if len > self.max_len {
            self.discard();
            return Err(SysexError::Overflow { len, max: self.max_len });
        }

        self.buffer.extend_from_slice(fragment);

        if fragment.contains(&SYSEX_END) {
            Ok(Some(self.complete()))
        } else {
            Ok(None)
        }
    }

    fn complete(&mut self) -> Vec<u8> {
        self.collecting = false;
        std::mem::take(&mut self.buffer)
    }

    fn discard(&mut self) {
        self.buffer.clear();
        self.collecting = false;
    }
}

impl super::McuDecoder {
    /// Decode one reassembled SysEx packet
    ///
    /// Packets without the recognized manufacturer prefix are rejected with
    /// no state change.
    pub(super) fn decode_packet(&self, packet: &[u8]) -> Option<McuEvent> {
        if packet.len() < 7 || packet[0] != SYSEX_START || packet[1..4] != MCU_MANUFACTURER {
            debug!("Rejected SysEx without MCU prefix ({} bytes)", packet.len());
            return None;
        }

        let sub_id = packet[5];
        if sub_id == SUB_ID_LCD {
            self.decode_lcd(packet)
        } else if sub_id & 0xF0 == SUB_ID_METER_BANK {
            self.decode_meter(sub_id, packet)
        } else if sub_id == SUB_ID_TIME {
            self.decode_time(packet)
        } else {
            trace!("Unrecognized SysEx sub-id: {:#04X}", sub_id);
            None
        }
    }

    /// LCD text: the offset byte addresses a cell in two 56-character rows,
    /// 7 characters per strip. Row 0 carries track names, row 1 the lower
    /// line.
    fn decode_lcd(&self, packet: &[u8]) -> Option<McuEvent> {
        let offset = packet[6];
        // MIDI data bytes are 7-bit; anything with the high bit set is
        // corruption, not text.
        let text: String = packet[7..]
            .iter()
            .take_while(|&&b| b != SYSEX_END)
            .filter(|&&b| b < 0x80)
            .map(|&b| b as char)
            .collect();
        let text = text.trim().to_string();

        let row = offset / LCD_ROW_WIDTH;
        let col = offset % LCD_ROW_WIDTH;
        let channel = col / LCD_CELL_WIDTH + 1;

        if channel as usize > TRACK_COUNT {
            trace!("LCD offset {} addresses no strip", offset);
            return None;
        }

        match row {
            0 => {
                self.store.set_track_name(channel, &text).ok()?;
                debug!("Track {} name: {:?}", channel, text);
            }
            1 => {
                self.store.set_lower_line(channel, &text).ok()?;
                debug!("Track {} lower line: {:?}", channel, text);
            }
            _ => return None,
        }

        Some(McuEvent::Display { row, channel, text, offset })
    }

    /// Meter level: channel in the sub-id's low nibble, level in the first
    /// payload byte. Clip latching happens in the store.
    fn decode_meter(&self, sub_id: u8, packet: &[u8]) -> Option<McuEvent> {
        let channel = (sub_id & 0x0F) + 1;
        if channel as usize > TRACK_COUNT {
            return None;
        }

        // A 7-byte packet ends right after the sub-id; there is no level byte
        // and packet[6] would read the end marker.
        if packet.len() < 8 {
            debug!("Meter packet without a level byte");
            return None;
        }

        let level = packet[6];
        if level > 0x7F {
            debug!("Meter level {:#04X} is not a data byte", level);
            return None;
        }

        self.store.set_meter_level(channel, level).ok()?;
        debug!("Meter {}: {}", channel, level);
        Some(McuEvent::Meter { channel, level })
    }

    /// Time display: a fixed 10-byte run where 0x00 reads as blank. Also
    /// parses a bars/beats/ticks numeric run when the display carries one.
    fn decode_time(&self, packet: &[u8]) -> Option<McuEvent> {
        if packet.len() < 6 + TIME_DISPLAY_BYTES + 1 {
            return None;
        }

        let time: String = packet[6..6 + TIME_DISPLAY_BYTES]
            .iter()
            .map(|&b| if b == 0x00 { ' ' } else { b as char })
            .collect();
        let time = time.trim().to_string();

        self.store.set_time_display(&time);

        if let Some((bars, beats, ticks)) = parse_bars_beats_ticks(&time) {
            self.store.set_position(bars, beats, ticks);
        }

        debug!("Time display: {}", time);
        Some(McuEvent::TimeDisplay { time })
    }
}

/// Parse a `bars beats ticks` triple from a display string of at least four
/// whitespace-separated numeric fields (the fourth is sub-division, unused)
fn parse_bars_beats_ticks(text: &str) -> Option<(u32, u32, u32)> {
    let fields: Vec<u32> = text
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() >= 4 {
        Some((fields[0], fields[1], fields[2]))
    } else {
        None
    }
}
