//! MCU protocol decoder
//!
//! Classifies raw control-surface messages by status byte and dispatches to
//! the fader, button, rotary/touch, or SysEx decoding paths. All decoded
//! fields land in the [`SessionStore`]; each successful decode yields one
//! [`McuEvent`].

pub mod addresses;
mod buttons;
mod fader;
mod sysex;
mod vpot;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use tracing::{trace, warn};

use crate::config::{DecodingProfile, SysexConfig};
use crate::events::McuEvent;
use crate::midi::SYSEX_START;
use crate::state::{now_ms, SessionStore};

pub use sysex::{SysexError, SysexReassembler};

/// Stateful decoder for one inbound message stream
///
/// Messages must be fed strictly in arrival order; decode-and-mutate is one
/// indivisible unit per message. The decoder holds the SysEx reassembler and
/// the button echo-suppression table, so it is deliberately not `Clone`.
pub struct McuDecoder {
    store: SessionStore,
    profile: DecodingProfile,
    reassembler: SysexReassembler,
    /// Last observation timestamp per (note, pressed), for echo suppression
    button_seen: HashMap<(u8, bool), u64>,
}

impl McuDecoder {
    pub fn new(store: SessionStore, profile: DecodingProfile, sysex: SysexConfig) -> Self {
        Self {
            store,
            profile,
            reassembler: SysexReassembler::new(sysex.timeout_ms, sysex.max_packet_bytes),
            button_seen: HashMap::new(),
        }
    }

    /// Decode one raw message, mutating the store
    ///
    /// Returns `None` for fragments still being reassembled and for malformed
    /// or out-of-range input (which never mutates the store).
    pub fn feed(&mut self, raw: &[u8]) -> Option<McuEvent> {
        self.feed_at(raw, now_ms())
    }

    /// [`feed`](Self::feed) with an explicit timestamp, for replay streams
    pub fn feed_at(&mut self, raw: &[u8], ts: u64) -> Option<McuEvent> {
        if raw.is_empty() {
            return None;
        }

        // A collecting reassembler consumes every message until the end
        // marker (or expiry) regardless of its leading byte.
        if self.reassembler.is_collecting() {
            return match self.reassembler.append(raw, ts) {
                Ok(Some(packet)) => self.decode_packet(&packet),
                Ok(None) => None,
                Err(err) => {
                    warn!("SysEx reassembly aborted: {}", err);
                    // The stale buffer is gone; reclassify this message.
                    self.feed_at(raw, ts)
                }
            };
        }

        if raw[0] == SYSEX_START {
            return match self.reassembler.begin(raw, ts) {
                Ok(Some(packet)) => self.decode_packet(&packet),
                Ok(None) => None,
                Err(err) => {
                    warn!("SysEx fragment rejected: {}", err);
                    None
                }
            };
        }

        let status = raw[0];
        match status & 0xF0 {
            0xE0 => self.decode_fader(status & 0x0F, raw),
            0x80 | 0x90 => self.decode_button(raw, ts),
            0xB0 => self.decode_control(raw),
            _ => {
                trace!("Unhandled status byte: {:#04X}", status);
                Some(McuEvent::Unhandled { status })
            }
        }
    }

    /// Shared store handle this decoder writes into
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
