//! Button decoding (note on/off messages)
//!
//! Note-on with non-zero velocity means pressed; note-on with zero velocity
//! and note-off both mean released.

use tracing::{debug, trace};

use super::addresses::{
    MUTE_BASE, MUTE_END, REC_ARM_BASE, REC_ARM_END, SELECT_BASE, SELECT_END, SOLO_BASE, SOLO_END,
    TRANSPORT_PLAY, TRANSPORT_RECORD, TRANSPORT_STOP,
};
use crate::events::{ButtonAction, McuEvent, TransportAction};

impl super::McuDecoder {
    pub(super) fn decode_button(&mut self, raw: &[u8], ts: u64) -> Option<McuEvent> {
        if raw.len() < 3 {
            return None;
        }

        let note = raw[1];
        let pressed = (raw[0] & 0xF0) == 0x90 && raw[2] > 0;

        // Hardware/driver echo can deliver the same press twice in the same
        // instant; process it once.
        if self.is_duplicate(note, pressed, ts) {
            debug!("Suppressed duplicate button echo: note={:#04X}", note);
            return None;
        }

        match note {
            REC_ARM_BASE..=REC_ARM_END => {
                let channel = note - REC_ARM_BASE + 1;
                self.store.set_record_arm(channel, pressed).ok()?;
                debug!("Record {}: {}", channel, if pressed { "ARM" } else { "DISARM" });
                Some(McuEvent::Button { action: ButtonAction::Record, channel, pressed })
            }
            SOLO_BASE..=SOLO_END => {
                let channel = note - SOLO_BASE + 1;
                self.store.set_solo(channel, pressed).ok()?;
                debug!("Solo {}: {}", channel, if pressed { "ON" } else { "OFF" });
                Some(McuEvent::Button { action: ButtonAction::Solo, channel, pressed })
            }
            MUTE_BASE..=MUTE_END => {
                let channel = note - MUTE_BASE + 1;
                self.store.set_mute(channel, pressed).ok()?;
                debug!("Mute {}: {}", channel, if pressed { "ON" } else { "OFF" });
                Some(McuEvent::Button { action: ButtonAction::Mute, channel, pressed })
            }
            SELECT_BASE..=SELECT_END => {
                let channel = note - SELECT_BASE + 1;
                self.store.select_track(channel, pressed).ok()?;
                debug!("Select {}: {}", channel, if pressed { "ON" } else { "OFF" });
                Some(McuEvent::Button { action: ButtonAction::Select, channel, pressed })
            }
            TRANSPORT_PLAY => {
                self.store.set_transport_play(pressed);
                debug!("Transport PLAY: {}", if pressed { "START" } else { "STOP" });
                Some(McuEvent::Transport { action: TransportAction::Play, pressed })
            }
            TRANSPORT_STOP => {
                self.store.set_transport_stop(pressed);
                debug!("Transport STOP");
                Some(McuEvent::Transport { action: TransportAction::Stop, pressed })
            }
            TRANSPORT_RECORD => {
                self.store.set_transport_record(pressed);
                debug!("Transport RECORD: {}", if pressed { "START" } else { "STOP" });
                Some(McuEvent::Transport { action: TransportAction::Record, pressed })
            }
            _ => {
                trace!("Note outside the MCU map: {:#04X}", note);
                None
            }
        }
    }

    /// True if the identical (note, pressed) pair was already seen at `ts`
    fn is_duplicate(&mut self, note: u8, pressed: bool, ts: u64) -> bool {
        matches!(
            self.button_seen.insert((note, pressed), ts),
            Some(prev) if prev == ts
        )
    }
}
