//! Channel fader decoding (pitch-bend messages)

use tracing::debug;

use super::addresses::MASTER_FADER_INDEX;
use crate::events::McuEvent;
use crate::midi::join_14bit;

impl super::McuDecoder {
    /// Decode a pitch-bend fader move
    ///
    /// Channel nibbles 0-7 address the strips, 8 the master fader; anything
    /// above is out of range and discarded.
    pub(super) fn decode_fader(&self, channel_index: u8, raw: &[u8]) -> Option<McuEvent> {
        if raw.len() < 3 || channel_index > MASTER_FADER_INDEX {
            return None;
        }

        let value = join_14bit(raw[1], raw[2]);
        let percent = self.profile.fader_curve.percent(value);

        if channel_index == MASTER_FADER_INDEX {
            self.store.apply_master_fader(value, percent);
            debug!("Master fader: {}%", percent);
            return Some(McuEvent::MasterFader { value, percentage: percent });
        }

        let channel = channel_index + 1;
        self.store.apply_fader(channel, value, percent).ok()?;
        debug!("Fader {}: {}%", channel, percent);
        Some(McuEvent::Fader { channel, value, percentage: percent })
    }
}
