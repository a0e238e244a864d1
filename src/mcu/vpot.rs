//! Rotary encoder and fader-touch decoding (control-change messages)

use tracing::{debug, trace};

use super::addresses::{TOUCH_BASE, TOUCH_END, VPOT_BASE, VPOT_END, VPOT_DIRECTION_BIT};
use crate::events::McuEvent;

impl super::McuDecoder {
    pub(super) fn decode_control(&self, raw: &[u8]) -> Option<McuEvent> {
        if raw.len() < 3 {
            return None;
        }

        let cc = raw[1];
        let value = raw[2];

        match cc {
            VPOT_BASE..=VPOT_END => {
                let channel = cc - VPOT_BASE + 1;
                let direction: i16 = if value & VPOT_DIRECTION_BIT != 0 { -1 } else { 1 };
                let speed = (value & self.profile.vpot_speed.mask()) as i16;
                let delta = direction * speed;

                let pan = self.store.nudge_pan(channel, delta).ok()?;
                debug!("V-Pot {}: {:+} (pan: {})", channel, delta, pan);
                Some(McuEvent::Encoder { channel, delta, value: pan })
            }
            TOUCH_BASE..=TOUCH_END => {
                let channel = cc - TOUCH_BASE + 1;
                let touched = value > 0;
                self.store.set_fader_touch(channel, touched).ok()?;
                debug!("Touch {}: {}", channel, if touched { "DOWN" } else { "UP" });
                Some(McuEvent::Touch { channel, touched })
            }
            _ => {
                trace!("CC outside the MCU map: {:#04X}", cc);
                None
            }
        }
    }
}
