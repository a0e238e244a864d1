//! MCU Mirror - Mackie Control protocol decoder and live session state
//!
//! Listens to an MCU-speaking MIDI port, decodes fader, button, V-Pot, and
//! SysEx traffic, and maintains a queryable aggregate of the mixer session:
//! per-track levels and buttons, transport, LCD text, and meters.

pub mod commands;
pub mod config;
pub mod events;
pub mod feed;
pub mod mcu;
pub mod midi;
pub mod service;
pub mod sniffer;
pub mod state;
pub mod surface;

pub use config::AppConfig;
pub use events::{EventBus, McuEvent};
pub use mcu::McuDecoder;
pub use state::{SessionStore, StateError};
