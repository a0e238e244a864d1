//! Session state module - live mixer state mirrored from the control surface
//!
//! This module owns the single mutable aggregate all decoders write into and
//! all consumers read from: tracks, transport, displays, meters, V-Pots,
//! button mirrors, and session bookkeeping (staleness, connection status).

mod store;
mod types;

pub use store::{now_ms, SessionStore};
pub use types::{
    Buttons, CompatibleTrack, CompleteState, ConnectionStatus, Display, Health, MasterFader,
    MasterMeter, Meters, Session, SessionMeta, SessionState, StateError, Summary, TimeSignature,
    Track, TrackButtons, TrackMeter, Transport, TransportButtons, TransportPosition, VPot,
    VPotMode, TRACK_COUNT,
};
