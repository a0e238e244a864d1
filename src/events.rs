//! Normalized decode events and the fire-and-forget event bus
//!
//! Every successful decode becomes one `McuEvent`, serialized with the same
//! `{ "type": ... }` tagging external subscribers already consume.

use serde::Serialize;
use tokio::sync::broadcast;

/// Per-track button kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAction {
    Record,
    Solo,
    Mute,
    Select,
}

/// Transport button kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportAction {
    Play,
    Stop,
    Record,
}

/// One decoded protocol event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum McuEvent {
    Fader {
        channel: u8,
        value: u16,
        percentage: u8,
    },
    MasterFader {
        value: u16,
        percentage: u8,
    },
    Button {
        action: ButtonAction,
        channel: u8,
        pressed: bool,
    },
    Transport {
        action: TransportAction,
        pressed: bool,
    },
    Encoder {
        channel: u8,
        delta: i16,
        value: u8,
    },
    Touch {
        channel: u8,
        touched: bool,
    },
    Display {
        row: u8,
        channel: u8,
        text: String,
        offset: u8,
    },
    Meter {
        channel: u8,
        level: u8,
    },
    TimeDisplay {
        time: String,
    },
    /// Observability only; nothing in the store was mutated
    Unhandled {
        status: u8,
    },
}

/// Broadcast bus for decoded events
///
/// `emit` never blocks the decode path: with no subscribers the event is
/// dropped, and a slow subscriber lags (skipping events) rather than stalling
/// message processing.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<McuEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget publish
    pub fn emit(&self, event: McuEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<McuEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
