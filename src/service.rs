//! Decode loop
//!
//! Single consumer of the driver's raw event queue. Processing one message at
//! a time keeps decode-and-mutate atomic and preserves arrival order, which
//! SysEx reassembly depends on.

use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::EventBus;
use crate::mcu::McuDecoder;
use crate::surface::SurfaceEvent;

/// Drain raw surface events through the decoder until shutdown
pub async fn run_decode_loop(
    mut events: mpsc::Receiver<SurfaceEvent>,
    mut decoder: McuDecoder,
    bus: EventBus,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Decode loop started");

    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => {
                        if let Some(decoded) = decoder.feed(&event.raw_data) {
                            bus.emit(decoded);
                        }
                    }
                    None => {
                        debug!("Surface event channel closed");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Decode loop stopped");
}
