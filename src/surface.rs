//! Control-surface MIDI driver
//!
//! Handles MIDI communication with the MCU-speaking surface or DAW port.
//! Incoming bytes are forwarded raw: SysEx packets may arrive fragmented and
//! only the decoder's reassembler can frame them.

use anyhow::{Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::midi::{format_hex, MidiMessage};

/// Raw MIDI event from the surface
#[derive(Debug, Clone)]
pub struct SurfaceEvent {
    pub timestamp: Instant,
    pub raw_data: Vec<u8>,
}

/// MIDI driver for the mirrored surface
pub struct SurfaceDriver {
    input_conn: Option<MidiInputConnection<()>>,
    output_conn: Option<Arc<Mutex<MidiOutputConnection>>>,

    /// Event sender for incoming MIDI
    event_tx: mpsc::Sender<SurfaceEvent>,
    event_rx: Option<mpsc::Receiver<SurfaceEvent>>,

    /// Port name patterns, matched as case-insensitive substrings
    input_port_name: String,
    output_port_name: String,
}

impl SurfaceDriver {
    pub fn new(config: &AppConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);

        Self {
            input_conn: None,
            output_conn: None,
            event_tx,
            event_rx: Some(event_rx),
            input_port_name: config.midi.input_port.clone(),
            output_port_name: config.midi.output_port.clone(),
        }
    }

    /// List available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("MCU-Mirror-Scanner")?;

        let mut port_names = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                port_names.push(name);
            }
        }

        Ok(port_names)
    }

    /// List available MIDI output ports
    pub fn list_output_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("MCU-Mirror-Scanner")?;

        let mut port_names = Vec::new();
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                port_names.push(name);
            }
        }

        Ok(port_names)
    }

    fn find_input_port(
        midi_in: &MidiInput,
        pattern: &str,
    ) -> Option<(midir::MidiInputPort, String)> {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                if name.to_lowercase().contains(&pattern.to_lowercase()) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    fn find_output_port(
        midi_out: &MidiOutput,
        pattern: &str,
    ) -> Option<(midir::MidiOutputPort, String)> {
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                if name.to_lowercase().contains(&pattern.to_lowercase()) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    /// Connect to the configured MIDI ports
    pub fn connect(&mut self) -> Result<()> {
        self.disconnect();

        info!(
            "Connecting MIDI - Input: '{}', Output: '{}'",
            self.input_port_name, self.output_port_name
        );

        let midi_in = MidiInput::new("MCU-Mirror-Input").context("Failed to create MIDI input")?;
        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, port_name) = Self::find_input_port(&midi_in, &self.input_port_name)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", self.input_port_name))?;

        info!("Connecting to input port: {}", port_name);

        let event_tx = self.event_tx.clone();

        let input_conn = midi_in
            .connect(
                &in_port,
                "MCU-Mirror",
                move |_timestamp, data, _| {
                    let event = SurfaceEvent {
                        timestamp: Instant::now(),
                        raw_data: data.to_vec(),
                    };

                    // Never block or panic inside the MIDI callback
                    let _ = event_tx.try_send(event);
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        self.input_conn = Some(input_conn);

        let midi_out =
            MidiOutput::new("MCU-Mirror-Output").context("Failed to create MIDI output")?;
        debug!("Found {} MIDI output ports", midi_out.port_count());

        let (out_port, port_name) = Self::find_output_port(&midi_out, &self.output_port_name)
            .ok_or_else(|| anyhow::anyhow!("Output port '{}' not found", self.output_port_name))?;

        info!("Connecting to output port: {}", port_name);

        let output_conn = midi_out
            .connect(&out_port, "MCU-Mirror")
            .map_err(|e| anyhow::anyhow!("Failed to connect to output port: {}", e))?;

        self.output_conn = Some(Arc::new(Mutex::new(output_conn)));

        info!("MIDI connected");
        Ok(())
    }

    /// Drop both port connections
    pub fn disconnect(&mut self) {
        self.input_conn = None;
        self.output_conn = None;
    }

    pub fn is_connected(&self) -> bool {
        self.input_conn.is_some()
    }

    /// Send an encoded message out the DAW-facing port
    pub fn send(&self, message: &MidiMessage) -> Result<()> {
        let data = message.encode();
        self.send_raw(&data)?;
        debug!("Sent: {} | {}", format_hex(&data), message);
        Ok(())
    }

    /// Send raw MIDI bytes
    pub fn send_raw(&self, data: &[u8]) -> Result<()> {
        let output = self
            .output_conn
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not connected to output port"))?;

        let mut conn = output.lock();
        conn.send(data).context("Failed to send MIDI message")?;
        Ok(())
    }

    /// Take the event receiver (for the decode loop to consume)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<SurfaceEvent>> {
        self.event_rx.take()
    }
}
