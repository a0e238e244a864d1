//! MIDI sniffer for debugging and development
//!
//! Prints raw traffic in hex next to the decoded MCU interpretation, so a
//! surface or DAW port can be inspected without wiring up the full service.

use anyhow::Result;
use colored::*;
use midir::{MidiInput, MidiInputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{DecodingProfile, SysexConfig};
use crate::events::McuEvent;
use crate::mcu::McuDecoder;
use crate::midi::{format_hex, MidiMessage};
use crate::state::SessionStore;
use crate::surface::SurfaceDriver;

/// Sniffed MIDI event
#[derive(Debug, Clone)]
struct SnifferEvent {
    timestamp_ms: u64,
    port_name: String,
    data: Vec<u8>,
}

/// CLI MIDI sniffer
pub async fn run_cli_sniffer(pattern: Option<&str>) -> Result<()> {
    println!("{}", "=== MCU Sniffer ===".bold().cyan());
    println!("Press Ctrl+C to exit\n");

    list_ports_formatted();

    let mut sniffer = CliSniffer::new();

    match pattern {
        Some(pattern) if !pattern.is_empty() => sniffer.connect_input(pattern)?,
        _ => sniffer.connect_all_inputs()?,
    }

    println!("\n{}", "Monitoring MIDI traffic...".green());
    println!(
        "{}",
        "Format: [timestamp] PORT | HEX => DECODED".dimmed()
    );
    println!("{}\n", "─".repeat(80).dimmed());

    sniffer.run().await
}

struct CliSniffer {
    connections: Vec<MidiInputConnection<()>>,
    event_rx: mpsc::Receiver<SnifferEvent>,
    event_tx: mpsc::Sender<SnifferEvent>,
    decoder: McuDecoder,
    running: Arc<AtomicBool>,
    start_time: Instant,
}

impl CliSniffer {
    fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);

        Self {
            connections: Vec::new(),
            event_rx,
            event_tx,
            decoder: McuDecoder::new(
                SessionStore::new(),
                DecodingProfile::default(),
                SysexConfig::default(),
            ),
            running: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
        }
    }

    fn connect_input(&mut self, pattern: &str) -> Result<()> {
        let midi_in = MidiInput::new("MCU-Sniffer")?;

        // A numeric pattern selects a port by index
        if let Ok(index) = pattern.parse::<usize>() {
            if let Some(port) = midi_in.ports().into_iter().nth(index) {
                if let Ok(name) = midi_in.port_name(&port) {
                    self.connect_port(midi_in, port, &name)?;
                    return Ok(());
                }
            }
            anyhow::bail!("No port found at index: {}", index)
        }

        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                if name.to_lowercase().contains(&pattern.to_lowercase()) {
                    self.connect_port(midi_in, port, &name)?;
                    return Ok(());
                }
            }
        }
        anyhow::bail!("No port found matching pattern: {}", pattern)
    }

    fn connect_all_inputs(&mut self) -> Result<()> {
        let names = SurfaceDriver::list_input_ports()?;

        for (index, name) in names.iter().enumerate() {
            let midi_in = MidiInput::new(&format!("Sniffer-{}", index))?;
            if let Some(port) = midi_in.ports().into_iter().nth(index) {
                self.connect_port(midi_in, port, name)?;
            }
        }

        if self.connections.is_empty() {
            anyhow::bail!("No MIDI input ports found");
        }

        Ok(())
    }

    fn connect_port(
        &mut self,
        midi_in: MidiInput,
        port: midir::MidiInputPort,
        port_name: &str,
    ) -> Result<()> {
        let event_tx = self.event_tx.clone();
        let port_name = port_name.to_string();
        let start_time = self.start_time;

        info!("Connecting to: {}", port_name);

        let conn = midi_in.connect(
            &port,
            "Sniffer",
            move |_timestamp, data, _| {
                let timestamp_ms = start_time.elapsed().as_millis() as u64;

                let event = SnifferEvent {
                    timestamp_ms,
                    port_name: port_name.clone(),
                    data: data.to_vec(),
                };

                let _ = event_tx.try_send(event);
            },
            (),
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?;

        self.connections.push(conn);
        Ok(())
    }

    async fn run(mut self) -> Result<()> {
        let running = self.running.clone();

        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            running.store(false, Ordering::Relaxed);
        });

        while self.running.load(Ordering::Relaxed) {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    self.print_event(&event);
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {}
            }
        }

        println!("\n{}", "Sniffer stopped".yellow());
        Ok(())
    }

    fn print_event(&mut self, event: &SnifferEvent) {
        let timestamp = format!("{:08}", event.timestamp_ms);
        let port = if event.port_name.len() > 20 {
            format!("{}...", &event.port_name[..17])
        } else {
            event.port_name.clone()
        };

        let hex = format_hex(&event.data);
        let hex_colored = match MidiMessage::parse(&event.data) {
            Some(MidiMessage::NoteOn { .. }) => hex.bright_green(),
            Some(MidiMessage::NoteOff { .. }) => hex.bright_red(),
            Some(MidiMessage::ControlChange { .. }) => hex.bright_yellow(),
            Some(MidiMessage::PitchBend { .. }) => hex.bright_cyan(),
            Some(MidiMessage::SysEx { .. }) => hex.bright_magenta(),
            None => hex.bright_black(),
        };

        let decoded = match self.decoder.feed_at(&event.data, event.timestamp_ms) {
            Some(mcu_event) => format!(" => {}", describe(&mcu_event).bright_blue()),
            None => String::new(),
        };

        println!(
            "[{}ms] {:20} | {}{}",
            timestamp.dimmed(),
            port.white(),
            hex_colored,
            decoded
        );
    }
}

fn describe(event: &McuEvent) -> String {
    match event {
        McuEvent::Fader { channel, value, percentage } => {
            format!("Fader {} = {} ({}%)", channel, value, percentage)
        }
        McuEvent::MasterFader { value, percentage } => {
            format!("Master fader = {} ({}%)", value, percentage)
        }
        McuEvent::Button { action, channel, pressed } => {
            format!("{:?} {} {}", action, channel, if *pressed { "DOWN" } else { "UP" })
        }
        McuEvent::Transport { action, pressed } => {
            format!("Transport {:?} {}", action, if *pressed { "DOWN" } else { "UP" })
        }
        McuEvent::Encoder { channel, delta, value } => {
            format!("V-Pot {} {:+} (pan {})", channel, delta, value)
        }
        McuEvent::Touch { channel, touched } => {
            format!("Touch {} {}", channel, if *touched { "DOWN" } else { "UP" })
        }
        McuEvent::Display { row, channel, text, .. } => {
            format!("LCD row {} strip {}: {:?}", row, channel, text)
        }
        McuEvent::Meter { channel, level } => format!("Meter {} = {}", channel, level),
        McuEvent::TimeDisplay { time } => format!("Time: {}", time),
        McuEvent::Unhandled { status } => format!("Unhandled status {:#04X}", status),
    }
}

/// List all ports in a formatted way
pub fn list_ports_formatted() {
    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    if let Ok(inputs) = SurfaceDriver::list_input_ports() {
        println!("\n{}", "Input Ports:".bold());
        if inputs.is_empty() {
            println!("  {}", "No input ports found".dimmed());
        } else {
            for (index, name) in inputs.iter().enumerate() {
                println!("  [{}] {}", index, name);
            }
        }
    }

    if let Ok(outputs) = SurfaceDriver::list_output_ports() {
        println!("\n{}", "Output Ports:".bold());
        if outputs.is_empty() {
            println!("  {}", "No output ports found".dimmed());
        } else {
            for (index, name) in outputs.iter().enumerate() {
                println!("  [{}] {}", index, name);
            }
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_covers_every_event() {
        let text = describe(&McuEvent::Fader { channel: 1, value: 8192, percentage: 100 });
        assert!(text.contains("100%"));

        let text = describe(&McuEvent::TimeDisplay { time: "001 01 01".into() });
        assert!(text.contains("001 01 01"));
    }
}
