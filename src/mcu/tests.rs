//! Tests for the MCU decoder pipeline

use super::*;
use crate::config::{DecodingProfile, FaderCurve, SysexConfig, VpotSpeedWidth};
use crate::events::{ButtonAction, TransportAction};
use proptest::prelude::*;

fn make_decoder() -> McuDecoder {
    McuDecoder::new(
        SessionStore::new(),
        DecodingProfile::default(),
        SysexConfig::default(),
    )
}

fn make_decoder_with(profile: DecodingProfile, sysex: SysexConfig) -> McuDecoder {
    McuDecoder::new(SessionStore::new(), profile, sysex)
}

/// Build an LCD SysEx packet writing `text` at `offset`
fn lcd_packet(offset: u8, text: &str) -> Vec<u8> {
    let mut packet = vec![0xF0, 0x00, 0x00, 0x66, 0x14, 0x12, offset];
    packet.extend_from_slice(text.as_bytes());
    packet.push(0xF7);
    packet
}

#[test]
fn test_fader_center_is_full_scale() {
    // Pitch bend on channel nibble 3 with value 0x2000 = 8192
    let mut decoder = make_decoder();
    let event = decoder.feed(&[0xE3, 0x00, 0x40]).unwrap();

    assert_eq!(event, McuEvent::Fader { channel: 4, value: 8192, percentage: 100 });
    let track = decoder.store().track(4).unwrap();
    assert_eq!(track.volume, 8192);
    assert_eq!(track.volume_percent, 100);
}

#[test]
fn test_fader_legacy_curve() {
    let profile = DecodingProfile {
        fader_curve: FaderCurve::Legacy,
        vpot_speed: VpotSpeedWidth::Six,
    };
    let mut decoder = make_decoder_with(profile, SysexConfig::default());

    let event = decoder.feed(&[0xE0, 0x7F, 0x7F]).unwrap();
    assert_eq!(event, McuEvent::Fader { channel: 1, value: 16383, percentage: 100 });

    let event = decoder.feed(&[0xE0, 0x00, 0x00]).unwrap();
    assert_eq!(event, McuEvent::Fader { channel: 1, value: 0, percentage: 0 });
}

#[test]
fn test_master_fader_does_not_touch_tracks() {
    let mut decoder = make_decoder();
    let event = decoder.feed(&[0xE8, 0x00, 0x40]).unwrap();
    assert_eq!(event, McuEvent::MasterFader { value: 8192, percentage: 100 });

    let state = decoder.store().complete_state().state;
    assert_eq!(state.master_fader.volume, 8192);
    assert!(state.tracks.iter().all(|t| t.volume == 0));
}

#[test]
fn test_fader_channel_out_of_range_discarded() {
    let mut decoder = make_decoder();
    assert_eq!(decoder.feed(&[0xE9, 0x00, 0x40]), None);
}

#[test]
fn test_record_arm_button() {
    let mut decoder = make_decoder();
    let event = decoder.feed_at(&[0x90, 0x00, 0x7F], 1).unwrap();
    assert_eq!(
        event,
        McuEvent::Button { action: ButtonAction::Record, channel: 1, pressed: true }
    );
    assert!(decoder.store().track(1).unwrap().record_arm);

    // Note-off releases
    let event = decoder.feed_at(&[0x80, 0x00, 0x00], 2).unwrap();
    assert_eq!(
        event,
        McuEvent::Button { action: ButtonAction::Record, channel: 1, pressed: false }
    );
    assert!(!decoder.store().track(1).unwrap().record_arm);
}

#[test]
fn test_note_on_zero_velocity_is_release() {
    let mut decoder = make_decoder();
    decoder.feed_at(&[0x90, 0x10, 0x7F], 1).unwrap();
    assert!(decoder.store().track(1).unwrap().mute);
    decoder.feed_at(&[0x90, 0x10, 0x00], 2).unwrap();
    assert!(!decoder.store().track(1).unwrap().mute);
}

#[test]
fn test_select_press_release_cycle() {
    let mut decoder = make_decoder();

    // Press select on track 5 (note 0x18 + 4)
    let event = decoder.feed_at(&[0x90, 0x1C, 0x7F], 1).unwrap();
    assert_eq!(
        event,
        McuEvent::Button { action: ButtonAction::Select, channel: 5, pressed: true }
    );
    assert!(decoder.store().track(5).unwrap().select);
    assert_eq!(decoder.store().session().selected_track, 5);

    // Release
    decoder.feed_at(&[0x80, 0x1C, 0x00], 2).unwrap();
    assert!(!decoder.store().track(5).unwrap().select);
    assert_eq!(decoder.store().session().selected_track, 1);
}

#[test]
fn test_select_is_mutually_exclusive() {
    let mut decoder = make_decoder();
    for k in 0..8u8 {
        decoder.feed_at(&[0x90, 0x18 + k, 0x7F], u64::from(k) + 1).unwrap();
        let state = decoder.store().complete_state().state;
        let selected: Vec<u8> = state
            .tracks
            .iter()
            .filter(|t| t.select)
            .map(|t| t.number)
            .collect();
        assert_eq!(selected, vec![k + 1]);
    }
}

#[test]
fn test_duplicate_button_echo_suppressed() {
    let mut decoder = make_decoder();

    assert!(decoder.feed_at(&[0x90, 0x10, 0x7F], 42).is_some());
    // Identical (note, pressed) at the same instant: suppressed, no toggle
    assert_eq!(decoder.feed_at(&[0x90, 0x10, 0x7F], 42), None);
    assert!(decoder.store().track(1).unwrap().mute);

    // Same pair at a later instant is processed again
    assert!(decoder.feed_at(&[0x90, 0x10, 0x7F], 43).is_some());
}

#[test]
fn test_transport_buttons() {
    let mut decoder = make_decoder();

    let event = decoder.feed_at(&[0x90, 0x5E, 0x7F], 1).unwrap();
    assert_eq!(event, McuEvent::Transport { action: TransportAction::Play, pressed: true });
    let t = decoder.store().transport();
    assert!(t.playing && !t.stopped);

    decoder.feed_at(&[0x90, 0x5F, 0x7F], 2).unwrap();
    assert!(decoder.store().transport().recording);

    let event = decoder.feed_at(&[0x90, 0x5D, 0x7F], 3).unwrap();
    assert_eq!(event, McuEvent::Transport { action: TransportAction::Stop, pressed: true });
    let t = decoder.store().transport();
    assert!(!t.playing && !t.recording && t.stopped);
}

#[test]
fn test_note_outside_map_discarded() {
    let mut decoder = make_decoder();
    assert_eq!(decoder.feed_at(&[0x90, 0x30, 0x7F], 1), None);
    // No mutation happened
    let session = decoder.store().session();
    assert_eq!(session.connection_status, crate::state::ConnectionStatus::Disconnected);
}

#[test]
fn test_vpot_clockwise_and_counterclockwise() {
    let mut decoder = make_decoder();

    // CW, speed 3 on strip 1 (CC 0x10)
    let event = decoder.feed(&[0xB0, 0x10, 0x03]).unwrap();
    assert_eq!(event, McuEvent::Encoder { channel: 1, delta: 3, value: 67 });

    // CCW, speed 5
    let event = decoder.feed(&[0xB0, 0x10, 0x45]).unwrap();
    assert_eq!(event, McuEvent::Encoder { channel: 1, delta: -5, value: 62 });
}

#[test]
fn test_vpot_pan_clamps_under_repeated_deltas() {
    let mut decoder = make_decoder();
    for _ in 0..10 {
        decoder.feed(&[0xB0, 0x11, 0x3F]).unwrap(); // +63 each
    }
    assert_eq!(decoder.store().track(2).unwrap().pan, 127);

    for _ in 0..10 {
        decoder.feed(&[0xB0, 0x11, 0x7F]).unwrap(); // -63 each
    }
    assert_eq!(decoder.store().track(2).unwrap().pan, 0);
}

#[test]
fn test_vpot_coarse_profile_masks_speed() {
    let profile = DecodingProfile {
        fader_curve: FaderCurve::Centered,
        vpot_speed: VpotSpeedWidth::Four,
    };
    let mut decoder = make_decoder_with(profile, SysexConfig::default());

    // 0x3F & 0x0F = 15
    let event = decoder.feed(&[0xB0, 0x10, 0x3F]).unwrap();
    assert_eq!(event, McuEvent::Encoder { channel: 1, delta: 15, value: 79 });
}

#[test]
fn test_fader_touch() {
    let mut decoder = make_decoder();

    let event = decoder.feed(&[0xB0, 0x68, 0x7F]).unwrap();
    assert_eq!(event, McuEvent::Touch { channel: 1, touched: true });
    assert!(decoder.store().track(1).unwrap().touch);

    let event = decoder.feed(&[0xB0, 0x68, 0x00]).unwrap();
    assert_eq!(event, McuEvent::Touch { channel: 1, touched: false });
    assert!(!decoder.store().track(1).unwrap().touch);
}

#[test]
fn test_unhandled_status_reported_without_mutation() {
    let mut decoder = make_decoder();
    let event = decoder.feed(&[0xC0, 0x01]).unwrap();
    assert_eq!(event, McuEvent::Unhandled { status: 0xC0 });
    assert_eq!(
        decoder.store().session().connection_status,
        crate::state::ConnectionStatus::Disconnected
    );
}

#[test]
fn test_lcd_track_name_single_packet() {
    let mut decoder = make_decoder();
    // Offset 14 = row 0, col 14 -> strip 3
    let event = decoder.feed(&lcd_packet(14, "Drums  ")).unwrap();
    assert_eq!(
        event,
        McuEvent::Display { row: 0, channel: 3, text: "Drums".to_string(), offset: 14 }
    );
    assert_eq!(decoder.store().track(3).unwrap().name, "Drums");
    assert_eq!(decoder.store().display().track_names[2], "Drums");
}

#[test]
fn test_lcd_lower_line() {
    let mut decoder = make_decoder();
    // Offset 56 = row 1, col 0 -> strip 1
    let event = decoder.feed(&lcd_packet(56, "-12.0dB")).unwrap();
    assert_eq!(
        event,
        McuEvent::Display { row: 1, channel: 1, text: "-12.0dB".to_string(), offset: 56 }
    );
    assert_eq!(decoder.store().display().lower_lines[0], "-12.0dB");
    // Name untouched
    assert_eq!(decoder.store().track(1).unwrap().name, "Track 1");
}

#[test]
fn test_lcd_reassembly_matches_single_fragment() {
    let packet = lcd_packet(0, "Vocals ");

    let decode_name = |fragments: &[&[u8]]| {
        let mut decoder = make_decoder();
        let mut last = None;
        for (i, fragment) in fragments.iter().enumerate() {
            last = decoder.feed_at(fragment, i as u64);
        }
        assert!(last.is_some(), "final fragment must complete the packet");
        decoder.store().track(1).unwrap().name
    };

    let whole = decode_name(&[&packet]);
    assert_eq!(whole, "Vocals");

    // Split across 2, 3, and 5 fragments
    let two = decode_name(&[&packet[..4], &packet[4..]]);
    let three = decode_name(&[&packet[..3], &packet[3..9], &packet[9..]]);
    let five = decode_name(&[
        &packet[..2],
        &packet[2..5],
        &packet[5..8],
        &packet[8..11],
        &packet[11..],
    ]);

    assert_eq!(two, whole);
    assert_eq!(three, whole);
    assert_eq!(five, whole);
}

#[test]
fn test_sysex_wrong_prefix_rejected() {
    let mut decoder = make_decoder();
    // Valid framing but a different manufacturer
    let packet = vec![0xF0, 0x7E, 0x00, 0x09, 0x14, 0x12, 0x00, b'X', 0xF7];
    assert_eq!(decoder.feed(&packet), None);
    assert_eq!(decoder.store().track(1).unwrap().name, "Track 1");
}

#[test]
fn test_sysex_timeout_recovers() {
    let sysex = SysexConfig { timeout_ms: 100, max_packet_bytes: 1024 };
    let mut decoder = make_decoder_with(DecodingProfile::default(), sysex);

    // Start collecting, then nothing until well past the timeout
    assert_eq!(decoder.feed_at(&[0xF0, 0x00, 0x00, 0x66], 0), None);

    // A channel message arriving late flushes the stale buffer and is
    // decoded normally.
    let event = decoder.feed_at(&[0xE0, 0x00, 0x40], 500).unwrap();
    assert_eq!(event, McuEvent::Fader { channel: 1, value: 8192, percentage: 100 });

    // And a fresh SysEx still works afterwards
    let event = decoder.feed_at(&lcd_packet(0, "Keys   "), 600).unwrap();
    assert!(matches!(event, McuEvent::Display { .. }));
}

#[test]
fn test_meter_clip_latches_through_decoder() {
    let mut decoder = make_decoder();

    // Sub-id 0xD1 = meter, channel 2
    let event = decoder
        .feed(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0xD1, 125, 0xF7])
        .unwrap();
    assert_eq!(event, McuEvent::Meter { channel: 2, level: 125 });
    let meter = decoder.store().meters().tracks[1];
    assert!(meter.clip);
    assert_eq!(meter.peak, 125);

    // A quiet reading later leaves the latch alone
    decoder
        .feed(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0xD1, 10, 0xF7])
        .unwrap();
    let meter = decoder.store().meters().tracks[1];
    assert_eq!(meter.level, 10);
    assert!(meter.clip);
    assert_eq!(meter.peak, 125);
}

#[test]
fn test_meter_packet_without_level_byte_discarded() {
    let mut decoder = make_decoder();

    // Seven bytes: the end marker sits where the level byte should be
    assert_eq!(
        decoder.feed(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0xD1, 0xF7]),
        None
    );

    let meter = decoder.store().meters().tracks[1];
    assert_eq!(meter.level, 0);
    assert!(!meter.clip);
    assert_eq!(meter.peak, 0);
}

#[test]
fn test_meter_level_must_be_a_data_byte() {
    let mut decoder = make_decoder();

    assert_eq!(
        decoder.feed(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0xD1, 0x85, 0xF7]),
        None
    );

    let meter = decoder.store().meters().tracks[1];
    assert_eq!(meter.level, 0);
    assert!(!meter.clip);
}

#[test]
fn test_lcd_drops_non_ascii_bytes() {
    let mut decoder = make_decoder();

    let mut packet = vec![0xF0, 0x00, 0x00, 0x66, 0x14, 0x12, 0x00];
    packet.extend_from_slice(&[b'B', 0x80, b'a', 0xFE, b's', b's']);
    packet.push(0xF7);

    let event = decoder.feed(&packet).unwrap();
    assert_eq!(
        event,
        McuEvent::Display { row: 0, channel: 1, text: "Bass".to_string(), offset: 0 }
    );
    assert_eq!(decoder.store().track(1).unwrap().name, "Bass");
}

#[test]
fn test_time_display_updates_position() {
    let mut decoder = make_decoder();

    let mut packet = vec![0xF0, 0x00, 0x00, 0x66, 0x14, 0x10];
    packet.extend_from_slice(b"004\x0002\x00120"); // "004 02 120" with NUL blanks
    packet.push(0xF7);
    assert_eq!(packet.len(), 17);

    let event = decoder.feed(&packet).unwrap();
    assert_eq!(event, McuEvent::TimeDisplay { time: "004 02 120".to_string() });

    let transport = decoder.store().transport();
    assert_eq!(transport.position.smpte, "004 02 120");
    // Only three numeric fields: not a bars/beats/ticks display
    assert_eq!(transport.position.bars, 0);

    let display = decoder.store().display();
    assert_eq!(display.time_display, "004 02 120");
}

#[test]
fn test_time_display_bars_beats_ticks() {
    let mut decoder = make_decoder();

    let mut packet = vec![0xF0, 0x00, 0x00, 0x66, 0x14, 0x10];
    packet.extend_from_slice(b"12 3 45 06"); // four numeric fields
    packet.push(0xF7);

    decoder.feed(&packet).unwrap();
    let position = decoder.store().transport().position;
    assert_eq!((position.bars, position.beats, position.ticks), (12, 3, 45));
}

#[test]
fn test_empty_message_ignored() {
    let mut decoder = make_decoder();
    assert_eq!(decoder.feed(&[]), None);
}

proptest! {
    /// Legacy curve: encode/decode round-trips every percentage
    #[test]
    fn prop_legacy_volume_roundtrip(percent in 0u8..=100) {
        use crate::midi::convert;
        let value = convert::legacy_fader_value(percent);
        prop_assert_eq!(convert::legacy_percent(value), percent);
    }

    /// Centered curve: round-trips over its invertible range
    #[test]
    fn prop_centered_volume_roundtrip(percent in 50u8..=100) {
        use crate::midi::convert;
        let value = convert::centered_fader_value(percent);
        prop_assert_eq!(convert::centered_percent(value), percent);
    }

    /// Pan never leaves [0,127] and each move is bounded by |delta|
    #[test]
    fn prop_pan_stays_in_domain(values in proptest::collection::vec(0u8..=0x7F, 1..50)) {
        let mut decoder = make_decoder();
        let mut pan = 64i16;
        for value in values {
            let direction: i16 = if value & 0x40 != 0 { -1 } else { 1 };
            let speed = (value & 0x3F) as i16;
            let expected = (pan + direction * speed).clamp(0, 127);

            if let Some(McuEvent::Encoder { delta, value: new_pan, .. }) =
                decoder.feed(&[0xB0, 0x10, value])
            {
                prop_assert_eq!(delta, direction * speed);
                prop_assert_eq!(new_pan as i16, expected);
                prop_assert!((new_pan as i16 - pan).abs() <= delta.abs());
            } else {
                panic!("encoder message must decode");
            }
            pan = expected;
        }
    }
}
