//! MCU address map
//!
//! Fixed note/CC/SysEx addresses for the 8-strip + master surface window.
//! Button ranges are base + channel offset 0-7.

/// SysEx manufacturer prefix following the start marker (Mackie)
pub const MCU_MANUFACTURER: [u8; 3] = [0x00, 0x00, 0x66];

/// Record-arm buttons
pub const REC_ARM_BASE: u8 = 0x00;
pub const REC_ARM_END: u8 = 0x07;

/// Solo buttons
pub const SOLO_BASE: u8 = 0x08;
pub const SOLO_END: u8 = 0x0F;

/// Mute buttons
pub const MUTE_BASE: u8 = 0x10;
pub const MUTE_END: u8 = 0x17;

/// Select buttons
pub const SELECT_BASE: u8 = 0x18;
pub const SELECT_END: u8 = 0x1F;

/// Transport buttons (fixed codes)
pub const TRANSPORT_STOP: u8 = 0x5D;
pub const TRANSPORT_PLAY: u8 = 0x5E;
pub const TRANSPORT_RECORD: u8 = 0x5F;

/// V-Pot rotation CCs
pub const VPOT_BASE: u8 = 0x10;
pub const VPOT_END: u8 = 0x17;

/// V-Pot direction bit in the CC data byte (set = counter-clockwise)
pub const VPOT_DIRECTION_BIT: u8 = 0x40;

/// Fader touch CCs
pub const TOUCH_BASE: u8 = 0x68;
pub const TOUCH_END: u8 = 0x6F;

/// Pitch-bend channel nibble carrying the master fader
pub const MASTER_FADER_INDEX: u8 = 8;

/// SysEx sub-identifiers
pub const SUB_ID_TIME: u8 = 0x10;
pub const SUB_ID_LCD: u8 = 0x12;
/// Meter sub-ids encode the channel in the low nibble of this bank
pub const SUB_ID_METER_BANK: u8 = 0xD0;

/// LCD geometry: two 56-character rows, 7 characters per strip
pub const LCD_ROW_WIDTH: u8 = 56;
pub const LCD_CELL_WIDTH: u8 = 7;

/// Fixed length of the time-display payload (offset 6..16 in the packet)
pub const TIME_DISPLAY_BYTES: usize = 10;
