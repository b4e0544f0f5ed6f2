//! Command encoding for HD44780-compatible character displays wired in 4-bit
//! mode. The driver turns each message into nibble writes on the data pins.

use std::time::Duration;

use thermostat_common::DisplayFrame;

const CLEAR_DISPLAY: u8 = 0x01;
const RETURN_HOME: u8 = 0x02;
const ENTRY_MODE_LEFT: u8 = 0x06;
const DISPLAY_ON_CURSOR_OFF: u8 = 0x0c;
const FUNCTION_4BIT_2LINE: u8 = 0x28;
const SET_DDRAM_ADDR: u8 = 0x80;

const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdMessage {
    /// A full byte with RS low.
    Cmd(u8),
    /// A full byte with RS high.
    Char(u8),
    /// Only the high nibble, used while the controller is still in 8-bit mode.
    Nibble(u8),
    Wait(Duration),
}

/// Power-on sequence that forces the controller into 4-bit, two-line mode.
pub fn init_sequence() -> Vec<LcdMessage> {
    vec![
        LcdMessage::Wait(Duration::from_millis(50)),
        LcdMessage::Nibble(0x03),
        LcdMessage::Wait(Duration::from_micros(4_500)),
        LcdMessage::Nibble(0x03),
        LcdMessage::Wait(Duration::from_micros(4_500)),
        LcdMessage::Nibble(0x03),
        LcdMessage::Wait(Duration::from_micros(150)),
        LcdMessage::Nibble(0x02),
        LcdMessage::Cmd(FUNCTION_4BIT_2LINE),
        LcdMessage::Cmd(DISPLAY_ON_CURSOR_OFF),
        LcdMessage::Cmd(ENTRY_MODE_LEFT),
    ]
    .into_iter()
    .chain(clear_sequence())
    .collect()
}

pub fn clear_sequence() -> Vec<LcdMessage> {
    vec![
        LcdMessage::Cmd(CLEAR_DISPLAY),
        LcdMessage::Wait(Duration::from_millis(2)),
        LcdMessage::Cmd(RETURN_HOME),
        LcdMessage::Wait(Duration::from_millis(2)),
    ]
}

pub fn set_cursor(row: usize) -> LcdMessage {
    LcdMessage::Cmd(SET_DDRAM_ADDR | ROW_OFFSETS[row.min(ROW_OFFSETS.len() - 1)])
}

/// Clear followed by both lines, clipped to the display geometry. Characters
/// outside printable ASCII are shown as `?`.
pub fn frame_sequence(frame: &DisplayFrame, columns: usize, rows: usize) -> Vec<LcdMessage> {
    let mut messages = clear_sequence();
    for (row, line) in frame.fitted(columns).iter().enumerate().take(rows) {
        messages.push(set_cursor(row));
        messages.extend(line.chars().map(|c| {
            LcdMessage::Char(if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            })
        }));
    }
    messages
}

/// High nibble first, each in the low four bits.
pub fn nibbles(byte: u8) -> [u8; 2] {
    [byte >> 4, byte & 0x0f]
}
