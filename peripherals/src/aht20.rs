//! AHT20 temperature/humidity sensor protocol constants and frame decoding.

pub const CMD_INITIALIZE: [u8; 3] = [0xbe, 0x08, 0x00];
pub const CMD_TRIGGER: [u8; 3] = [0xac, 0x33, 0x00];
pub const CMD_SOFT_RESET: u8 = 0xba;

const STATUS_BUSY: u8 = 0x80;
const STATUS_CALIBRATED: u8 = 0x08;

/// Status byte followed by 20 bits humidity and 20 bits temperature.
pub type Frame = [u8; 6];

pub fn is_busy(status: u8) -> bool {
    status & STATUS_BUSY != 0
}

pub fn is_calibrated(status: u8) -> bool {
    status & STATUS_CALIBRATED != 0
}

pub fn temperature_celsius(frame: &Frame) -> f32 {
    let raw = (u32::from(frame[3] & 0x0f) << 16) | (u32::from(frame[4]) << 8) | u32::from(frame[5]);
    (raw as f32) * 200.0 / 1_048_576.0 - 50.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_temperature_extremes() {
        assert_eq!(temperature_celsius(&[0x1c, 0, 0, 0x00, 0x00, 0x00]), -50.0);
        // Half scale is 50C.
        assert_eq!(temperature_celsius(&[0x1c, 0, 0, 0x08, 0x00, 0x00]), 50.0);
    }

    #[test]
    fn temperature_ignores_humidity_nibble() {
        let with_humidity = [0x1c, 0xff, 0xff, 0xf6, 0x66, 0x66];
        let without = [0x1c, 0x00, 0x00, 0x06, 0x66, 0x66];
        assert_eq!(temperature_celsius(&with_humidity), temperature_celsius(&without));
        assert!((temperature_celsius(&without) - 30.0).abs() < 0.01);
    }

    #[test]
    fn reads_status_bits() {
        assert!(is_busy(0x98));
        assert!(!is_busy(0x18));
        assert!(is_calibrated(0x18));
        assert!(!is_calibrated(0x10));
    }
}
