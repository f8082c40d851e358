//! Line codec: frame buffer bytes to COG line payloads
//!
//! Each line payload is [`LINE_BUFFER_SIZE`] bytes in wire order:
//!
//! | Range     | Content                                             |
//! |-----------|-----------------------------------------------------|
//! | `0..33`   | odd pixels (bits 0,2,4,6), source bytes descending  |
//! | `33..77`  | scan select, one 2-bit code for the addressed line  |
//! | `77..110` | even pixels (bits 1,3,5,7), source bytes ascending  |
//!
//! Every pixel becomes a 2-bit drive code chosen by the [`Stage`]. With a
//! history image, pixels whose value did not change get the neutral code
//! `0b01` instead, which keeps unchanged areas from ghosting.
//!
//! Everything here is a pure function of its arguments.

use crate::config::{BYTES_PER_LINE, BYTES_PER_SCAN, LINE_BUFFER_SIZE, LINES};

/// Line address that selects no scan byte
pub const DUMMY_LINE: u16 = 0x7FFF;

/// One line payload
pub type LinePayload = [u8; LINE_BUFFER_SIZE];

const ODD: core::ops::Range<usize> = 0..BYTES_PER_LINE;
const SCAN: core::ops::Range<usize> = BYTES_PER_LINE..BYTES_PER_LINE + BYTES_PER_SCAN;
const EVEN: core::ops::Range<usize> = BYTES_PER_LINE + BYTES_PER_SCAN..LINE_BUFFER_SIZE;

/// Waveform stage
///
/// A transition from one image to another runs the four stages in order.
/// Full refresh uses [`Stage::Compensate`] without history as its first
/// stage and [`Stage::Normal`] without history as its last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Drive every pixel to the opposite of its value (undo the old image)
    Compensate,
    /// Black to neutral, white stays white
    White,
    /// Black to neutral, white to black
    Inverse,
    /// Drive every pixel to its value
    Normal,
}

impl Stage {
    /// All stages in transition order
    pub const SEQUENCE: [Stage; 4] = [
        Stage::Compensate,
        Stage::White,
        Stage::Inverse,
        Stage::Normal,
    ];
}

/// Pixel parity within a source byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    /// Bits 0, 2, 4, 6
    Odd,
    /// Bits 1, 3, 5, 7
    Even,
}

/// Neutral drive code in every pair
const NO_CHANGE: u8 = 0x55;

/// `old` is the byte previously shown at the same position, if known.
fn odd_byte(new: u8, old: Option<u8>, stage: Stage) -> u8 {
    let pixels = new & 0x55;
    let mask = old.map_or(0xFF, |old| {
        let m = (old ^ pixels) & 0x55;
        m | (m << 1)
    });
    let codes = match stage {
        Stage::Compensate => 0xAA | (pixels ^ 0x55),
        Stage::White => 0x55u8.wrapping_add(pixels ^ 0x55),
        Stage::Inverse => 0x55 | ((pixels ^ 0x55) << 1),
        Stage::Normal => 0xAA | pixels,
    };
    (codes & mask) | (!mask & NO_CHANGE)
}

/// The four drive codes go out in reverse order: the COG samples the
/// highest pixel first.
fn even_byte(new: u8, old: Option<u8>, stage: Stage) -> u8 {
    let pixels = new & 0xAA;
    let mask = old.map_or(0xFF, |old| {
        let m = (old ^ pixels) & 0xAA;
        m | (m >> 1)
    });
    let codes = match stage {
        Stage::Compensate => 0xAA | ((pixels ^ 0xAA) >> 1),
        Stage::White => 0x55u8.wrapping_add((pixels ^ 0xAA) >> 1),
        Stage::Inverse => 0x55 | (pixels ^ 0xAA),
        Stage::Normal => 0xAA | (pixels >> 1),
    };
    reverse_pairs((codes & mask) | (!mask & NO_CHANGE))
}

/// Encode one parity of a source byte
pub fn encode_byte(parity: Parity, new: u8, old: Option<u8>, stage: Stage) -> u8 {
    match parity {
        Parity::Odd => odd_byte(new, old, stage),
        Parity::Even => even_byte(new, old, stage),
    }
}

/// Reverse the order of the four 2-bit codes in a byte
pub const fn reverse_pairs(v: u8) -> u8 {
    ((v & 0xC0) >> 6) | ((v & 0x30) >> 2) | ((v & 0x0C) << 2) | ((v & 0x03) << 6)
}

/// Scan-select byte index and value for a line, `None` for lines off the panel
pub fn scan_position(line: u16) -> Option<(usize, u8)> {
    let line = usize::from(line);
    if line >= LINES {
        return None;
    }
    Some((BYTES_PER_SCAN - 1 - (line >> 2), 0x03 << ((line & 3) * 2)))
}

fn fill_scan(payload: &mut LinePayload, line: u16) {
    let scan = &mut payload[SCAN];
    scan.fill(0);
    if let Some((index, value)) = scan_position(line) {
        scan[index] = value;
    }
}

/// Build a line payload from image data
///
/// `new` and `old` are one line of [`BYTES_PER_LINE`] bytes each; `old` is
/// `None` when every pixel must be driven.
pub fn encode_line(
    payload: &mut LinePayload,
    line: u16,
    new: &[u8],
    old: Option<&[u8]>,
    stage: Stage,
) {
    let encode = |parity, b: usize| {
        let history = old.and_then(|old| old.get(b).copied());
        encode_byte(parity, new.get(b).copied().unwrap_or(0), history, stage)
    };

    for (slot, b) in payload[ODD].iter_mut().zip((0..BYTES_PER_LINE).rev()) {
        *slot = encode(Parity::Odd, b);
    }
    fill_scan(payload, line);
    for (slot, b) in payload[EVEN].iter_mut().zip(0..BYTES_PER_LINE) {
        *slot = encode(Parity::Even, b);
    }
}

/// Build a line payload with the same byte in every pixel position
pub fn encode_fixed(payload: &mut LinePayload, line: u16, value: u8) {
    payload[ODD].fill(value);
    fill_scan(payload, line);
    payload[EVEN].fill(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(line: u16, new: &[u8], old: Option<&[u8]>, stage: Stage) -> LinePayload {
        let mut payload = [0u8; LINE_BUFFER_SIZE];
        encode_line(&mut payload, line, new, old, stage);
        payload
    }

    #[test]
    fn test_normal_without_history() {
        // black pixels drive 0b11, white 0b10
        assert_eq!(odd_byte(0xFF, None, Stage::Normal), 0xFF);
        assert_eq!(odd_byte(0x00, None, Stage::Normal), 0xAA);
        assert_eq!(even_byte(0xFF, None, Stage::Normal), 0xFF);
        assert_eq!(even_byte(0x00, None, Stage::Normal), 0xAA);
    }

    #[test]
    fn test_compensate_inverts_normal() {
        assert_eq!(odd_byte(0xFF, None, Stage::Compensate), 0xAA);
        assert_eq!(odd_byte(0x00, None, Stage::Compensate), 0xFF);
        assert_eq!(even_byte(0x00, None, Stage::Compensate), 0xFF);
    }

    #[test]
    fn test_white_and_inverse_codes() {
        // white: black pixels go neutral (0b01), white pixels drive white (0b10)
        assert_eq!(odd_byte(0xFF, None, Stage::White), 0x55);
        assert_eq!(odd_byte(0x00, None, Stage::White), 0xAA);
        // inverse: black pixels neutral, white pixels drive black (0b11)
        assert_eq!(odd_byte(0xFF, None, Stage::Inverse), 0x55);
        assert_eq!(odd_byte(0x00, None, Stage::Inverse), 0xFF);
        assert_eq!(even_byte(0xFF, None, Stage::Inverse), 0x55);
        assert_eq!(even_byte(0x00, None, Stage::Inverse), 0xFF);
    }

    #[test]
    fn test_unchanged_pixels_get_neutral_code() {
        for stage in Stage::SEQUENCE {
            assert_eq!(odd_byte(0x5A, Some(0x5A), stage), 0x55);
            assert_eq!(even_byte(0x5A, Some(0x5A), stage), 0x55);
        }
    }

    #[test]
    fn test_history_mask_selects_changed_pixels() {
        // only pixel 0 changed (white to black)
        assert_eq!(odd_byte(0x01, Some(0x00), Stage::Normal), 0x57);
        // only pixel 1 changed; its code lands in the top pair after reversal
        assert_eq!(even_byte(0x02, Some(0x00), Stage::Normal), 0xD5);
    }

    #[test]
    fn test_encode_byte_by_parity() {
        // pixels 0 and 1 black: odd sees pixel 0, even sees pixel 1
        assert_eq!(encode_byte(Parity::Odd, 0x03, None, Stage::Normal), 0xAB);
        assert_eq!(encode_byte(Parity::Even, 0x03, None, Stage::Normal), 0xEA);
        assert_eq!(
            encode_byte(Parity::Odd, 0x03, Some(0x03), Stage::Inverse),
            0x55
        );
        assert_eq!(
            encode_byte(Parity::Even, 0x00, Some(0x02), Stage::White),
            0x95
        );
    }

    #[test]
    fn test_reverse_pairs() {
        assert_eq!(reverse_pairs(0b11_10_01_00), 0b00_01_10_11);
        assert_eq!(reverse_pairs(reverse_pairs(0x9C)), 0x9C);
    }

    #[test]
    fn test_scan_position() {
        assert_eq!(scan_position(0), Some((43, 0x03)));
        assert_eq!(scan_position(1), Some((43, 0x0C)));
        assert_eq!(scan_position(7), Some((42, 0xC0)));
        assert_eq!(scan_position(175), Some((0, 0xC0)));
        assert_eq!(scan_position(DUMMY_LINE), None);
    }

    #[test]
    fn test_payload_layout() {
        let mut new = [0u8; BYTES_PER_LINE];
        new[0] = 0x01;
        let payload = encoded(5, &new, None, Stage::Normal);
        // byte 0 is emitted last among the odd bytes
        assert_eq!(payload[32], 0xAB);
        assert_eq!(payload[0], 0xAA);
        assert_eq!(payload[33 + 42], 0x0C);
        assert_eq!(payload[33..77].iter().filter(|&&b| b != 0).count(), 1);
        // byte 0 is emitted first among the even bytes
        assert_eq!(payload[77], 0xAA);
    }

    #[test]
    fn test_encoding_is_pure() {
        let new = [0x3Cu8; BYTES_PER_LINE];
        let old = [0xC3u8; BYTES_PER_LINE];
        let first = encoded(100, &new, Some(&old), Stage::Normal);
        let second = encoded(100, &new, Some(&old), Stage::Normal);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_line() {
        let mut payload = [0u8; LINE_BUFFER_SIZE];
        encode_fixed(&mut payload, DUMMY_LINE, 0xAA);
        assert!(payload[..33].iter().all(|&b| b == 0xAA));
        assert!(payload[33..77].iter().all(|&b| b == 0));
        assert!(payload[77..].iter().all(|&b| b == 0xAA));
    }
}
