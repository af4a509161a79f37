//! Headphone command encoding
//! This module builds the byte sequences written to the headphones and the
//! trailing checksum the headphones validate them with.

use crate::core::bluetooth::constants::{INIT_BYTES, SET_COLOR_AFFIX, SET_COLOR_PREFIX};
use crate::core::bluetooth::types::Rgb;

/// Commands understood by the headphones
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadphoneCommand {
    /// Wake the command channel up (sent once per connection)
    Initialize,
    /// Set the colour of the ear lights
    SetColor(Rgb),
}

impl HeadphoneCommand {
    /// Convert the command to its byte representation, checksum included
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Initialize => INIT_BYTES.to_vec(),
            Self::SetColor(color) => encode_set_color(color.red, color.green, color.blue),
        }
    }
}

/// Checksum byte that brings the sum of `bytes` plus itself to `0xFF` mod 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    let total = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0xFF - total
}

/// Returns `bytes` with its checksum appended.
pub fn encode_with_checksum(bytes: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(bytes.len() + 1);
    framed.extend_from_slice(bytes);
    framed.push(checksum(bytes));
    framed
}

/// Builds the "set colour" command. Channels outside `[0.0, 1.0]` are clamped.
pub fn encode_set_color(red: f32, green: f32, blue: f32) -> Vec<u8> {
    let mut body = Vec::with_capacity(SET_COLOR_PREFIX.len() + 3 + SET_COLOR_AFFIX.len());
    body.extend_from_slice(&SET_COLOR_PREFIX);
    body.extend_from_slice(&Rgb::new(red, green, blue).to_bytes());
    body.extend_from_slice(&SET_COLOR_AFFIX);
    encode_with_checksum(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_sum(bytes: &[u8]) -> u32 {
        bytes.iter().map(|&b| u32::from(b)).sum()
    }

    #[test]
    fn test_checksum() {
        // fc+04+01+06+00+ff = 0x206 → 0xff - 0x06
        let cs = checksum(&[0xfc, 0x04, 0x01, 0x06, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(cs, 0xf9);
    }

    #[test]
    fn test_checksummed_sum_is_0xff() {
        let samples: [&[u8]; 5] = [
            &[0x00],
            &[0xff],
            &[0xfc, 0x04, 0x01, 0x06, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00],
            &[0x80, 0x80, 0x80],
            &[0xff; 300],
        ];
        for sample in samples {
            let framed = encode_with_checksum(sample);
            assert_eq!(framed.len(), sample.len() + 1);
            assert_eq!(&framed[..sample.len()], sample);
            assert_eq!(byte_sum(&framed) % 0x100, 0xff, "sample {:02x?}", sample);
        }
    }

    #[test]
    fn test_set_color_layout() {
        let cmd = encode_set_color(1.0, 0.0, 0.5);
        assert_eq!(cmd.len(), 11);
        assert_eq!(&cmd[..5], &SET_COLOR_PREFIX);
        assert_eq!(&cmd[5..8], &[255, 0, 127]);
        assert_eq!(&cmd[8..10], &SET_COLOR_AFFIX);
        assert_eq!(byte_sum(&cmd) % 0x100, 0xff);
    }

    #[test]
    fn test_set_color_clamps() {
        let cmd = encode_set_color(2.5, -1.0, 1.0);
        assert_eq!(&cmd[5..8], &[255, 0, 255]);
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(HeadphoneCommand::Initialize.to_bytes(), INIT_BYTES.to_vec());
        assert_eq!(
            HeadphoneCommand::SetColor(Rgb::new(0.0, 1.0, 0.0)).to_bytes(),
            encode_set_color(0.0, 1.0, 0.0)
        );
    }
}
