//! Response frame classification
//! Frames captured after a write are sorted into the few kinds the headphones
//! are known to send; everything else lands in the `unknown` bucket.

use serde::Serialize;

use crate::core::bluetooth::constants::{
    COLOR_REPORT_PREFIX, CONNECTED_MARKER, INIT_CONFIRMATION_PREFIX,
};
use crate::core::bluetooth::types::Rgb;

const INIT_CONFIRMATION_NOTE: &str = "Initialization confirmation; ready to receive commands.";

/// What a single frame turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    Connected,
    ColorReport(Rgb),
    InitConfirmation,
    Unknown,
}

/// A frame that did not map to a state change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownFrame {
    pub raw: Vec<u8>,
    pub speculation: Option<&'static str>,
}

/// Everything learned from one response batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedResponse {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_color: Option<Rgb>,
    pub unknown: Vec<UnknownFrame>,
}

/// Classifies one frame. The one-byte connected marker is checked before the prefixes.
pub fn classify(frame: &[u8]) -> ResponseKind {
    if frame == CONNECTED_MARKER {
        ResponseKind::Connected
    } else if frame.starts_with(&COLOR_REPORT_PREFIX) && frame.len() >= COLOR_REPORT_PREFIX.len() + 3 {
        let at = COLOR_REPORT_PREFIX.len();
        ResponseKind::ColorReport(Rgb::from_bytes(frame[at], frame[at + 1], frame[at + 2]))
    } else if frame.starts_with(&INIT_CONFIRMATION_PREFIX) {
        ResponseKind::InitConfirmation
    } else {
        ResponseKind::Unknown
    }
}

/// Folds a batch of frames, in order, into a [`ParsedResponse`].
pub fn parse_responses<F: AsRef<[u8]>>(frames: &[F]) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();
    for frame in frames {
        let frame = frame.as_ref();
        match classify(frame) {
            ResponseKind::Connected => parsed.connected = true,
            ResponseKind::ColorReport(color) => parsed.last_color = Some(color),
            ResponseKind::InitConfirmation => parsed.unknown.push(UnknownFrame {
                raw: frame.to_vec(),
                speculation: Some(INIT_CONFIRMATION_NOTE),
            }),
            ResponseKind::Unknown => parsed.unknown.push(UnknownFrame {
                raw: frame.to_vec(),
                speculation: None,
            }),
        }
    }
    parsed
}
